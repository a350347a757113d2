// src/adk_tukin.rs
//
// ADK Tukin template reconciler. The template is an externally fixed file
// layout addressed by column position, not header name: NIP sits at index 3
// and the monetary/month fields land at fixed indices. The layout is treated
// as a versioned external format — rows too narrow to hold the writes are a
// format error, not a best-effort write.

use crate::period::Period;
use crate::sheet::{Sheet, SheetError};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

// Fixed column contract of the ADK Tukin layout.
const COL_MONTH: usize = 1;
const COL_NIP: usize = 3;
const COL_TUNKIN: usize = 7;
const COL_TOTAL_POTONGAN: usize = 8;
const COL_TUNKIN_DITERIMA: usize = 9;
const COL_BULAN_BAYAR: usize = 14;
const COL_BULAN_GAJI: usize = 16;
const TEMPLATE_WIDTH: usize = COL_BULAN_GAJI + 1;

/// One row of the post-confirmation sheet. Monetary columns stay raw — they
/// arrive either as plain numbers or as formatted currency strings and are
/// parsed at reconcile time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostConfirmationRow {
    pub no: String,
    pub nama: String,
    pub nip: String,
    pub jabatan: String,
    pub unit_kerja: String,
    pub keterangan: String,
    pub potongan_kehadiran: String,
    pub kelas_jabatan: String,
    pub tunkin: String,
    pub pot_bpk: String,
    pub potongan: String,
    pub potongan_lain: String,
    pub potongan_absen: String,
    pub total_potongan: String,
    pub tunkin_diterima: String,
}

/// Header matching is tolerant of casing, underscores, dots, and spacing
/// ("Unit kerja" / "unit_kerja" / "UNIT KERJA" all resolve the same).
fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .replace('.', "")
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_map(sheet: &Sheet) -> HashMap<String, usize> {
    sheet
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, h)| (normalize_header(h), idx))
        .collect()
}

pub fn post_confirmation_from_sheet(sheet: &Sheet) -> Vec<PostConfirmationRow> {
    let columns = header_map(sheet);
    let get = |row: &[String], name: &str| -> String {
        columns
            .get(name)
            .map(|&idx| sheet.cell(row, idx).to_string())
            .unwrap_or_default()
    };

    sheet
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let no = {
                let raw = get(row, "no");
                if raw.is_empty() {
                    (index + 1).to_string()
                } else {
                    raw
                }
            };
            PostConfirmationRow {
                no,
                nama: get(row, "nama"),
                nip: get(row, "nip"),
                jabatan: get(row, "jabatan"),
                unit_kerja: get(row, "unit kerja"),
                keterangan: get(row, "keterangan"),
                potongan_kehadiran: get(row, "potongan kehadiran"),
                kelas_jabatan: get(row, "kelas jabatan"),
                tunkin: get(row, "tunkin"),
                pot_bpk: get(row, "pot bpk"),
                potongan: get(row, "potongan"),
                potongan_lain: get(row, "potongan lain"),
                potongan_absen: get(row, "potongan absen"),
                total_potongan: get(row, "total potongan"),
                tunkin_diterima: get(row, "tunkin diterima"),
            }
        })
        .collect()
}

/// Parses a monetary cell. Plain numbers pass straight through; currency
/// strings ("Rp3.500.000,75") lose the Rp marker, grouping dots and
/// whitespace, and trade the decimal comma for a dot. Malformed input parses
/// to zero rather than failing the run.
pub fn parse_currency(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if let Ok(value) = Decimal::from_str(trimmed) {
        return value;
    }
    let cleaned: String = trimmed
        .replace("Rp", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

fn round_whole(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Merges post-confirmation amounts into the template by NIP.
///
/// Matched rows get the target month in columns 1, 14, and 16, the rounded
/// tunkin and total deduction as text in columns 7 and 8, and their
/// difference in column 9. Unmatched rows pass through untouched. A matched
/// row narrower than the fixed layout aborts the merge with a format error
/// before anything is written.
pub fn reconcile_template(
    template: &Sheet,
    rows: &[PostConfirmationRow],
    period: Period,
) -> Result<Sheet, SheetError> {
    let by_nip: HashMap<&str, &PostConfirmationRow> = rows
        .iter()
        .map(|row| (row.nip.trim(), row))
        .collect();

    let month = period.month_padded();
    let mut updated_rows = Vec::with_capacity(template.rows().len());

    for (index, row) in template.rows().iter().enumerate() {
        let nip = template.cell(row, COL_NIP);
        let Some(matching) = by_nip.get(nip) else {
            updated_rows.push(row.clone());
            continue;
        };

        if row.len() < TEMPLATE_WIDTH {
            return Err(SheetError::RowTooShort {
                row: index + 1,
                width: row.len(),
                required: TEMPLATE_WIDTH,
            });
        }

        let tunkin = round_whole(parse_currency(&matching.tunkin));
        let total_potongan = round_whole(parse_currency(&matching.total_potongan));

        let mut updated = row.clone();
        updated[COL_MONTH] = month.clone();
        updated[COL_TUNKIN] = tunkin.to_string();
        updated[COL_TOTAL_POTONGAN] = total_potongan.to_string();
        updated[COL_TUNKIN_DITERIMA] = (tunkin - total_potongan).normalize().to_string();
        updated[COL_BULAN_BAYAR] = month.clone();
        updated[COL_BULAN_GAJI] = month.clone();
        updated_rows.push(updated);
    }

    debug!(
        "Reconciled {} template rows against {} post-confirmation records",
        updated_rows.len(),
        rows.len()
    );
    Ok(Sheet::new(template.headers().to_vec(), updated_rows))
}

/// `ADK-TUKIN-<LABEL>-<YYYYMM>` with whitespace in the label dashed out.
pub fn tukin_file_name(label: &str, period: Period) -> String {
    let label = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase();
    format!("ADK-TUKIN-{}-{}", label, period.ym_compact())
}
