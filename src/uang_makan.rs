// src/uang_makan.rs
//
// Meal allowance ("Uang Makan") calculator. Pure function of the attendance
// sheet plus the grade reference list; recomputed on every invocation, never
// cached, so reruns on identical input are bit-identical.

use crate::employee::clean_nip;
use crate::rates::RateSchedule;
use crate::reference_data::{find_grade_by_nama, EmployeeGrade};
use crate::sheet::Sheet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub nama: String,
    pub nip: String,
    pub golongan: String,
    pub wfo_days: u32,
    pub base_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_uang_makan: Decimal,
}

/// Counts WFO days per employee and applies the rate schedule.
///
/// Policy: an absent sheet or an empty grade list yields an empty result set,
/// not an error. Rows whose name has no grade match are skipped and logged.
pub fn calculate_uang_makan(
    sheet: Option<&Sheet>,
    grades: &[EmployeeGrade],
    schedule: RateSchedule,
) -> Vec<CalculationResult> {
    let Some(sheet) = sheet else {
        debug!("No attendance sheet loaded, nothing to calculate");
        return Vec::new();
    };
    if grades.is_empty() {
        debug!("Grade reference list is empty, nothing to calculate");
        return Vec::new();
    }

    let Some(nama_col) = sheet.column("NAMA") else {
        warn!("Attendance sheet has no NAMA column");
        return Vec::new();
    };
    let Some(nip_col) = sheet.column("NIP") else {
        warn!("Attendance sheet has no NIP column");
        return Vec::new();
    };
    let date_cols = sheet.date_columns();

    let mut results = Vec::new();
    for (row_index, row) in sheet.rows().iter().enumerate() {
        let nama = sheet.cell(row, nama_col).to_string();
        let nip = clean_nip(sheet.cell(row, nip_col));

        let Some(grade) = find_grade_by_nama(grades, &nama) else {
            warn!(
                "Skipping row {}: name '{}' (NIP '{}') not found in grade data",
                row_index + 1,
                nama,
                nip
            );
            continue;
        };

        let wfo_days = date_cols
            .iter()
            .filter(|(col, _)| sheet.cell(row, *col).to_uppercase() == "WFO")
            .count() as u32;

        let meal_rate = schedule.rate_for(&grade.golongan);
        let base_amount = meal_rate.rate * Decimal::from(wfo_days);
        let tax_amount = base_amount * meal_rate.tax_rate;
        let total_uang_makan = base_amount - tax_amount;

        debug!(
            "Calculated for '{}': golongan={}, wfo={}, base={}, tax={}, total={}",
            nama, grade.golongan, wfo_days, base_amount, tax_amount, total_uang_makan
        );

        results.push(CalculationResult {
            nama: grade.nama.clone(),
            nip,
            golongan: grade.golongan.clone(),
            wfo_days,
            base_amount,
            tax_amount,
            total_uang_makan,
        });
    }

    results.sort_by(|a, b| a.nama.cmp(&b.nama));
    results
}

fn money(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Renders the calculation results as a downloadable sheet: one row per
/// employee, then a blank spacer row and the labeled totals block, each total
/// sitting in its source column.
pub fn result_sheet(results: &[CalculationResult]) -> Sheet {
    let headers = [
        "NAMA",
        "NIP",
        "GOLONGAN",
        "HARI WFO",
        "TARIF PER HARI",
        "JUMLAH KOTOR",
        "PAJAK",
        "TOTAL UANG MAKAN",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let mut rows: Vec<Vec<String>> = results
        .iter()
        .map(|calc| {
            let per_day = if calc.wfo_days > 0 {
                calc.base_amount / Decimal::from(calc.wfo_days)
            } else {
                Decimal::ZERO
            };
            vec![
                calc.nama.clone(),
                calc.nip.clone(),
                calc.golongan.clone(),
                calc.wfo_days.to_string(),
                money(per_day),
                money(calc.base_amount),
                money(calc.tax_amount),
                money(calc.total_uang_makan),
            ]
        })
        .collect();

    let gross: Decimal = results.iter().map(|c| c.base_amount).sum();
    let tax: Decimal = results.iter().map(|c| c.tax_amount).sum();
    let net: Decimal = results.iter().map(|c| c.total_uang_makan).sum();

    let blank = || "".to_string();
    rows.push(vec![blank(); 8]);
    rows.push(vec![
        "TOTAL PEGAWAI".to_string(),
        results.len().to_string(),
        blank(),
        blank(),
        blank(),
        blank(),
        blank(),
        blank(),
    ]);
    rows.push(vec![
        "TOTAL KOTOR".to_string(),
        blank(),
        blank(),
        blank(),
        blank(),
        money(gross),
        blank(),
        blank(),
    ]);
    rows.push(vec![
        "TOTAL PAJAK".to_string(),
        blank(),
        blank(),
        blank(),
        blank(),
        blank(),
        money(tax),
        blank(),
    ]);
    rows.push(vec![
        "TOTAL BERSIH".to_string(),
        blank(),
        blank(),
        blank(),
        blank(),
        blank(),
        blank(),
        money(net),
    ]);

    Sheet::new(headers, rows)
}
