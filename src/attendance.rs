// src/attendance.rs
//
// Attendance aggregator: reduces raw per-check-in rows into one record per
// employee with category counts for the period. Grouping is two-level —
// employee first, then date — because one day can carry several check-in
// events that classify independently.

use crate::employee::clean_nip;
use crate::sheet::Sheet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One raw check-in event, read from the attendance export by header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyCheckinRow {
    pub nama: String,
    pub nip: String,
    pub tanggal: String,
    pub jenis_checkin: String,
    pub kategori_terlambat: String,
    pub kategori_pulang_cepat: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    #[serde(rename = "A")]
    pub a: u32,
    #[serde(rename = "T1")]
    pub t1: u32,
    #[serde(rename = "T2")]
    pub t2: u32,
    #[serde(rename = "T3")]
    pub t3: u32,
    #[serde(rename = "T4")]
    pub t4: u32,
    #[serde(rename = "P1")]
    pub p1: u32,
    #[serde(rename = "P2")]
    pub p2: u32,
    #[serde(rename = "P3")]
    pub p3: u32,
    #[serde(rename = "P4")]
    pub p4: u32,
    #[serde(rename = "CUTI")]
    pub cuti: u32,
    #[serde(rename = "TL")]
    pub tl: u32,
    #[serde(rename = "HADIR")]
    pub hadir: u32,
}

impl AttendanceCounts {
    /// Fixed-order human-readable summary of the counts.
    pub fn keterangan(&self) -> String {
        format!(
            "A:{}, T1:{}, T2:{}, T3:{}, T4:{}, P1:{}, P2:{}, P3:{}, P4:{}, CUTI:{}, TL:{}, HADIR:{}",
            self.a,
            self.t1,
            self.t2,
            self.t3,
            self.t4,
            self.p1,
            self.p2,
            self.p3,
            self.p4,
            self.cuti,
            self.tl,
            self.hadir
        )
    }
}

/// Aggregated attendance for one employee over the processing run. The
/// monetary fields are zero until the deduction calculator fills them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub nama: String,
    pub nip: String,
    pub keterangan: String,
    pub total_days: u32,
    pub attendance_counts: AttendanceCounts,
    pub cut_percentage: Decimal,
    pub tunjangan_before: Decimal,
    pub tunjangan_after: Decimal,
    pub nominal_cut: Decimal,
}

impl AttendanceRecord {
    fn new(nip: String, nama: String) -> Self {
        Self {
            nama,
            nip,
            keterangan: String::new(),
            total_days: 0,
            attendance_counts: AttendanceCounts::default(),
            cut_percentage: Decimal::ZERO,
            tunjangan_before: Decimal::ZERO,
            tunjangan_after: Decimal::ZERO,
            nominal_cut: Decimal::ZERO,
        }
    }
}

/// Reads check-in rows from the attendance export sheet. Rows missing any of
/// name, NIP, or date cannot be bucketed and are dropped.
pub fn checkin_rows_from_sheet(sheet: &Sheet) -> Vec<DailyCheckinRow> {
    let Some(nama_col) = sheet.column("NAMA") else {
        return Vec::new();
    };
    let Some(nip_col) = sheet.column("NIP_BARU") else {
        return Vec::new();
    };
    let Some(tanggal_col) = sheet.column("TANGGAL_WITA") else {
        return Vec::new();
    };
    let jenis_col = sheet.column("JENIS_CHECKIN");
    let terlambat_col = sheet.column("KATEGORI_TERLAMBAT");
    let pulang_col = sheet.column("KATEGORI_PULANG_CEPAT");

    let pick = |row: &[String], col: Option<usize>| {
        col.map(|c| sheet.cell(row, c).to_string()).unwrap_or_default()
    };

    sheet
        .rows()
        .iter()
        .filter_map(|row| {
            let nama = sheet.cell(row, nama_col).to_string();
            let nip = clean_nip(sheet.cell(row, nip_col));
            let tanggal = sheet.cell(row, tanggal_col).to_string();
            if nama.is_empty() || nip.is_empty() || tanggal.is_empty() {
                debug!("Dropping check-in row without nama/nip/tanggal");
                return None;
            }
            Some(DailyCheckinRow {
                nama,
                nip,
                tanggal,
                jenis_checkin: pick(row, jenis_col),
                kategori_terlambat: pick(row, terlambat_col),
                kategori_pulang_cepat: pick(row, pulang_col),
            })
        })
        .collect()
}

/// Reduces check-in rows into per-employee records.
///
/// Day-bucket rule: a `TL` check-in anywhere in the bucket exempts the whole
/// day — it counts as exactly one TL increment and every other row in the
/// bucket is ignored. Otherwise each row classifies independently and
/// increments are additive; one day can feed several categories when its rows
/// disagree. `total_days` advances once per bucket either way.
pub fn aggregate_attendance(rows: &[DailyCheckinRow]) -> Vec<AttendanceRecord> {
    // (nip, nama) -> tanggal -> rows; BTreeMaps keep the walk deterministic.
    let mut grouped: BTreeMap<(String, String), BTreeMap<String, Vec<&DailyCheckinRow>>> =
        BTreeMap::new();
    for row in rows {
        grouped
            .entry((row.nip.clone(), row.nama.clone()))
            .or_default()
            .entry(row.tanggal.clone())
            .or_default()
            .push(row);
    }

    let mut records = Vec::with_capacity(grouped.len());
    for ((nip, nama), date_map) in grouped {
        let mut record = AttendanceRecord::new(nip, nama);
        let counts = &mut record.attendance_counts;

        for (_, day_rows) in date_map {
            record.total_days += 1;

            if day_rows.iter().any(|r| r.jenis_checkin == "TL") {
                counts.tl += 1;
                continue;
            }

            for row in day_rows {
                match row.jenis_checkin.as_str() {
                    "" | "A" => counts.a += 1,
                    "HADIR" => counts.hadir += 1,
                    "CUTI" => counts.cuti += 1,
                    _ => {}
                }
                match row.kategori_terlambat.as_str() {
                    "T1" => counts.t1 += 1,
                    "T2" => counts.t2 += 1,
                    "T3" => counts.t3 += 1,
                    "T4" => counts.t4 += 1,
                    _ => {}
                }
                match row.kategori_pulang_cepat.as_str() {
                    "P1" => counts.p1 += 1,
                    "P2" => counts.p2 += 1,
                    "P3" => counts.p3 += 1,
                    "P4" => counts.p4 += 1,
                    _ => {}
                }
            }
        }

        record.keterangan = record.attendance_counts.keterangan();
        records.push(record);
    }

    records.sort_by(|a, b| a.nama.cmp(&b.nama).then_with(|| a.nip.cmp(&b.nip)));
    debug!("Aggregated attendance for {} employees", records.len());
    records
}

/// Drill-down search over the raw check-in sheet: header row plus every row
/// whose name or NIP contains the term, case-insensitively. `None` when
/// nothing matches or the term is empty.
pub fn search_rows(sheet: &Sheet, term: &str) -> Option<Sheet> {
    if term.is_empty() {
        return None;
    }
    let nama_col = sheet.column_ci("NAMA")?;
    let nip_col = sheet.column_ci("NIP").or_else(|| sheet.column_ci("NIP_BARU"))?;
    let needle = term.to_lowercase();

    let matched: Vec<Vec<String>> = sheet
        .rows()
        .iter()
        .filter(|row| {
            let row = row.as_slice();
            sheet.cell(row, nama_col).to_lowercase().contains(&needle)
                || sheet.cell(row, nip_col).to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        None
    } else {
        Some(Sheet::new(sheet.headers().to_vec(), matched))
    }
}
