// src/tunjangan.rs
//
// Deduction calculator for the performance allowance ("Tunjangan Kinerja").
// Converts category counts into a cumulative percentage cut and applies it
// to the employee's monthly baseline.

use crate::attendance::AttendanceRecord;
use crate::employee::ExclusionList;
use crate::reference_data::{find_baseline, TunjanganKinerja};
use crate::sheet::Sheet;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Percentage points per occurrence. Absence weighs a full 5; late arrival
// and early leave tiers mirror each other.
const CUT_A: Decimal = dec!(5);
const CUT_T1: Decimal = dec!(0.5);
const CUT_T2: Decimal = dec!(1);
const CUT_T3: Decimal = dec!(1.5);
const CUT_T4: Decimal = dec!(2.5);
const CUT_P1: Decimal = dec!(0.5);
const CUT_P2: Decimal = dec!(1);
const CUT_P3: Decimal = dec!(1.5);
const CUT_P4: Decimal = dec!(2.5);

/// Additive and uncapped: totals past 100% stand as-is, which drives
/// `tunjangan_after` negative for a positive baseline.
pub fn cut_percentage(record: &AttendanceRecord) -> Decimal {
    let c = &record.attendance_counts;
    Decimal::from(c.a) * CUT_A
        + Decimal::from(c.t1) * CUT_T1
        + Decimal::from(c.t2) * CUT_T2
        + Decimal::from(c.t3) * CUT_T3
        + Decimal::from(c.t4) * CUT_T4
        + Decimal::from(c.p1) * CUT_P1
        + Decimal::from(c.p2) * CUT_P2
        + Decimal::from(c.p3) * CUT_P3
        + Decimal::from(c.p4) * CUT_P4
}

/// Fills the monetary fields of aggregated records from the baseline list.
/// Employees without a baseline (by NIP, then by name) get 0.
pub fn apply_deductions(
    mut records: Vec<AttendanceRecord>,
    baselines: &[TunjanganKinerja],
) -> Vec<AttendanceRecord> {
    for record in &mut records {
        let cut = cut_percentage(record);
        let before = find_baseline(baselines, &record.nip, &record.nama)
            .map(|tk| tk.tunjangan_kinerja)
            .unwrap_or(Decimal::ZERO);
        let after = before * (Decimal::ONE - cut / dec!(100));

        record.cut_percentage = cut;
        record.tunjangan_before = before;
        record.tunjangan_after = after;
        record.nominal_cut = before - after;
    }
    records
}

fn money(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Attendance result sheet for download/archive, filtered through the
/// reporting exclusion set.
pub fn result_sheet(records: &[AttendanceRecord], exclusions: &ExclusionList) -> Sheet {
    let headers = [
        "NAMA",
        "NIP",
        "KETERANGAN",
        "TOTAL DAYS",
        "A",
        "T1",
        "T2",
        "T3",
        "T4",
        "P1",
        "P2",
        "P3",
        "P4",
        "CUTI",
        "TL",
        "HADIR",
        "TUNJANGAN BEFORE",
        "CUT %",
        "NOMINAL CUT",
        "TUNJANGAN AFTER",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let filtered: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| !exclusions.is_excluded(&r.nip))
        .collect();

    let mut rows: Vec<Vec<String>> = filtered
        .iter()
        .map(|r| {
            let c = &r.attendance_counts;
            vec![
                r.nama.clone(),
                r.nip.clone(),
                r.keterangan.clone(),
                r.total_days.to_string(),
                c.a.to_string(),
                c.t1.to_string(),
                c.t2.to_string(),
                c.t3.to_string(),
                c.t4.to_string(),
                c.p1.to_string(),
                c.p2.to_string(),
                c.p3.to_string(),
                c.p4.to_string(),
                c.cuti.to_string(),
                c.tl.to_string(),
                c.hadir.to_string(),
                money(r.tunjangan_before),
                money(r.cut_percentage),
                money(r.nominal_cut),
                money(r.tunjangan_after),
            ]
        })
        .collect();

    let before: Decimal = filtered.iter().map(|r| r.tunjangan_before).sum();
    let cut: Decimal = filtered.iter().map(|r| r.nominal_cut).sum();
    let after: Decimal = filtered.iter().map(|r| r.tunjangan_after).sum();

    // Trailing totals block, same shape as the meal-allowance download.
    let blank = || "".to_string();
    let labeled = |label: &str, col: usize, value: String| {
        let mut row = vec![blank(); 20];
        row[0] = label.to_string();
        row[col] = value;
        row
    };
    rows.push(vec![blank(); 20]);
    rows.push(labeled("TOTAL PEGAWAI", 1, filtered.len().to_string()));
    rows.push(labeled("TOTAL TUNJANGAN", 16, money(before)));
    rows.push(labeled("TOTAL POTONGAN", 18, money(cut)));
    rows.push(labeled("TOTAL DITERIMA", 19, money(after)));

    Sheet::new(headers, rows)
}
