// src/adk.rs
//
// ADK Uang Makan disbursement extract: one tab-delimited line per qualifying
// WFO day, partitioned by employment category, scoped to one period. The
// extract text goes to the payroll system downstream; a per-category
// calculation snapshot travels with it into the archive.

use crate::employee::{clean_nip, EmployeeType, ExclusionList};
use crate::period::Period;
use crate::sheet::Sheet;
use crate::uang_makan::CalculationResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Generates the extract for one employment category.
///
/// Lines are joined with `\n` and carry no trailing newline. Rows with an
/// empty NIP cannot be attributed and are skipped, as are rows on the
/// extract exclusion list or outside the requested category.
pub fn generate_extract(
    sheet: &Sheet,
    employee_type: EmployeeType,
    period: Period,
    exclusions: &ExclusionList,
) -> String {
    let Some(nip_col) = sheet.column("NIP") else {
        return String::new();
    };
    let date_cols = sheet.date_columns();

    let mut entries: Vec<String> = Vec::new();
    for row in sheet.rows() {
        let nip = clean_nip(sheet.cell(row, nip_col));
        if nip.is_empty() {
            continue;
        }
        if exclusions.is_excluded(&nip) {
            debug!("Skipping employee with NIP {} (excluded prefix)", nip);
            continue;
        }
        if EmployeeType::classify(&nip) != employee_type {
            continue;
        }

        for (col, day) in &date_cols {
            if sheet.cell(row, *col).to_uppercase() == "WFO" {
                entries.push(format!("{}\t{}", nip, period.day_iso(*day)));
            }
        }
    }

    entries.join("\n")
}

/// `WFO_<TYPE>_<YYYYMM>_<source-stem>.txt`
pub fn extract_file_name(employee_type: EmployeeType, period: Period, source_stem: &str) -> String {
    format!(
        "WFO_{}_{}_{}.txt",
        employee_type.as_str(),
        period.ym_compact(),
        source_stem
    )
}

/// Per-employee slice of a meal calculation, archived next to the extract it
/// was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSnapshot {
    pub nama: String,
    pub golongan: String,
    pub wfo_days: u32,
    pub base_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_uang_makan: Decimal,
}

/// Narrows calculation results to the employees of one category, keyed by
/// NIP for archive lookup.
pub fn scoped_results(
    results: &[CalculationResult],
    employee_type: EmployeeType,
) -> HashMap<String, CalculationSnapshot> {
    results
        .iter()
        .filter(|calc| EmployeeType::classify(&calc.nip) == employee_type)
        .map(|calc| {
            (
                calc.nip.clone(),
                CalculationSnapshot {
                    nama: calc.nama.clone(),
                    golongan: calc.golongan.clone(),
                    wfo_days: calc.wfo_days,
                    base_amount: calc.base_amount,
                    tax_amount: calc.tax_amount,
                    total_uang_makan: calc.total_uang_makan,
                },
            )
        })
        .collect()
}
