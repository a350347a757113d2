// src/sheet.rs
//
// Row-of-cells table model. Everything the calculation engines consume or
// produce is a `Sheet`: a header row plus data rows of string cells. The
// binary spreadsheet codec lives outside this crate; at the process boundary
// sheets are read and written as CSV.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid sheet structure. First two columns must be 'NAMA' and 'NIP'. Found: {col_a}, {col_b}")]
    InvalidHeader { col_a: String, col_b: String },
    #[error("Row {row} has {width} columns, but the fixed layout requires at least {required}")]
    RowTooShort {
        row: usize,
        width: usize,
        required: usize,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Day-of-month column headers: one or two digits ("1".."31").
static DATE_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}$").expect("static regex"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Builds a sheet from raw rows; row 0 is taken as the header row.
    pub fn from_rows(mut raw: Vec<Vec<String>>) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        let headers = raw.remove(0);
        Self { headers, rows: raw }
    }

    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact-match header lookup, the normal way columns of interest are
    /// located. Headers are compared trimmed.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Case-insensitive header lookup, for user-facing search surfaces.
    pub fn column_ci(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_uppercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_uppercase() == wanted)
    }

    /// Trimmed cell access; out-of-range cells read as empty.
    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|c| c.trim()).unwrap_or("")
    }

    /// Every header that is a one-or-two-digit day-of-month number, with its
    /// column index and the parsed day.
    pub fn date_columns(&self) -> Vec<(usize, u32)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| DATE_COLUMN.is_match(h.trim()))
            .filter_map(|(idx, h)| h.trim().parse::<u32>().ok().map(|day| (idx, day)))
            .collect()
    }

    /// The meal-allowance source sheet must carry NAMA and NIP as its first
    /// two columns; anything else is a fatal input-format error.
    pub fn validate_meal_header(&self) -> Result<(), SheetError> {
        let col_a = self.headers.first().map(|h| h.trim()).unwrap_or("");
        let col_b = self.headers.get(1).map(|h| h.trim()).unwrap_or("");
        if col_a != "NAMA" || col_b != "NIP" {
            return Err(SheetError::InvalidHeader {
                col_a: col_a.to_string(),
                col_b: col_b.to_string(),
            });
        }
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut raw = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw.push(record.iter().map(String::from).collect());
        }
        debug!("Read {} rows from {}", raw.len(), path.display());
        Ok(Self::from_rows(raw))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), SheetError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        debug!("Wrote {} rows to {}", self.rows.len() + 1, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[&str]]) -> Sheet {
        Sheet::from_rows(
            cells
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn header_validation_accepts_nama_nip() {
        let s = sheet(&[&["NAMA", "NIP", "1", "2"]]);
        assert!(s.validate_meal_header().is_ok());
    }

    #[test]
    fn header_validation_reports_offending_values() {
        let s = sheet(&[&["NAME", "ID", "1"]]);
        let err = s.validate_meal_header().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("NAME"), "message was: {}", message);
        assert!(message.contains("ID"), "message was: {}", message);
    }

    #[test]
    fn header_validation_fails_on_empty_sheet() {
        let s = Sheet::default();
        assert!(s.validate_meal_header().is_err());
    }

    #[test]
    fn date_columns_match_one_and_two_digit_headers_only() {
        let s = sheet(&[&["NAMA", "NIP", "1", "02", "31", "123", "X", ""]]);
        let days: Vec<u32> = s.date_columns().iter().map(|(_, d)| *d).collect();
        assert_eq!(days, vec![1, 2, 31]);
    }

    #[test]
    fn cell_reads_out_of_range_as_empty() {
        let s = sheet(&[&["NAMA", "NIP"], &["Budi"]]);
        let row = &s.rows()[0];
        assert_eq!(s.cell(row, 0), "Budi");
        assert_eq!(s.cell(row, 1), "");
    }
}
