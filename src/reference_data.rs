// src/reference_data.rs
//
// Reference data the calculators join against: pay grades for the meal
// allowance and tunjangan kinerja baselines for the deduction step. Loaded
// once per calculation session from a repository; repositories are
// read-through caches with an explicit `refresh()` contract so reference
// mutations are picked up deliberately, never ambiently.

use crate::employee::clean_nip;
use crate::sheet::Sheet;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeGrade {
    pub nip: String,
    pub nama: String,
    pub golongan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunjanganKinerja {
    pub nip: String,
    pub nama: String,
    #[serde(default)]
    pub jabatan: String,
    #[serde(default)]
    pub unit_kerja: String,
    pub tunjangan_kinerja: Decimal,
}

/// Grade lookup is by exact name match, trimmed and case-insensitive.
pub fn find_grade_by_nama<'a>(grades: &'a [EmployeeGrade], nama: &str) -> Option<&'a EmployeeGrade> {
    let wanted = nama.trim().to_lowercase();
    grades
        .iter()
        .find(|g| g.nama.trim().to_lowercase() == wanted)
}

/// Baseline lookup prefers the NIP key and falls back to the name.
pub fn find_baseline<'a>(
    baselines: &'a [TunjanganKinerja],
    nip: &str,
    nama: &str,
) -> Option<&'a TunjanganKinerja> {
    baselines
        .iter()
        .find(|tk| tk.nip == nip)
        .or_else(|| baselines.iter().find(|tk| tk.nama == nama))
}

// --- Repositories ---

#[async_trait]
pub trait GradeRepository: Send + Sync {
    /// Full grade list, ordered by name ascending.
    async fn all(&self) -> Result<Vec<EmployeeGrade>, ReferenceError>;
    /// Insert-or-update keyed by NIP.
    async fn upsert(&self, grade: EmployeeGrade) -> Result<(), ReferenceError>;
    /// Drops the read-through cache so the next `all()` reloads from storage.
    async fn refresh(&self) -> Result<(), ReferenceError>;
}

#[async_trait]
pub trait BaselineRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<TunjanganKinerja>, ReferenceError>;
    async fn upsert(&self, baseline: TunjanganKinerja) -> Result<(), ReferenceError>;
    async fn refresh(&self) -> Result<(), ReferenceError>;
}

/// JSON-file-backed store, shared by both repositories. One file per list,
/// loaded lazily and kept until `refresh()`.
pub struct JsonFileStore<T> {
    path: PathBuf,
    cache: Mutex<Option<Vec<T>>>,
}

impl<T> JsonFileStore<T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<Vec<T>, ReferenceError> {
        let mut cache = self.cache.lock().await;
        if let Some(items) = cache.as_ref() {
            return Ok(items.clone());
        }
        let items: Vec<T> = if self.path.exists() {
            let raw = std::fs::read_to_string(&self.path)?;
            serde_json::from_str(&raw)?
        } else {
            debug!(
                "Reference file {} not present, starting empty",
                self.path.display()
            );
            Vec::new()
        };
        *cache = Some(items.clone());
        Ok(items)
    }

    async fn save(&self, items: Vec<T>) -> Result<(), ReferenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&items)?)?;
        *self.cache.lock().await = Some(items);
        Ok(())
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

pub struct JsonGradeRepository {
    store: JsonFileStore<EmployeeGrade>,
}

impl JsonGradeRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            store: JsonFileStore::new(path),
        }
    }
}

#[async_trait]
impl GradeRepository for JsonGradeRepository {
    async fn all(&self) -> Result<Vec<EmployeeGrade>, ReferenceError> {
        let mut grades = self.store.load().await?;
        grades.sort_by(|a, b| a.nama.cmp(&b.nama));
        Ok(grades)
    }

    async fn upsert(&self, grade: EmployeeGrade) -> Result<(), ReferenceError> {
        let mut grades = self.store.load().await?;
        match grades.iter_mut().find(|g| g.nip == grade.nip) {
            Some(existing) => *existing = grade,
            None => grades.push(grade),
        }
        self.store.save(grades).await
    }

    async fn refresh(&self) -> Result<(), ReferenceError> {
        self.store.invalidate().await;
        info!("Grade repository cache invalidated");
        Ok(())
    }
}

pub struct JsonBaselineRepository {
    store: JsonFileStore<TunjanganKinerja>,
}

impl JsonBaselineRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            store: JsonFileStore::new(path),
        }
    }
}

#[async_trait]
impl BaselineRepository for JsonBaselineRepository {
    async fn all(&self) -> Result<Vec<TunjanganKinerja>, ReferenceError> {
        let mut baselines = self.store.load().await?;
        baselines.sort_by(|a, b| a.nama.cmp(&b.nama));
        Ok(baselines)
    }

    async fn upsert(&self, baseline: TunjanganKinerja) -> Result<(), ReferenceError> {
        let mut baselines = self.store.load().await?;
        match baselines.iter_mut().find(|b| b.nip == baseline.nip) {
            Some(existing) => *existing = baseline,
            None => baselines.push(baseline),
        }
        self.store.save(baselines).await
    }

    async fn refresh(&self) -> Result<(), ReferenceError> {
        self.store.invalidate().await;
        info!("Baseline repository cache invalidated");
        Ok(())
    }
}

// --- Sheet import ---

fn header_index(sheet: &Sheet, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| sheet.column_ci(n))
}

/// Reads a grade reference sheet. Rows missing a name or NIP are skipped.
pub fn grades_from_sheet(sheet: &Sheet) -> Vec<EmployeeGrade> {
    let (Some(nama_col), Some(nip_col), Some(gol_col)) = (
        header_index(sheet, &["NAMA"]),
        header_index(sheet, &["NIP"]),
        header_index(sheet, &["GOLONGAN"]),
    ) else {
        warn!("Grade sheet is missing one of NAMA/NIP/GOLONGAN, importing nothing");
        return Vec::new();
    };

    sheet
        .rows()
        .iter()
        .filter_map(|row| {
            let nama = sheet.cell(row, nama_col).to_string();
            let nip = clean_nip(sheet.cell(row, nip_col));
            if nama.is_empty() || nip.is_empty() {
                return None;
            }
            Some(EmployeeGrade {
                nip,
                nama,
                golongan: sheet.cell(row, gol_col).to_string(),
            })
        })
        .collect()
}

/// Reads a tunjangan kinerja baseline sheet. Malformed amounts parse to 0.
pub fn baselines_from_sheet(sheet: &Sheet) -> Vec<TunjanganKinerja> {
    let (Some(nama_col), Some(nip_col)) = (
        header_index(sheet, &["NAMA"]),
        header_index(sheet, &["NIP"]),
    ) else {
        warn!("Baseline sheet is missing NAMA/NIP, importing nothing");
        return Vec::new();
    };
    let jabatan_col = header_index(sheet, &["JABATAN"]);
    let unit_col = header_index(sheet, &["UNIT KERJA", "UNIT_KERJA"]);
    let amount_col = header_index(sheet, &["TUNJANGAN KINERJA", "TUNJANGAN_KINERJA"]);

    sheet
        .rows()
        .iter()
        .filter_map(|row| {
            let nama = sheet.cell(row, nama_col).to_string();
            let nip = clean_nip(sheet.cell(row, nip_col));
            if nama.is_empty() || nip.is_empty() {
                return None;
            }
            let amount = amount_col
                .map(|c| sheet.cell(row, c))
                .and_then(|raw| Decimal::from_str(raw).ok())
                .unwrap_or_default();
            Some(TunjanganKinerja {
                nip,
                nama,
                jabatan: jabatan_col.map(|c| sheet.cell(row, c).to_string()).unwrap_or_default(),
                unit_kerja: unit_col.map(|c| sheet.cell(row, c).to_string()).unwrap_or_default(),
                tunjangan_kinerja: amount,
            })
        })
        .collect()
}
