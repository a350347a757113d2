// src/archive.rs
//
// Archive of generated files, keyed by (kind, employee type, period) for
// duplicate detection. Generation always hands the caller the output;
// archiving is the side effect that can conflict. A duplicate period
// suspends the write until the operator explicitly chooses replace or
// cancel — single-operator assumption, the check-then-act window is not
// guarded against concurrent writers.

use crate::period::Period;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No archive record with id {0}")]
    NotFound(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    AdkUangMakan,
    TunjanganKinerja,
    AdkTukin,
}

/// Payload is either the raw extract text or reconciled sheet rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchivePayload {
    Text(String),
    Rows(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArchive {
    pub kind: ArchiveKind,
    /// Employment-category partition; `None` for kinds archived per period
    /// only (tunjangan kinerja).
    pub employee_type: Option<String>,
    pub period: Period,
    pub file_name: String,
    pub payload: ArchivePayload,
    pub calculation_results: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: u64,
    pub kind: ArchiveKind,
    pub employee_type: Option<String>,
    pub period: Period,
    pub file_name: String,
    pub payload: ArchivePayload,
    pub calculation_results: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn find_by_period(
        &self,
        kind: ArchiveKind,
        employee_type: Option<&str>,
        period: Period,
    ) -> Result<Option<ArchiveRecord>, ArchiveError>;
    async fn insert(&self, new: NewArchive) -> Result<ArchiveRecord, ArchiveError>;
    /// Overwrites an existing record in place, bumping `updated_at`.
    async fn replace(&self, id: u64, new: NewArchive) -> Result<ArchiveRecord, ArchiveError>;
    /// Newest-first listing, optionally narrowed to one kind.
    async fn list(&self, kind: Option<ArchiveKind>) -> Result<Vec<ArchiveRecord>, ArchiveError>;
    async fn delete(&self, id: u64) -> Result<bool, ArchiveError>;
}

/// Outcome of an archive attempt. On conflict the pending record is handed
/// back so the caller can resolve with `replace` after confirmation.
#[derive(Debug)]
pub enum ArchiveOutcome {
    Saved(ArchiveRecord),
    Conflict {
        existing: ArchiveRecord,
        pending: NewArchive,
    },
}

/// Duplicate-period gate: inserts when the slot is free, otherwise surfaces
/// the conflict for an explicit operator decision.
pub async fn save_or_conflict(
    store: &dyn ArchiveStore,
    new: NewArchive,
) -> Result<ArchiveOutcome, ArchiveError> {
    let existing = store
        .find_by_period(new.kind, new.employee_type.as_deref(), new.period)
        .await?;
    match existing {
        Some(existing) => {
            info!(
                "Archive conflict: {} already exists for period {}",
                existing.file_name, existing.period
            );
            Ok(ArchiveOutcome::Conflict {
                existing,
                pending: new,
            })
        }
        None => Ok(ArchiveOutcome::Saved(store.insert(new).await?)),
    }
}

// --- JSON-file-backed store ---

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArchiveFile {
    next_id: u64,
    records: Vec<ArchiveRecord>,
}

pub struct JsonArchiveStore {
    path: PathBuf,
    inner: Mutex<Option<ArchiveFile>>,
}

impl JsonArchiveStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            inner: Mutex::new(None),
        }
    }

    fn load_file(&self) -> Result<ArchiveFile, ArchiveError> {
        if self.path.exists() {
            let raw = std::fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&raw)?)
        } else {
            debug!(
                "Archive file {} not present, starting empty",
                self.path.display()
            );
            Ok(ArchiveFile {
                next_id: 1,
                records: Vec::new(),
            })
        }
    }

    fn persist(&self, file: &ArchiveFile) -> Result<(), ArchiveError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(file)?)?;
        Ok(())
    }

    async fn with_file<R>(
        &self,
        op: impl FnOnce(&mut ArchiveFile) -> Result<(R, bool), ArchiveError>,
    ) -> Result<R, ArchiveError> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_file()?);
        }
        let file = guard.as_mut().expect("initialized above");
        let (result, dirty) = op(file)?;
        if dirty {
            self.persist(file)?;
        }
        Ok(result)
    }
}

#[async_trait]
impl ArchiveStore for JsonArchiveStore {
    async fn find_by_period(
        &self,
        kind: ArchiveKind,
        employee_type: Option<&str>,
        period: Period,
    ) -> Result<Option<ArchiveRecord>, ArchiveError> {
        self.with_file(|file| {
            let found = file
                .records
                .iter()
                .find(|r| {
                    r.kind == kind
                        && r.employee_type.as_deref() == employee_type
                        && r.period == period
                })
                .cloned();
            Ok((found, false))
        })
        .await
    }

    async fn insert(&self, new: NewArchive) -> Result<ArchiveRecord, ArchiveError> {
        self.with_file(|file| {
            let now = Utc::now();
            let record = ArchiveRecord {
                id: file.next_id,
                kind: new.kind,
                employee_type: new.employee_type,
                period: new.period,
                file_name: new.file_name,
                payload: new.payload,
                calculation_results: new.calculation_results,
                created_at: now,
                updated_at: now,
            };
            file.next_id += 1;
            file.records.push(record.clone());
            info!("Archived {} (id {})", record.file_name, record.id);
            Ok((record, true))
        })
        .await
    }

    async fn replace(&self, id: u64, new: NewArchive) -> Result<ArchiveRecord, ArchiveError> {
        self.with_file(|file| {
            let record = file
                .records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(ArchiveError::NotFound(id))?;
            record.kind = new.kind;
            record.employee_type = new.employee_type;
            record.period = new.period;
            record.file_name = new.file_name;
            record.payload = new.payload;
            record.calculation_results = new.calculation_results;
            record.updated_at = Utc::now();
            let updated = record.clone();
            info!("Replaced archive record {} ({})", id, updated.file_name);
            Ok((updated, true))
        })
        .await
    }

    async fn list(&self, kind: Option<ArchiveKind>) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        self.with_file(|file| {
            let mut records: Vec<ArchiveRecord> = file
                .records
                .iter()
                .filter(|r| kind.map_or(true, |k| r.kind == k))
                .cloned()
                .collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok((records, false))
        })
        .await
    }

    async fn delete(&self, id: u64) -> Result<bool, ArchiveError> {
        self.with_file(|file| {
            let before = file.records.len();
            file.records.retain(|r| r.id != id);
            let removed = file.records.len() != before;
            Ok((removed, removed))
        })
        .await
    }
}
