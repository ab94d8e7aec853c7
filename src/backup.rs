//! Backup association: mirror writes on a live database into a DTO-backed repository.
//!
//! [`BackedUpDatabase::new`] is pure composition. It builds a [`DaoBackup`]
//! adapter for the assembly's table types and subscribes it to the tracked
//! database, after which every write to a tracked table is applied to the
//! repository as well.

use crate::assembly::DaoAssembly;
use crate::generator::clean_type_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// A single write observed on the tracked database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteEvent {
    pub table: String,
    pub kind: WriteKind,
    /// Column values of the written row
    #[serde(default)]
    pub record: Map<String, Value>,
}

impl WriteEvent {
    pub fn new(table: impl Into<String>, kind: WriteKind, record: Map<String, Value>) -> Self {
        Self {
            table: table.into(),
            kind,
            record,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("repository rejected {kind:?} on `{table}`: {reason}")]
    Repository {
        table: String,
        kind: WriteKind,
        reason: String,
    },
}

/// Callback a tracked database invokes after each write.
pub type WriteListener = Box<dyn Fn(&WriteEvent) -> Result<(), BackupError> + Send + Sync>;

/// A live database whose writes can be observed.
pub trait TrackedDatabase {
    fn observe_writes(&self, listener: WriteListener);
}

/// A repository that can apply mirrored writes, keyed by DTO type name.
pub trait BackupRepository: Send + Sync {
    fn apply_write(&self, dto_type: &str, event: &WriteEvent) -> Result<(), BackupError>;
}

/// Change-tracking adapter between a tracked database and a backup repository.
pub struct DaoBackup {
    repository: Arc<dyn BackupRepository>,
    // lowercased table name → DTO type name
    tables: BTreeMap<String, String>,
    mirrored: AtomicU64,
    skipped: AtomicU64,
}

impl DaoBackup {
    pub fn new(assembly: &DaoAssembly, repository: Arc<dyn BackupRepository>) -> Self {
        let tables = assembly
            .table_types()
            .map(|t| (t.table_name().to_lowercase(), clean_type_name(&t.name)))
            .collect();
        Self {
            repository,
            tables,
            mirrored: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Whether writes to `table` are mirrored (case-insensitive).
    pub fn tracks(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    /// Mirror one write. Writes to tables outside the assembly are ignored.
    pub fn handle(&self, event: &WriteEvent) -> Result<(), BackupError> {
        let Some(dto_type) = self.tables.get(&event.table.to_lowercase()) else {
            tracing::debug!(table = %event.table, "write to untracked table, not mirrored");
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };
        if let Err(e) = self.repository.apply_write(dto_type, event) {
            tracing::error!(table = %event.table, dto = %dto_type, error = %e, "backup write failed");
            return Err(e);
        }
        self.mirrored.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn mirrored(&self) -> u64 {
        self.mirrored.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DaoBackup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaoBackup")
            .field("tables", &self.tables)
            .field("mirrored", &self.mirrored())
            .field("skipped", &self.skipped())
            .finish_non_exhaustive()
    }
}

/// A repository bound to a live database as its write-through backup target.
#[derive(Debug)]
pub struct BackedUpDatabase {
    backup: Arc<DaoBackup>,
}

impl BackedUpDatabase {
    pub fn new(
        assembly: &DaoAssembly,
        repository: Arc<dyn BackupRepository>,
        database_to_track: &dyn TrackedDatabase,
    ) -> Self {
        let backup = Arc::new(DaoBackup::new(assembly, repository));
        let listener = Arc::clone(&backup);
        database_to_track.observe_writes(Box::new(move |event| listener.handle(event)));
        tracing::info!(assembly = %assembly.name, tables = backup.tables.len(), "backup association established");
        Self { backup }
    }

    pub fn backup(&self) -> &DaoBackup {
        &self.backup
    }
}
