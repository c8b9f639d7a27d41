//! Per-record outcomes and operation reports.

use crate::backend::StoreRole;
use crate::error::BackendError;
use crate::rewrite::{PrefixRewrite, SkipReason};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single key that could not be read or written. Never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{index}/{total}] {key}{}: {source}", arrow(.destination))]
pub struct RecordError {
    /// 1-based position of the record in the batch.
    pub index: usize,
    /// Size of the batch.
    pub total: usize,
    /// Key as it appears in the source.
    pub key: String,
    /// Key it was being written to, for writes.
    pub destination: Option<String>,
    /// What went wrong.
    #[source]
    pub source: BackendError,
}

fn arrow(destination: &Option<String>) -> String {
    destination
        .as_ref()
        .map(|d| format!(" → {d}"))
        .unwrap_or_default()
}

/// What happened to one selected record during an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The value was written.
    Written {
        /// Source key.
        key: String,
        /// Destination key.
        destination: String,
    },
    /// The rewrite policy declined to write the record.
    Skipped {
        /// Source key.
        key: String,
        /// Why.
        reason: SkipReason,
    },
    /// The write failed.
    Failed(RecordError),
}

/// Result of a backup or export.
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    /// Store the snapshot was taken from.
    pub role: StoreRole,
    /// File written.
    pub path: PathBuf,
    /// Number of records in the file.
    pub records: usize,
    /// Keys that were listed but gone by the time they were fetched.
    pub missing: Vec<String>,
    /// Keys whose fetch failed.
    pub failed: Vec<RecordError>,
}

impl SnapshotReport {
    /// Number of keys listed by the store.
    pub fn listed(&self) -> usize {
        self.records + self.missing.len() + self.failed.len()
    }

    /// Returns true if every listed key made it into the snapshot.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for SnapshotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.role {
            StoreRole::Local => "Local backup created",
            StoreRole::Staging => "Exported staging KV →",
        };
        write!(f, "✅ {what} {} ({} keys)", self.path.display(), self.records)?;
        if !self.missing.is_empty() {
            write!(f, ", {} vanished", self.missing.len())?;
        }
        if !self.failed.is_empty() {
            write!(f, ", ⚠️ {} failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// Result of an import.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// The safety backup taken before writing.
    pub backup: SnapshotReport,
    /// Snapshot the records came from.
    pub source: PathBuf,
    /// Prefixes used.
    pub rewrite: PrefixRewrite,
    /// Records in the snapshot.
    pub available: usize,
    /// One entry per selected record, in processing order.
    pub outcomes: Vec<RecordOutcome>,
}

impl ImportReport {
    /// Number of records that passed the prefix filter.
    pub fn selected(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of records written.
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Written { .. }))
    }

    /// Number of records skipped by policy.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    /// Number of records whose write failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed(_)))
    }

    /// The failed writes.
    pub fn errors(&self) -> impl Iterator<Item = &RecordError> {
        self.outcomes.iter().filter_map(|o| match o {
            RecordOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.failed() == 0 { "🎉" } else { "⚠️" };
        write!(
            f,
            "{marker} Import complete: {} selected of {} ({}), {} written, {} skipped, {} failed",
            self.selected(),
            self.available,
            self.rewrite,
            self.written(),
            self.skipped(),
            self.failed(),
        )
    }
}

/// Everything a run did, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Standalone backup, if requested.
    pub backup: Option<SnapshotReport>,
    /// Export, if requested.
    pub export: Option<SnapshotReport>,
    /// Import, if requested.
    pub import: Option<ImportReport>,
}

impl RunSummary {
    /// Total per-record failures across all operations.
    pub fn failures(&self) -> usize {
        let snapshot = |r: &Option<SnapshotReport>| r.as_ref().map_or(0, |r| r.failed.len());
        snapshot(&self.backup)
            + snapshot(&self.export)
            + self
                .import
                .as_ref()
                .map_or(0, |i| i.failed() + i.backup.failed.len())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if let Some(backup) = &self.backup {
            lines.push(backup.to_string());
        }
        if let Some(export) = &self.export {
            lines.push(export.to_string());
        }
        if let Some(import) = &self.import {
            lines.push(import.backup.to_string());
            lines.push(import.to_string());
        }
        f.write_str(&lines.join("\n"))
    }
}
