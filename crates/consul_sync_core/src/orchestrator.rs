//! Backup, export and import sequencing.
//!
//! Each operation is a linear pipeline. Setup failures (connecting, listing
//! keys, reading or writing a snapshot file) abort with a [`SyncError`].
//! Failures on individual keys are recorded in the returned report and the
//! pipeline moves on to the next key.

use crate::backend::{Connector, KvBackend, StoreRole};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::outcome::{ImportReport, RecordError, RecordOutcome, RunSummary, SnapshotReport};
use crate::record::Record;
use crate::rewrite::{PlannedRecord, PrefixRewrite, RewriteDecision};
use crate::snapshot::{self, SnapshotStore};
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Operations requested for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Take a standalone backup of the local store.
    pub backup: bool,
    /// Export the staging store.
    pub export: bool,
    /// Import the export into the local store with these prefixes.
    pub import: Option<PrefixRewrite>,
}

impl SyncPlan {
    /// Returns true if no operation is requested.
    pub fn is_empty(&self) -> bool {
        !self.backup && !self.export && self.import.is_none()
    }
}

/// Drives sync operations against the configured stores.
pub struct SyncOrchestrator<C: Connector> {
    config: SyncConfig,
    connector: C,
    snapshots: SnapshotStore,
}

impl<C: Connector> SyncOrchestrator<C> {
    /// Creates an orchestrator. Snapshots go to `config.snapshot_dir`.
    pub fn new(config: SyncConfig, connector: C) -> Self {
        let snapshots = SnapshotStore::new(config.snapshot_dir.clone());
        Self {
            config,
            connector,
            snapshots,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The snapshot store in use.
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Runs the requested operations in order: backup, export, import.
    ///
    /// Stops at the first fatal error.
    pub fn run(&self, plan: &SyncPlan) -> SyncResult<RunSummary> {
        let mut summary = RunSummary::default();
        if plan.backup {
            summary.backup = Some(self.backup_local()?);
        }
        if plan.export {
            summary.export = Some(self.export_staging()?);
        }
        if let Some(rewrite) = &plan.import {
            summary.import = Some(self.import(rewrite)?);
        }
        Ok(summary)
    }

    /// Snapshots the local store to a timestamped file.
    pub fn backup_local(&self) -> SyncResult<SnapshotReport> {
        self.backup_local_at(snapshot::now())
    }

    /// Snapshots the local store to the file named for `at`.
    pub fn backup_local_at(&self, at: OffsetDateTime) -> SyncResult<SnapshotReport> {
        let path = self.snapshots.backup_path(at)?;
        let report = self.take_snapshot(StoreRole::Local, path)?;
        info!(
            "✅ Local backup created: {} ({} keys)",
            report.path.display(),
            report.records
        );
        Ok(report)
    }

    /// Snapshots the staging store to the export file.
    pub fn export_staging(&self) -> SyncResult<SnapshotReport> {
        let report = self.take_snapshot(StoreRole::Staging, self.snapshots.export_path())?;
        info!(
            "✅ Exported staging KV → {} ({} keys)",
            report.path.display(),
            report.records
        );
        Ok(report)
    }

    /// Backs up the local store, then writes the selected part of the
    /// export into it.
    pub fn import(&self, rewrite: &PrefixRewrite) -> SyncResult<ImportReport> {
        self.import_at(rewrite, snapshot::now())
    }

    /// Like [`Self::import`], naming the safety backup for `at`.
    pub fn import_at(
        &self,
        rewrite: &PrefixRewrite,
        at: OffsetDateTime,
    ) -> SyncResult<ImportReport> {
        let backup = self.backup_local_at(at)?;

        let local = self.connect(StoreRole::Local)?;
        let source = self.snapshots.export_path();
        let records = self.snapshots.read(&source)?;

        let plan = rewrite.plan(&records);
        info!("📥 Importing {} keys ({})...", plan.total(), rewrite);

        let outcomes = plan.map(|planned| apply(&local, planned)).collect();
        let report = ImportReport {
            backup,
            source,
            rewrite: rewrite.clone(),
            available: records.len(),
            outcomes,
        };
        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            "🎉 Import complete!"
        );
        Ok(report)
    }

    fn connect(&self, role: StoreRole) -> SyncResult<C::Backend> {
        self.connector.connect(role, self.config.endpoint(role))
    }

    fn take_snapshot(&self, role: StoreRole, path: PathBuf) -> SyncResult<SnapshotReport> {
        let backend = self.connect(role)?;
        let keys = backend
            .list_keys()
            .map_err(|source| SyncError::ListKeys { role, source })?;

        let total = keys.len();
        let mut records = Vec::with_capacity(total);
        let mut missing = Vec::new();
        let mut failed = Vec::new();

        for (i, key) in keys.into_iter().enumerate() {
            match backend.get(&key) {
                Ok(Some(value)) => records.push(Record { key, value }),
                Ok(None) => {
                    warn!("⚠️ Key {key} disappeared before it could be read");
                    missing.push(key);
                }
                Err(source) => {
                    let err = RecordError {
                        index: i + 1,
                        total,
                        key,
                        destination: None,
                        source,
                    };
                    warn!("⚠️ Failed to read key {err}");
                    failed.push(err);
                }
            }
        }

        self.snapshots.write(&path, &records)?;

        Ok(SnapshotReport {
            role,
            path,
            records: records.len(),
            missing,
            failed,
        })
    }
}

fn apply<B: KvBackend>(local: &B, planned: PlannedRecord<'_>) -> RecordOutcome {
    let PlannedRecord {
        index,
        total,
        record,
        decision,
    } = planned;

    let destination = match decision {
        RewriteDecision::Selected(destination) => destination,
        RewriteDecision::Skipped(reason) => {
            info!("⚠️ Skipping key '{}' because {}", record.key, reason);
            return RecordOutcome::Skipped {
                key: record.key.clone(),
                reason,
            };
        }
    };

    match local.put(&destination, &record.value) {
        Ok(()) => {
            info!("[{index}/{total}] ✅ {} → {destination}", record.key);
            RecordOutcome::Written {
                key: record.key.clone(),
                destination,
            }
        }
        Err(source) => {
            let err = RecordError {
                index,
                total,
                key: record.key.clone(),
                destination: Some(destination),
                source,
            };
            warn!("❌ Failed: {err}");
            RecordOutcome::Failed(err)
        }
    }
}
