//! CLI command implementations.

pub mod report;

use consul_sync_core::{Connector, SyncOrchestrator, SyncPlan, SyncResult};
use tracing::info;

/// Runs the requested actions and prints what they did.
pub fn run<C: Connector>(orchestrator: &SyncOrchestrator<C>, plan: &SyncPlan) -> SyncResult<()> {
    let config = orchestrator.config();
    info!(
        local = %config.local.address,
        staging = %config.staging.address,
        dir = %config.snapshot_dir.display(),
        "Starting consul-sync"
    );

    let summary = orchestrator.run(plan)?;
    report::print(&summary);
    Ok(())
}
