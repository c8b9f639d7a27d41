//! Operator summary printed once a run completes.

use consul_sync_core::{ImportReport, RecordOutcome, RunSummary, SnapshotReport};

/// Prints the summary to stdout.
pub fn print(summary: &RunSummary) {
    println!("{}", render(summary));
}

/// Per-key problems first, then the summary lines.
pub fn render(summary: &RunSummary) -> String {
    let mut lines = Vec::new();
    for snapshot in [&summary.backup, &summary.export].into_iter().flatten() {
        snapshot_details(snapshot, &mut lines);
    }
    if let Some(import) = &summary.import {
        snapshot_details(&import.backup, &mut lines);
        import_details(import, &mut lines);
    }

    lines.push(summary.to_string());
    match summary.failures() {
        0 => {}
        1 => lines.push("⚠️ 1 key failed, see the errors above".to_string()),
        n => lines.push(format!("⚠️ {n} keys failed, see the errors above")),
    }
    lines.join("\n")
}

fn snapshot_details(report: &SnapshotReport, lines: &mut Vec<String>) {
    for key in &report.missing {
        lines.push(format!("  ⚠️ vanished before read: {key}"));
    }
    for err in &report.failed {
        lines.push(format!("  ❌ {err}"));
    }
}

fn import_details(report: &ImportReport, lines: &mut Vec<String>) {
    for outcome in &report.outcomes {
        match outcome {
            RecordOutcome::Written { .. } => {}
            RecordOutcome::Skipped { key, reason } => {
                lines.push(format!("  ⚠️ skipped '{key}' because {reason}"));
            }
            RecordOutcome::Failed(err) => lines.push(format!("  ❌ {err}")),
        }
    }
}
