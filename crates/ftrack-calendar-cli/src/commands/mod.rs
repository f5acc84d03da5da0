pub mod bulk;
pub mod calendar;
pub mod color;
pub mod config;
pub mod discover;
pub mod launch;
pub mod update;

use ftrack_calendar_core::SyncReport;

use crate::context::{print_json, CmdResult};

/// Print the report, failing the command when any entity or set failed.
fn finish(report: &SyncReport) -> CmdResult {
    print_json(report)?;
    if report.has_failures() {
        return Err(format!(
            "{} entit(ies) and {} query set(s) failed to sync",
            report.failed(),
            report.failed_sets.len()
        )
        .into());
    }
    Ok(())
}
