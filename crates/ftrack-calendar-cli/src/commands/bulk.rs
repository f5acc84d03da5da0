use clap::Args;
use ftrack_calendar_core::SyncOrchestrator;

use crate::context::{CmdResult, Context};

#[derive(Args)]
pub struct BulkArgs {
    /// Project or context ids to sync under
    #[arg(required = true, value_name = "ID")]
    ids: Vec<String>,
}

pub fn run(ctx: &Context, args: BulkArgs) -> CmdResult {
    let pm = ctx.pm_session()?;
    let calendar = ctx.provisioning_calendar()?;
    let report = SyncOrchestrator::new(pm.as_ref(), calendar.api(), &ctx.config.calendar)
        .on_bulk_sync_requested(&args.ids);

    calendar.report_writes()?;
    super::finish(&report)
}
