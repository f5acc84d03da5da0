use std::path::PathBuf;

use clap::Args;
use ftrack_calendar_core::{SyncOrchestrator, UpdateNotification};

use crate::context::{read_input, CmdResult, Context};

#[derive(Args)]
pub struct UpdateArgs {
    /// Notification JSON file (default: stdin)
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

pub fn run(ctx: &Context, args: UpdateArgs) -> CmdResult {
    let notification = UpdateNotification::from_json(&read_input(args.file.as_ref())?)?;

    let pm = ctx.pm_session()?;
    let calendar = ctx.provisioning_calendar()?;
    let report = SyncOrchestrator::new(pm.as_ref(), calendar.api(), &ctx.config.calendar)
        .on_entity_changed(&notification.entities);

    calendar.report_writes()?;
    super::finish(&report)
}
