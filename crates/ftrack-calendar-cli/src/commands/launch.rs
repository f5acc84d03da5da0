use std::path::PathBuf;

use clap::Args;
use ftrack_calendar_core::hook::ACTION_IDENTIFIER;
use ftrack_calendar_core::{ActionLaunch, SyncOrchestrator};

use crate::context::{read_input, CmdResult, Context};

#[derive(Args)]
pub struct LaunchArgs {
    /// Launch payload JSON file (default: stdin)
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

pub fn run(ctx: &Context, args: LaunchArgs) -> CmdResult {
    let launch = ActionLaunch::from_json(&read_input(args.file.as_ref())?)?;
    let Some(selection) = launch.bulk_selection() else {
        tracing::info!(
            action = launch.action_identifier.as_deref().unwrap_or_default(),
            expected = ACTION_IDENTIFIER,
            "launch is for another action, ignoring"
        );
        return Ok(());
    };

    let pm = ctx.pm_session()?;
    let calendar = ctx.provisioning_calendar()?;
    let report = SyncOrchestrator::new(pm.as_ref(), calendar.api(), &ctx.config.calendar)
        .on_bulk_sync_requested(&selection);

    calendar.report_writes()?;
    super::finish(&report)
}
