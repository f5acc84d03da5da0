use clap::Args;
use ftrack_calendar_core::CalendarRegistry;

use crate::context::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct EnsureArgs {
    /// Calendar name (default: the configured calendar)
    name: Option<String>,
}

pub fn run(ctx: &Context, args: EnsureArgs) -> CmdResult {
    let settings = &ctx.config.calendar;
    let name = args.name.as_deref().unwrap_or(&settings.name);

    let calendar = ctx.provisioning_calendar()?;
    let provisioned = CalendarRegistry::new(calendar.api(), settings).ensure(name)?;

    calendar.report_writes()?;
    print_json(&provisioned)
}
