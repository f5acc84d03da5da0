use clap::Args;
use ftrack_calendar_core::resolve_color;

use crate::context::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct ColorArgs {
    /// Project color, e.g. "#46d6db" or "red"
    color: String,
}

pub fn run(ctx: &Context, args: ColorArgs) -> CmdResult {
    let calendar = ctx.calendar()?;
    let palette = calendar.api().colors()?.event_palette();

    match resolve_color(&args.color, &palette)? {
        Some(found) => print_json(&found),
        None => Err("calendar palette is empty".into()),
    }
}
