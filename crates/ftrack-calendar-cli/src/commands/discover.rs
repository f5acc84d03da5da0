use ftrack_calendar_core::hook;

use crate::context::{print_json, CmdResult};

pub fn run() -> CmdResult {
    print_json(&hook::discover())
}
