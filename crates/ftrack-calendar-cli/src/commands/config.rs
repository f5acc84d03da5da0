use clap::Subcommand;
use ftrack_calendar_core::Config;

use crate::context::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file plus environment overrides)
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Get a config value
    Get {
        /// Config key (e.g. "calendar.name", "logging.level")
        key: String,
    },
}

pub fn run(ctx: &Context, action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Show => print_json(&ctx.config)?,
        ConfigAction::Path => println!("{}", ctx.config_path.display()),
        ConfigAction::Init { force } => {
            if ctx.config_path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    ctx.config_path.display()
                )
                .into());
            }
            Config::default().save_to(&ctx.config_path)?;
            println!("wrote {}", ctx.config_path.display());
        }
        ConfigAction::Get { key } => match ctx.config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
    }
    Ok(())
}
