use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod context;
mod logging;

use context::Context;

#[derive(Parser)]
#[command(
    name = "ftrack-calendar",
    version,
    about = "Put ftrack tasks, milestones and calendar events on Google Calendar"
)]
struct Cli {
    /// Config file (default: ~/.config/ftrack-calendar/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write to an in-memory calendar and print the writes instead
    #[arg(long, global = true)]
    dry_run: bool,

    /// Read ftrack records from a JSON file instead of the server
    #[arg(long, global = true, value_name = "FILE")]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the action descriptor shown in the ftrack UI
    Discover,
    /// Handle an update notification
    Update(commands::update::UpdateArgs),
    /// Handle an action launch
    Launch(commands::launch::LaunchArgs),
    /// Sync every calendarable entity under the given nodes
    Bulk(commands::bulk::BulkArgs),
    /// Find or create a calendar and print its id
    EnsureCalendar(commands::calendar::EnsureArgs),
    /// Print the closest calendar color for a project color
    Color(commands::color::ColorArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let ctx = match Context::load(cli.config, cli.dry_run, cli.records) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let log_guard = logging::init(&ctx.config.logging);

    let result = match cli.command {
        Commands::Discover => commands::discover::run(),
        Commands::Update(args) => commands::update::run(&ctx, args),
        Commands::Launch(args) => commands::launch::run(&ctx, args),
        Commands::Bulk(args) => commands::bulk::run(&ctx, args),
        Commands::EnsureCalendar(args) => commands::calendar::run(&ctx, args),
        Commands::Color(args) => commands::color::run(&ctx, args),
        Commands::Config { action } => commands::config::run(&ctx, action),
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    // `exit` skips destructors; the guard has to flush the log file first.
    drop(log_guard);
    std::process::exit(code);
}
