//! Configuration and adapter wiring shared by the commands.

use std::error::Error;
use std::path::PathBuf;

use ftrack_calendar_core::calendar::CalendarOp;
use ftrack_calendar_core::{
    CalendarApi, Config, FtrackSession, GoogleAuth, GoogleCalendarClient, GoogleCredentials,
    InMemoryCalendar, InMemoryPmSession, PmSession,
};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn Error>>;

pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    dry_run: bool,
    records: Option<PathBuf>,
}

/// The calendar backend a command writes to.
pub enum CalendarBackend {
    Google(GoogleCalendarClient),
    DryRun(InMemoryCalendar),
}

impl CalendarBackend {
    pub fn api(&self) -> &dyn CalendarApi {
        match self {
            Self::Google(client) => client,
            Self::DryRun(calendar) => calendar,
        }
    }

    /// On a dry run, print the writes that would have been made to stderr.
    pub fn report_writes(&self) -> CmdResult {
        if let Self::DryRun(calendar) = self {
            let writes: Vec<CalendarOp> = calendar.writes();
            eprintln!("dry run, {} calendar write(s) not sent", writes.len());
            for op in &writes {
                eprintln!("  {} {}", op.method(), serde_json::to_string(op)?);
            }
        }
        Ok(())
    }
}

impl Context {
    pub fn load(
        config_path: Option<PathBuf>,
        dry_run: bool,
        records: Option<PathBuf>,
    ) -> Result<Self, Box<dyn Error>> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let mut config = Config::load_from(&config_path)?;
        config.apply_env();
        Ok(Self {
            config_path,
            config,
            dry_run,
            records,
        })
    }

    /// Offline records when `--records` is given, the ftrack server otherwise.
    pub fn pm_session(&self) -> Result<Box<dyn PmSession>, Box<dyn Error>> {
        if let Some(path) = &self.records {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            return Ok(Box::new(InMemoryPmSession::from_json(&raw)?));
        }
        let credentials = self.config.ftrack_credentials(|key| std::env::var(key).ok())?;
        tracing::debug!(?credentials, "connecting to ftrack");
        Ok(Box::new(FtrackSession::new(
            &credentials.server_url,
            &credentials.api_user,
            &credentials.api_key,
        )?))
    }

    /// Calendar backend for commands that provision the shared calendar.
    ///
    /// Sharing is mandatory against the real service; a dry run only reports
    /// the missing group as a warning.
    pub fn provisioning_calendar(&self) -> Result<CalendarBackend, Box<dyn Error>> {
        if !self.dry_run && self.config.calendar.share_group.is_none() {
            return Err(format!(
                "calendar.share_group must be set in {} before syncing",
                self.config_path.display()
            )
            .into());
        }
        self.calendar()
    }

    pub fn calendar(&self) -> Result<CalendarBackend, Box<dyn Error>> {
        if self.dry_run {
            return Ok(CalendarBackend::DryRun(InMemoryCalendar::new()));
        }
        let auth = GoogleAuth::new(GoogleCredentials::from_env()?);
        Ok(CalendarBackend::Google(GoogleCalendarClient::with_base_url(
            auth,
            &self.config.calendar.api_base,
        )?))
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a payload from `path`, or stdin when no path is given.
pub fn read_input(path: Option<&PathBuf>) -> Result<String, Box<dyn Error>> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()).into()),
        None => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}
