//! Tracing subscriber setup.

use std::path::Path;

use ftrack_calendar_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "ftrack-calendar";
const LOG_FILE_SUFFIX: &str = "log";
/// Five weeks of daily files.
const MAX_LOG_FILES: usize = 35;

/// Daily rolling appender in `directory`; the oldest files beyond
/// [`MAX_LOG_FILES`] are deleted on rotation.
fn file_appender(directory: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(directory)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs always go to
/// stderr so stdout stays clean for JSON output; with a configured directory
/// they are also written to a rolling file. The returned guard must outlive
/// every log call.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = match config.directory.as_deref().map(file_appender) {
        Some(Ok(appender)) => Some(appender),
        Some(Err(e)) => {
            eprintln!("warning: file logging disabled: {e}");
            None
        }
        None => None,
    };

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(stderr_layer)
                .init();
            Some(guard)
        }
        None => {
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
