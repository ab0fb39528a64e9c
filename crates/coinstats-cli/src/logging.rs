use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::CliError;

const DEFAULT_FILTER: &str = "coinstats=info,tower_http=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// with a log file, output is appended there instead of stderr.
///
/// The returned guard must outlive the program's last log line: dropping it
/// flushes the background file writer.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (file_layer, stderr_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), None, Some(guard))
        }
        None => (None, Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|error| CliError::Logging(error.to_string()))?;

    Ok(guard)
}

/// Non-blocking appender for `path`, creating its directory if needed.
fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), CliError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::Logging(format!("invalid log file name: {}", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|error| CliError::Logging(format!("{}: {error}", path.display())))?;
    Ok(tracing_appender::non_blocking(appender))
}
