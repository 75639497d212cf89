//! Logging for the Vidstream binary
//!
//! The console shows Vidstream's own crates and request traces at the
//! configured level while dependencies stay at `warn`. A second layer writes
//! everything from Vidstream plus HTTP internals to a per-run file under the
//! configured logs directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

/// Name of the per-run debug log inside the logs directory.
pub const LAST_RUN_LOG: &str = "vidstream-last-run.log";

/// Crates whose events follow the configured console level.
const OWN_TARGETS: [&str; 4] = ["vidstream_core", "vidstream_web", "vidstream_cli", "tower_http"];

/// Failures while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("cannot create logs directory {path}: {source}")]
    LogsDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Install console and file logging described by `config`.
///
/// `RUST_LOG`, when set, replaces the console directives entirely. The file
/// at `<logs_dir>/vidstream-last-run.log` is truncated on every start.
///
/// Returns the path of the log file.
///
/// # Errors
/// - `TracingSetupError::LogsDir` - Logs directory cannot be created
/// - `TracingSetupError::LogFile` - Log file cannot be opened for writing
/// - `TracingSetupError::AlreadyInstalled` - Called twice in one process
pub fn init_tracing(config: &LoggingConfig) -> Result<PathBuf, TracingSetupError> {
    let log_file_path = config.logs_dir.join(LAST_RUN_LOG);
    let log_file = open_log_file(&config.logs_dir, &log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directives(config.console_level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new(file_directives()));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        "Logging at {} to console, full log in {}",
        config.console_level,
        log_file_path.display()
    );

    Ok(log_file_path)
}

fn open_log_file(logs_dir: &Path, log_file_path: &Path) -> Result<File, TracingSetupError> {
    std::fs::create_dir_all(logs_dir).map_err(|source| TracingSetupError::LogsDir {
        path: logs_dir.to_path_buf(),
        source,
    })?;
    File::create(log_file_path).map_err(|source| TracingSetupError::LogFile {
        path: log_file_path.to_path_buf(),
        source,
    })
}

/// Console filter: own crates at `level`, everything else at most `warn`.
pub fn console_directives(level: Level) -> String {
    let others = level.min(Level::WARN);
    let mut directives = others.to_string().to_lowercase();
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{target}={}", level.to_string().to_lowercase()));
    }
    directives
}

/// File filter: own crates at `trace`, hyper and friends at `info`.
fn file_directives() -> String {
    let mut directives = String::from("info");
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{target}=trace"));
    }
    directives
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_directives_keep_dependencies_quiet() {
        assert_eq!(
            console_directives(Level::DEBUG),
            "warn,vidstream_core=debug,vidstream_web=debug,vidstream_cli=debug,tower_http=debug"
        );
    }

    #[test]
    fn test_console_directives_error_level_applies_everywhere() {
        let directives = console_directives(Level::ERROR);
        assert!(directives.starts_with("error,"));
        assert!(!directives.contains("warn"));
    }

    #[test]
    fn test_file_directives_trace_own_crates() {
        let directives = file_directives();
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("vidstream_web=trace"));
        assert!(directives.contains("tower_http=trace"));
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("nested").join("logs");
        let path = logs_dir.join(LAST_RUN_LOG);

        open_log_file(&logs_dir, &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_open_log_file_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = open_log_file(&blocker, &blocker.join(LAST_RUN_LOG));
        assert!(matches!(result, Err(TracingSetupError::LogsDir { .. })));
    }

    #[test]
    fn test_cli_level_conversion() {
        assert_eq!(Level::from(CliLogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(CliLogLevel::Trace), Level::TRACE);
    }
}
