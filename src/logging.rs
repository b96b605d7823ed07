//! Operator logging.
//!
//! Resolver rejections, git failures and configuration problems are recorded
//! through `tracing`. The subscriber installed here has two optional sinks:
//! a daily rolling file under the user's data directory, and stderr when the
//! CLI runs with `--verbose`.

use crate::error::DocrootError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used by the stderr sink when `RUST_LOG` is unset.
const DEFAULT_STDERR_FILTER: &str = "debug";

/// The `[logging]` table of `docroot.toml`.
///
/// Without a `log_dir`, files land in
/// `$XDG_DATA_HOME/docroot/logs/<app_name>.log.<date>`.
///
/// ```rust
/// use docroot::logging::{LogLevel, LoggingConfig};
///
/// let config = LoggingConfig::new()
///     .with_app_name("docs-server")
///     .with_level(LogLevel::Debug);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write the rolling log file at all.
    pub enabled: bool,
    /// File name prefix.
    pub app_name: String,
    /// Overrides the data-directory location.
    pub log_dir: Option<PathBuf>,
    /// Minimum level written to the file.
    pub level: LogLevel,
}

impl LoggingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Where the rolling file goes.
    ///
    /// # Errors
    ///
    /// Fails when no `log_dir` is configured and the platform has no data
    /// directory.
    pub fn directory(&self) -> Result<PathBuf, DocrootError> {
        if let Some(dir) = &self.log_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|data| data.join("docroot").join("logs"))
            .ok_or_else(|| {
                DocrootError::logging("no data directory on this platform; set logging.log_dir")
            })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "docroot".to_string(),
            log_dir: None,
            level: LogLevel::default(),
        }
    }
}

/// Severity threshold, spelled as in the TOML file (`"Warn"`, `"Debug"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes the file.
pub struct LoggingGuard {
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

impl fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

/// Installs the global subscriber.
///
/// The file sink follows `config`. `verbose` adds a stderr sink filtered by
/// `RUST_LOG`, or `debug` when that is unset. The returned guard is `None`
/// when the file sink is off.
///
/// # Errors
///
/// Fails if the log directory cannot be created or another subscriber was
/// installed first.
pub fn init_logging(
    config: &LoggingConfig,
    verbose: bool,
) -> Result<Option<LoggingGuard>, DocrootError> {
    let mut guard = None;
    let file_sink = if config.enabled {
        let dir = config.directory()?;
        std::fs::create_dir_all(&dir).map_err(|e| {
            DocrootError::logging(format!("cannot create log directory {}: {e}", dir.display()))
        })?;

        let appender = tracing_appender::rolling::daily(&dir, format!("{}.log", config.app_name));
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard = Some(LoggingGuard { _worker: worker });
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::from(config.level)),
        )
    } else {
        None
    };

    let stderr_sink = verbose.then(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(file_sink)
        .with(stderr_sink)
        .try_init()
        .map_err(|e| DocrootError::logging(format!("subscriber already installed: {e}")))?;

    Ok(guard)
}
