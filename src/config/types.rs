//! Configuration types.

use crate::error::DocrootError;
use crate::gateway::{SearchOptions, DEFAULT_SHELL, MAX_LINES_PER_PAGE, MAX_SEARCH_LIMIT};
use crate::logging::LoggingConfig;
use crate::security::{ExtensionPolicy, SizePolicy, DEFAULT_MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable consulted for the base directory.
pub const BASE_PATH_ENV: &str = "DOCROOT_BASE_PATH";

/// Root configuration structure.
///
/// This structure maps directly to the TOML configuration file format:
///
/// ```toml
/// base_path = "/srv/docs"
/// max_file_size = 52428800
/// extra_extensions = ["adoc"]
/// lines_per_page = 1000
///
/// [search]
/// default_limit = 50
/// fuzzy_threshold = 0.7
///
/// [terminal]
/// shell = "/bin/bash"
///
/// [logging]
/// level = "Info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocrootConfig {
    /// Directory to serve. May also come from the command line or
    /// `DOCROOT_BASE_PATH`.
    pub base_path: Option<PathBuf>,

    /// Largest file the content endpoints serve, in bytes.
    pub max_file_size: u64,

    /// Extensions served in addition to the built-in list.
    pub extra_extensions: Vec<String>,

    /// Default page size for file content.
    pub lines_per_page: usize,

    /// Search defaults.
    pub search: SearchConfig,

    /// Terminal settings.
    pub terminal: TerminalConfig,

    /// File logging.
    pub logging: LoggingConfig,
}

impl Default for DocrootConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extra_extensions: Vec::new(),
            lines_per_page: 1000,
            search: SearchConfig::default(),
            terminal: TerminalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DocrootConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the file size limit.
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<(), DocrootError> {
        if !(1..=MAX_LINES_PER_PAGE).contains(&self.lines_per_page) {
            return Err(DocrootError::configuration(
                "lines_per_page",
                format!("must be between 1 and {MAX_LINES_PER_PAGE}"),
            ));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.search.default_limit) {
            return Err(DocrootError::configuration(
                "search.default_limit",
                format!("must be between 1 and {MAX_SEARCH_LIMIT}"),
            ));
        }
        if !(0.0..=1.0).contains(&self.search.fuzzy_threshold) {
            return Err(DocrootError::configuration(
                "search.fuzzy_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if let Some(bad) = self
            .extra_extensions
            .iter()
            .find(|e| e.trim_start_matches('.').is_empty() || e.contains(['/', '\\']))
        {
            return Err(DocrootError::configuration(
                "extra_extensions",
                format!("'{bad}' is not a file extension"),
            ));
        }
        if self.terminal.shell.as_os_str().is_empty() {
            return Err(DocrootError::configuration("terminal.shell", "must not be empty"));
        }
        Ok(())
    }

    /// Picks the base directory: `cli` first, then `DOCROOT_BASE_PATH`, then
    /// the file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if none of them is set.
    pub fn base_path(&self, cli: Option<&Path>) -> Result<PathBuf, DocrootError> {
        self.base_path_from(cli, std::env::var_os(BASE_PATH_ENV))
    }

    fn base_path_from(
        &self,
        cli: Option<&Path>,
        env: Option<OsString>,
    ) -> Result<PathBuf, DocrootError> {
        cli.map(Path::to_path_buf)
            .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| self.base_path.clone())
            .ok_or_else(|| {
                DocrootError::configuration(
                    "base_path",
                    format!("not set; pass --base-path, set {BASE_PATH_ENV}, or add base_path to the config file"),
                )
            })
    }

    /// The extension allow-list: defaults plus `extra_extensions`.
    #[must_use]
    pub fn extension_policy(&self) -> ExtensionPolicy {
        self.extra_extensions
            .iter()
            .fold(ExtensionPolicy::default(), |policy, ext| policy.with_extension(ext))
    }

    /// The size policy.
    #[must_use]
    pub fn size_policy(&self) -> SizePolicy {
        SizePolicy::new(self.max_file_size)
    }

    /// Default search options.
    #[must_use]
    pub fn search_defaults(&self) -> SearchOptions {
        SearchOptions::new()
            .with_limit(self.search.default_limit)
            .with_fuzzy(true, self.search.fuzzy_threshold)
    }
}

/// Search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit when none is given.
    pub default_limit: usize,
    /// Minimum filename score for fuzzy matches.
    pub fuzzy_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            fuzzy_threshold: 0.7,
        }
    }
}

/// Terminal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Shell started for terminal sessions.
    pub shell: PathBuf,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }
}
