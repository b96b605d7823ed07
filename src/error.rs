//! Operator-facing error type.
//!
//! These errors come from starting the service: a bad base directory, an
//! unreadable configuration file, logging that cannot be set up. They may
//! name paths and are meant for the operator's terminal or log file.
//! Per-request failures use [`GatewayError`](crate::gateway::GatewayError)
//! and [`RejectionReason`](crate::security::RejectionReason) instead, which
//! never carry paths.
//!
//! No external error crates (anyhow, thiserror, eyre) are used.

use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level error for docroot setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocrootError {
    /// The specific error that occurred
    pub kind: DocrootErrorKind,
}

/// Specific setup error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocrootErrorKind {
    /// The base directory does not exist or cannot be canonicalized
    BasePathMissing {
        /// The path as requested
        path: PathBuf,
        /// The underlying OS error
        reason: String,
    },
    /// The base path exists but is not a directory
    BasePathNotDirectory {
        /// The canonical path
        path: PathBuf,
    },
    /// Configuration was missing or invalid
    Configuration {
        /// The field or file that was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// File logging could not be initialized
    Logging {
        /// Why it failed
        reason: String,
    },
}

impl DocrootError {
    /// Creates a new DocrootError with the given kind.
    #[must_use]
    pub fn new(kind: DocrootErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a missing base path error.
    #[must_use]
    pub fn base_path_missing(path: &Path, reason: impl Into<String>) -> Self {
        Self::new(DocrootErrorKind::BasePathMissing {
            path: path.to_path_buf(),
            reason: reason.into(),
        })
    }

    /// Creates a base-path-is-not-a-directory error.
    #[must_use]
    pub fn base_path_not_directory(path: impl Into<PathBuf>) -> Self {
        Self::new(DocrootErrorKind::BasePathNotDirectory { path: path.into() })
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(DocrootErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates a logging initialization error.
    #[must_use]
    pub fn logging(reason: impl Into<String>) -> Self {
        Self::new(DocrootErrorKind::Logging {
            reason: reason.into(),
        })
    }

    /// Returns true if the base directory could not be used.
    #[must_use]
    pub fn is_base_path_error(&self) -> bool {
        matches!(
            self.kind,
            DocrootErrorKind::BasePathMissing { .. } | DocrootErrorKind::BasePathNotDirectory { .. }
        )
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, DocrootErrorKind::Configuration { .. })
    }

    /// Returns true if this is a logging error.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        matches!(self.kind, DocrootErrorKind::Logging { .. })
    }
}

impl fmt::Display for DocrootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DocrootErrorKind::BasePathMissing { path, reason } => {
                write!(
                    f,
                    "base path '{}' is not accessible: {}; create it or point base_path elsewhere",
                    path.display(),
                    reason
                )
            }
            DocrootErrorKind::BasePathNotDirectory { path } => {
                write!(
                    f,
                    "base path '{}' is not a directory; point base_path at a directory",
                    path.display()
                )
            }
            DocrootErrorKind::Configuration { field, reason } => {
                write!(f, "invalid configuration for '{}': {}", field, reason)
            }
            DocrootErrorKind::Logging { reason } => {
                write!(
                    f,
                    "failed to initialize logging: {}; check the log directory or disable file logging",
                    reason
                )
            }
        }
    }
}

impl std::error::Error for DocrootError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_missing_display() {
        let error = DocrootError::base_path_missing(Path::new("/srv/none"), "No such file");
        let message = error.to_string();
        assert!(message.contains("/srv/none"));
        assert!(message.contains("No such file"));
        assert!(error.is_base_path_error());
    }

    #[test]
    fn base_path_not_directory_display() {
        let error = DocrootError::base_path_not_directory("/srv/file.txt");
        assert!(error.to_string().contains("not a directory"));
        assert!(error.is_base_path_error());
        assert!(!error.is_configuration());
    }

    #[test]
    fn configuration_display() {
        let error = DocrootError::configuration("lines_per_page", "must be between 1 and 10000");
        let message = error.to_string();
        assert!(message.contains("lines_per_page"));
        assert!(message.contains("10000"));
        assert!(error.is_configuration());
        assert!(!error.is_base_path_error());
    }

    #[test]
    fn logging_display() {
        let error = DocrootError::logging("a subscriber is already set");
        assert!(error.to_string().contains("already set"));
        assert!(error.is_logging());
    }

    #[test]
    fn errors_are_clone_and_eq() {
        let error = DocrootError::configuration("a", "b");
        assert_eq!(error.clone(), error);
        assert_ne!(error, DocrootError::logging("b"));
    }
}
