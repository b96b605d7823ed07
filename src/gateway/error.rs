//! Per-request gateway errors.
//!
//! A [`GatewayError`] is what a boundary turns into a response. Its
//! [`public_message`](GatewayError::public_message) and
//! [`http_status`](GatewayError::http_status) are safe to hand to a client;
//! they never contain a filesystem path or raw OS error text. Details worth
//! keeping go to the log when the error is created.

use crate::security::{RejectionReason, ResolvedPath};
use std::fmt;
use std::io;

/// Errors returned by [`DocumentService`](super::DocumentService) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    /// The specific error that occurred
    pub kind: GatewayErrorKind,
}

/// Specific gateway error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The path resolver refused the input
    Rejected(RejectionReason),
    /// The resolved path does not exist
    NotFound,
    /// A directory was required
    NotADirectory,
    /// A regular file was required
    NotAFile,
    /// The file exceeds the size policy
    TooLarge {
        /// The configured limit in bytes
        limit: u64,
    },
    /// The file type is not served (extension or binary content)
    UnsupportedType,
    /// A non-path argument was out of range or malformed
    InvalidArgument {
        /// The argument name
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// A filesystem operation failed
    Io {
        /// The error category, without paths
        reason: String,
    },
    /// A git command failed
    Git {
        /// What failed
        reason: String,
    },
}

impl GatewayError {
    /// Creates a new GatewayError with the given kind.
    #[must_use]
    pub fn new(kind: GatewayErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(reason: RejectionReason) -> Self {
        Self::new(GatewayErrorKind::Rejected(reason))
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(GatewayErrorKind::NotFound)
    }

    /// Creates a not-a-directory error.
    #[must_use]
    pub fn not_a_directory() -> Self {
        Self::new(GatewayErrorKind::NotADirectory)
    }

    /// Creates a not-a-file error.
    #[must_use]
    pub fn not_a_file() -> Self {
        Self::new(GatewayErrorKind::NotAFile)
    }

    /// Creates a too-large error.
    #[must_use]
    pub fn too_large(limit: u64) -> Self {
        Self::new(GatewayErrorKind::TooLarge { limit })
    }

    /// Creates an unsupported type error.
    #[must_use]
    pub fn unsupported_type() -> Self {
        Self::new(GatewayErrorKind::UnsupportedType)
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates a git error.
    #[must_use]
    pub fn git(reason: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Git {
            reason: reason.into(),
        })
    }

    /// Maps an I/O error on `path`.
    ///
    /// `NotFound` becomes [`GatewayErrorKind::NotFound`]. Anything else keeps
    /// only its category; the path and OS text are logged.
    #[must_use]
    pub fn io(err: &io::Error, path: &ResolvedPath) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            return Self::not_found();
        }
        tracing::warn!(path = %path, error = %err, "filesystem operation failed");
        Self::new(GatewayErrorKind::Io {
            reason: err.kind().to_string(),
        })
    }

    /// Returns true if the path resolver refused the input.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Rejected(_))
    }

    /// Returns the rejection reason, if this is a rejection.
    #[must_use]
    pub fn rejection(&self) -> Option<RejectionReason> {
        match self.kind {
            GatewayErrorKind::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns true if the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::NotFound)
    }

    /// The status code a boundary should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match &self.kind {
            GatewayErrorKind::Rejected(reason) => reason.http_status(),
            GatewayErrorKind::NotFound => 404,
            GatewayErrorKind::NotADirectory
            | GatewayErrorKind::NotAFile
            | GatewayErrorKind::InvalidArgument { .. } => 400,
            GatewayErrorKind::TooLarge { .. } => 413,
            GatewayErrorKind::UnsupportedType => 415,
            GatewayErrorKind::Io { .. } | GatewayErrorKind::Git { .. } => 500,
        }
    }

    /// A client-safe message: no paths, no OS error text.
    #[must_use]
    pub fn public_message(&self) -> String {
        match &self.kind {
            GatewayErrorKind::Rejected(reason) => reason.class().public_message().to_string(),
            GatewayErrorKind::NotFound => "not found".to_string(),
            GatewayErrorKind::NotADirectory => "not a directory".to_string(),
            GatewayErrorKind::NotAFile => "not a file".to_string(),
            GatewayErrorKind::TooLarge { limit } => {
                format!("file too large; maximum size is {} MiB", limit / (1024 * 1024))
            }
            GatewayErrorKind::UnsupportedType => "file type not supported".to_string(),
            GatewayErrorKind::InvalidArgument { field, reason } => {
                format!("invalid {field}: {reason}")
            }
            GatewayErrorKind::Io { .. } => "internal error".to_string(),
            GatewayErrorKind::Git { .. } => "git operation failed".to_string(),
        }
    }
}

impl From<RejectionReason> for GatewayError {
    fn from(reason: RejectionReason) -> Self {
        Self::rejected(reason)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GatewayErrorKind::Rejected(reason) => write!(f, "path rejected: {}", reason),
            GatewayErrorKind::NotFound => write!(f, "target not found"),
            GatewayErrorKind::NotADirectory => {
                write!(f, "target is not a directory; list a directory instead")
            }
            GatewayErrorKind::NotAFile => write!(f, "target is not a regular file"),
            GatewayErrorKind::TooLarge { limit } => {
                write!(f, "file exceeds the {} byte limit", limit)
            }
            GatewayErrorKind::UnsupportedType => {
                write!(f, "file type is not served; only text files are readable")
            }
            GatewayErrorKind::InvalidArgument { field, reason } => {
                write!(f, "invalid argument '{}': {}", field, reason)
            }
            GatewayErrorKind::Io { reason } => write!(f, "filesystem error: {}", reason),
            GatewayErrorKind::Git { reason } => write!(f, "git error: {}", reason),
        }
    }
}

impl std::error::Error for GatewayError {}
