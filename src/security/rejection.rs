//! Rejection reasons produced by the sandbox layer.
//!
//! Every value here is safe to surface to a client: none of them carry the
//! rejected input, the resolved path, or the base directory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a user-supplied path (or free-text input) was refused.
///
/// This is a closed set. Callers are expected to `match` on it, or collapse
/// it to a [`RejectionClass`] at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Absent input, non-string value, embedded NUL byte, or oversized input.
    InvalidInput,
    /// The input contains a URL scheme separator (`scheme://`).
    SchemeNotAllowed,
    /// The input starts with a drive letter (`C:`).
    WindowsAbsoluteNotAllowed,
    /// The input starts with a network-share prefix (`\\` or `//`).
    UncNotAllowed,
    /// The lexically normalized input climbs above the base directory.
    PathTraversal,
    /// The canonical path is not the base directory or a descendant of it.
    OutsideBase,
    /// A symbolic link on the path resolves outside the base directory.
    SymlinkEscape,
}

/// Coarse response category for a [`RejectionReason`].
///
/// The boundary layer should only reveal this class (plus, optionally, the
/// stable [`RejectionReason::code`]) to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionClass {
    /// The request was malformed.
    BadRequest,
    /// The request tried to reach outside the sandbox.
    AccessDenied,
}

impl RejectionReason {
    /// All variants, in pipeline order.
    pub const ALL: [RejectionReason; 7] = [
        Self::InvalidInput,
        Self::SchemeNotAllowed,
        Self::WindowsAbsoluteNotAllowed,
        Self::UncNotAllowed,
        Self::PathTraversal,
        Self::OutsideBase,
        Self::SymlinkEscape,
    ];

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::SchemeNotAllowed => "scheme_not_allowed",
            Self::WindowsAbsoluteNotAllowed => "windows_absolute_not_allowed",
            Self::UncNotAllowed => "unc_not_allowed",
            Self::PathTraversal => "path_traversal",
            Self::OutsideBase => "outside_base",
            Self::SymlinkEscape => "symlink_escape",
        }
    }

    /// Collapses the reason into the class a client is allowed to see.
    #[must_use]
    pub fn class(self) -> RejectionClass {
        match self {
            Self::InvalidInput => RejectionClass::BadRequest,
            Self::SchemeNotAllowed
            | Self::WindowsAbsoluteNotAllowed
            | Self::UncNotAllowed
            | Self::PathTraversal
            | Self::OutsideBase
            | Self::SymlinkEscape => RejectionClass::AccessDenied,
        }
    }

    /// HTTP status code the boundary layer should answer with.
    #[must_use]
    pub fn http_status(self) -> u16 {
        self.class().http_status()
    }

    /// Returns true if this reason indicates a sandbox escape attempt.
    #[must_use]
    pub fn is_escape_attempt(self) -> bool {
        self.class() == RejectionClass::AccessDenied
    }
}

impl RejectionClass {
    /// HTTP status code for this class.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::AccessDenied => 403,
        }
    }

    /// Generic client-facing message for this class.
    #[must_use]
    pub fn public_message(self) -> &'static str {
        match self {
            Self::BadRequest => "invalid request",
            Self::AccessDenied => "access denied",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => {
                write!(f, "input rejected; provide a non-empty string without control characters")
            }
            Self::SchemeNotAllowed => {
                write!(f, "URL schemes are not allowed; provide a path relative to the document root")
            }
            Self::WindowsAbsoluteNotAllowed => {
                write!(f, "drive-letter paths are not allowed; provide a path relative to the document root")
            }
            Self::UncNotAllowed => {
                write!(f, "network share paths are not allowed")
            }
            Self::PathTraversal => write!(f, "path traversal is not allowed"),
            Self::OutsideBase => write!(f, "path is outside the document root"),
            Self::SymlinkEscape => {
                write!(f, "symbolic link points outside the document root")
            }
        }
    }
}

impl fmt::Display for RejectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.public_message())
    }
}

impl std::error::Error for RejectionReason {}
