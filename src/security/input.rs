//! Free-text input sanitization (search queries and the like).
//!
//! Path strings never go through here; they go through
//! [`PathResolver`](super::PathResolver).

use super::RejectionReason;
use serde_json::Value;

/// Default maximum length of a sanitized input, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1000;

/// Boundary guard for free-text inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSanitizer {
    max_chars: usize,
}

impl InputSanitizer {
    /// Creates a sanitizer with the default 1000-character limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom length limit.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Returns the configured length limit.
    #[must_use]
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Strips NUL bytes and enforces the length limit.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::InvalidInput`] if the input is longer than
    /// the limit after stripping.
    pub fn sanitize(&self, raw: &str) -> Result<String, RejectionReason> {
        let sanitized: String = raw.chars().filter(|&c| c != '\0').collect();
        if sanitized.chars().count() > self.max_chars {
            tracing::warn!(
                reason = RejectionReason::InvalidInput.code(),
                limit = self.max_chars,
                "input too long"
            );
            return Err(RejectionReason::InvalidInput);
        }
        Ok(sanitized)
    }

    /// Sanitizes a decoded JSON value; non-strings are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::InvalidInput`] for non-string values, or
    /// anything [`sanitize`](Self::sanitize) rejects.
    pub fn sanitize_value(&self, raw: &Value) -> Result<String, RejectionReason> {
        match raw {
            Value::String(s) => self.sanitize(s),
            _ => Err(RejectionReason::InvalidInput),
        }
    }
}

impl Default for InputSanitizer {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}
