//! A path that has passed every sandbox gate.

use std::ffi::OsStr;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// An absolute, canonical path known to be the base directory or inside it.
///
/// Only [`PathResolver`](super::PathResolver) can construct one. It is meant
/// to be consumed by the request that produced it and never cached: the
/// filesystem may change between requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: PathBuf,
}

impl ResolvedPath {
    pub(crate) fn new(absolute: PathBuf, relative: PathBuf) -> Self {
        Self { absolute, relative }
    }

    /// The absolute canonical path. Never show this to clients.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// The path relative to the base directory; empty for the base itself.
    #[inline]
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Returns true if this is the base directory itself.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    /// The sandbox-relative path in client form: `/` for the base, otherwise
    /// the relative path with forward slashes and no leading separator.
    #[must_use]
    pub fn display_relative(&self) -> String {
        if self.is_base() {
            return "/".to_string();
        }
        let parts: Vec<_> = self
            .relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        parts.join("/")
    }

    /// Consumes the value and returns the absolute path.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> PathBuf {
        self.absolute
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.absolute
    }
}

impl AsRef<Path> for ResolvedPath {
    #[inline]
    fn as_ref(&self) -> &Path {
        &self.absolute
    }
}

impl AsRef<OsStr> for ResolvedPath {
    #[inline]
    fn as_ref(&self) -> &OsStr {
        self.absolute.as_os_str()
    }
}

/// Displays the sandbox-relative form, so formatting a `ResolvedPath` into a
/// message cannot leak the base directory.
impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_relative())
    }
}
