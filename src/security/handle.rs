//! Shared, swappable access to the active resolver.

use super::PathResolver;
use crate::error::DocrootError;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the active [`PathResolver`] behind a lock so the base directory can
/// be changed while requests are in flight.
///
/// Callers take one snapshot per request with [`current`](Self::current) and
/// use it for every resolution in that request. [`rebase`](Self::rebase)
/// builds the replacement before taking the write lock, so a failed rebase
/// leaves the old base active and readers never observe a half-built
/// resolver.
#[derive(Debug, Clone)]
pub struct SandboxHandle {
    inner: Arc<RwLock<Arc<PathResolver>>>,
}

impl SandboxHandle {
    /// Wraps an existing resolver.
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(resolver))),
        }
    }

    /// Builds a resolver for `base` and wraps it.
    ///
    /// # Errors
    ///
    /// See [`PathResolver::new`].
    pub fn open(base: impl AsRef<Path>) -> Result<Self, DocrootError> {
        PathResolver::new(base).map(Self::new)
    }

    /// Returns a snapshot of the active resolver.
    #[must_use]
    pub fn current(&self) -> Arc<PathResolver> {
        // The guarded value is a plain Arc swap; a poisoned lock still holds
        // a complete resolver.
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the active resolver with one rooted at `new_base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_base` is not an existing directory; the
    /// previous resolver stays active.
    pub fn rebase(&self, new_base: impl AsRef<Path>) -> Result<Arc<PathResolver>, DocrootError> {
        let fresh = Arc::new(PathResolver::new(new_base)?);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&fresh);
        tracing::info!(base = %fresh.base().display(), "sandbox rebased");
        Ok(fresh)
    }
}

impl From<PathResolver> for SandboxHandle {
    fn from(resolver: PathResolver) -> Self {
        Self::new(resolver)
    }
}
