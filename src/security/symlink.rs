//! Explicit symbolic-link escape check.
//!
//! Canonicalization already follows links that resolve, so in the common
//! case this guard finds nothing to do. It exists for the links that
//! canonicalization cannot follow: dangling links and link loops are left
//! verbatim in the soft-canonical path, and their targets are checked here.

use super::lexical::normalize_absolute;
use super::RejectionReason;
use soft_canonicalize::soft_canonicalize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum number of links followed for a single path.
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Verifies that no symbolic link on a resolved path points outside the base.
///
/// Rules:
/// - an absolute link target is never trusted
/// - a relative target is resolved against the link's parent directory and
///   must stay inside the base
/// - chains are followed up to [`MAX_SYMLINK_HOPS`] links
#[derive(Debug, Clone)]
pub struct SymlinkGuard {
    base: PathBuf,
}

impl SymlinkGuard {
    /// Creates a guard for the given canonical base directory.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Returns the base directory this guard protects.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Checks `resolved` and every ancestor below the base.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::SymlinkEscape`] if any link escapes or the
    /// chain is too long. A component that cannot be inspected for any reason
    /// other than not existing also counts as an escape.
    pub fn check(&self, resolved: &Path) -> Result<(), RejectionReason> {
        let mut pending = vec![resolved.to_path_buf()];
        let mut hops = 0usize;

        while let Some(path) = pending.pop() {
            for ancestor in path
                .ancestors()
                .take_while(|a| *a != self.base && a.starts_with(&self.base))
            {
                let is_link = match fs::symlink_metadata(ancestor) {
                    Ok(meta) => meta.file_type().is_symlink(),
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                        ) =>
                    {
                        false
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot inspect path component");
                        return Err(RejectionReason::SymlinkEscape);
                    }
                };
                if !is_link {
                    continue;
                }

                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    tracing::warn!(hops, "symlink chain too long");
                    return Err(RejectionReason::SymlinkEscape);
                }

                let next = self.follow(ancestor)?;
                pending.push(next);
            }
        }

        Ok(())
    }

    /// Resolves one link and confirms its target stays inside the base.
    fn follow(&self, link: &Path) -> Result<PathBuf, RejectionReason> {
        let target = fs::read_link(link).map_err(|_| RejectionReason::SymlinkEscape)?;
        if target.is_absolute() {
            return Err(RejectionReason::SymlinkEscape);
        }

        let parent = link.parent().unwrap_or(&self.base);
        let joined = normalize_absolute(&parent.join(&target));
        let resolved = soft_canonicalize(&joined).map_err(|_| RejectionReason::SymlinkEscape)?;

        if resolved.starts_with(&self.base) {
            Ok(resolved)
        } else {
            Err(RejectionReason::SymlinkEscape)
        }
    }
}
