//! Lexical gates run before the filesystem is consulted.
//!
//! Each gate is a total function: it either hands its input forward or
//! short-circuits with a [`RejectionReason`]. None of them allocate more than
//! one copy of the input, and the traversal check is a single pass over the
//! segments, so hostile inputs are handled in time linear in their length.

use super::RejectionReason;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Longest normalized relative path accepted, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

/// Rejects input containing a NUL character.
pub fn reject_nul(input: &str) -> Result<&str, RejectionReason> {
    if input.contains('\0') {
        return Err(RejectionReason::InvalidInput);
    }
    Ok(input)
}

/// Rejects input containing a URL scheme separator.
pub fn reject_scheme(input: &str) -> Result<&str, RejectionReason> {
    if input.contains("://") {
        return Err(RejectionReason::SchemeNotAllowed);
    }
    Ok(input)
}

/// Rejects input starting with a drive letter such as `C:`.
pub fn reject_drive_letter(input: &str) -> Result<&str, RejectionReason> {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(RejectionReason::WindowsAbsoluteNotAllowed);
    }
    Ok(input)
}

/// Rejects input starting with two separators (`\\server`, `//server`).
pub fn reject_unc(input: &str) -> Result<&str, RejectionReason> {
    let mut chars = input.chars();
    if let (Some(a), Some(b)) = (chars.next(), chars.next()) {
        if is_separator(a) && is_separator(b) {
            return Err(RejectionReason::UncNotAllowed);
        }
    }
    Ok(input)
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Rewrites backslashes to forward slashes.
///
/// Both conventions are accepted as separators on every host so that the
/// same input yields the same verdict everywhere.
#[must_use]
pub fn unify_separators(input: &str) -> Cow<'_, str> {
    if input.contains('\\') {
        Cow::Owned(input.replace('\\', "/"))
    } else {
        Cow::Borrowed(input)
    }
}

/// Collapses `.` and `..` segments of a relative path.
///
/// Leading, trailing and repeated separators are ignored. Returns
/// [`RejectionReason::PathTraversal`] as soon as a `..` would climb above the
/// starting point, and [`RejectionReason::InvalidInput`] if the normalized
/// result is longer than [`MAX_PATH_LEN`]. An empty result means "the base
/// directory itself".
pub fn normalize_relative(input: &str) -> Result<PathBuf, RejectionReason> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in input.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(RejectionReason::PathTraversal);
                }
            }
            other => segments.push(other),
        }
    }

    let len = segments.iter().map(|s| s.len() + 1).sum::<usize>();
    if len > MAX_PATH_LEN {
        return Err(RejectionReason::InvalidInput);
    }

    Ok(segments.iter().collect())
}

/// Collapses `.` and `..` segments of an absolute path without touching the
/// filesystem. `..` at the root stays at the root.
#[must_use]
pub fn normalize_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // PathBuf::pop refuses to remove the root.
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
