//! The sandbox path resolver.
//!
//! [`PathResolver`] turns an untrusted path string into a [`ResolvedPath`]
//! inside a fixed base directory, or a [`RejectionReason`]. The gates run in
//! a fixed order and each one short-circuits:
//!
//! 1. NUL byte
//! 2. URL scheme
//! 3. drive letter
//! 4. network share prefix
//! 5. absolute input (`/` is the base; other absolute paths must already
//!    live inside the base and are reinterpreted as relative)
//! 6. lexical traversal
//! 7. join and canonicalize
//! 8. containment
//! 9. symbolic links
//!
//! Gate 6 is a fast reject that never touches the filesystem. Gate 8 on the
//! canonical form is the authoritative check.

use super::lexical::{
    normalize_absolute, normalize_relative, reject_drive_letter, reject_nul, reject_scheme, reject_unc,
    unify_separators, MAX_PATH_LEN,
};
use super::{RejectionReason, ResolvedPath, SymlinkGuard};
use crate::error::DocrootError;
use serde_json::Value;
use soft_canonicalize::soft_canonicalize;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves user-supplied paths against an immutable base directory.
///
/// A resolver holds no mutable state, so one instance can be shared across
/// any number of concurrent requests. To change the base directory build a
/// new resolver and swap it in with [`SandboxHandle`](super::SandboxHandle).
///
/// # Example
///
/// ```rust,no_run
/// use docroot::security::{PathResolver, RejectionReason};
///
/// let resolver = PathResolver::new("/srv/docs")?;
///
/// let readme = resolver.resolve("docs/../README.md").expect("inside the base");
/// assert_eq!(readme.relative(), std::path::Path::new("README.md"));
///
/// assert_eq!(
///     resolver.resolve("../../etc/passwd").unwrap_err(),
///     RejectionReason::PathTraversal
/// );
/// # Ok::<(), docroot::error::DocrootError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
    guard: SymlinkGuard,
}

impl PathResolver {
    /// Creates a resolver rooted at `base`.
    ///
    /// The base is canonicalized once here.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` does not exist or is not a directory.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, DocrootError> {
        let requested = base.as_ref();
        let canonical = fs::canonicalize(requested)
            .map_err(|e| DocrootError::base_path_missing(requested, e.to_string()))?;

        if !canonical.is_dir() {
            return Err(DocrootError::base_path_not_directory(canonical));
        }

        tracing::info!(base = %canonical.display(), "path resolver ready");

        Ok(Self {
            guard: SymlinkGuard::new(canonical.clone()),
            base: canonical,
        })
    }

    /// The canonical base directory. Operator-facing only.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolves a user-supplied path.
    ///
    /// The empty string, `.` and `/` all resolve to the base directory.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectionReason`] of the first gate that refused the
    /// input.
    pub fn resolve(&self, input: &str) -> Result<ResolvedPath, RejectionReason> {
        let verdict = self.run_gates(input);
        match &verdict {
            Ok(path) => tracing::debug!(path = %path, "path accepted"),
            Err(reason) => tracing::warn!(reason = reason.code(), "path rejected"),
        }
        verdict
    }

    /// Resolves an optional input; `None` is [`RejectionReason::InvalidInput`].
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_opt(&self, input: Option<&str>) -> Result<ResolvedPath, RejectionReason> {
        match input {
            Some(s) => self.resolve(s),
            None => {
                tracing::warn!(reason = RejectionReason::InvalidInput.code(), "path missing");
                Err(RejectionReason::InvalidInput)
            }
        }
    }

    /// Resolves a decoded JSON value; anything but a string is
    /// [`RejectionReason::InvalidInput`].
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_value(&self, input: &Value) -> Result<ResolvedPath, RejectionReason> {
        self.resolve_opt(input.as_str())
    }

    fn run_gates(&self, input: &str) -> Result<ResolvedPath, RejectionReason> {
        let input = reject_nul(input)?;
        let input = reject_scheme(input)?;
        let input = reject_drive_letter(input)?;
        let input = reject_unc(input)?;

        let unified = unify_separators(input);
        let relative = if unified.starts_with('/') {
            self.absolute_remainder(&unified)?
        } else {
            normalize_relative(&unified)?
        };

        let joined = self.base.join(&relative);
        let canonical = self.join_canonical(&relative, &joined)?;
        let relative = self.containment(&canonical, &joined)?;
        self.guard.check(&canonical)?;

        Ok(ResolvedPath::new(canonical, relative))
    }

    /// Gate 5: reinterprets an absolute path that already lives in the base.
    fn absolute_remainder(&self, input: &str) -> Result<PathBuf, RejectionReason> {
        if input == "/" {
            return Ok(PathBuf::new());
        }

        let canonical = soft_canonicalize(&normalize_absolute(Path::new(input)))
            .map_err(|_| RejectionReason::OutsideBase)?;
        let rest = canonical
            .strip_prefix(&self.base)
            .map_err(|_| RejectionReason::OutsideBase)?;

        if rest.as_os_str().len() > MAX_PATH_LEN {
            return Err(RejectionReason::InvalidInput);
        }
        Ok(rest.to_path_buf())
    }

    /// Gate 7: canonicalizes the joined path through the OS.
    fn join_canonical(&self, relative: &Path, joined: &Path) -> Result<PathBuf, RejectionReason> {
        if relative.as_os_str().is_empty() {
            return Ok(self.base.clone());
        }
        soft_canonicalize(joined).map_err(|e| {
            tracing::debug!(error = %e, "canonicalization failed");
            self.escape_reason(joined)
        })
    }

    /// Gate 8: component-wise prefix check on the canonical form.
    fn containment(&self, canonical: &Path, joined: &Path) -> Result<PathBuf, RejectionReason> {
        canonical
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .map_err(|_| self.escape_reason(joined))
    }

    /// A link on the lexical path names the escape more precisely than a
    /// failed containment check.
    fn escape_reason(&self, joined: &Path) -> RejectionReason {
        match self.guard.check(joined) {
            Err(reason) => reason,
            Ok(()) => RejectionReason::OutsideBase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/subdirectory")).unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("README.md"), "# Test\n").unwrap();
        fs::write(root.join("docs/api.md"), "# API\n").unwrap();
        fs::write(root.join("docs/subdirectory/nested.md"), "# Nested\n").unwrap();
        fs::write(root.join("src/main.py"), "print('hi')\n").unwrap();
        let resolver = PathResolver::new(root).unwrap();
        (dir, resolver)
    }

    #[test]
    fn new_fails_for_missing_base() {
        let dir = TempDir::new().unwrap();
        let err = PathResolver::new(dir.path().join("missing")).unwrap_err();
        assert!(err.is_base_path_error());
    }

    #[test]
    fn new_fails_for_file_base() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = PathResolver::new(&file).unwrap_err();
        assert!(err.is_base_path_error());
    }

    #[test]
    fn root_aliases_resolve_to_base() {
        let (_dir, resolver) = fixture();
        for input in ["", "/", ".", "./", "docs/.."] {
            let resolved = resolver.resolve(input).unwrap();
            assert_eq!(resolved.as_path(), resolver.base(), "{input:?}");
            assert!(resolved.is_base());
        }
    }

    #[test]
    fn valid_relative_paths_resolve_inside_base() {
        let (_dir, resolver) = fixture();
        for input in [
            "README.md",
            "docs/api.md",
            "docs/subdirectory/nested.md",
            "src/main.py",
            "./README.md",
            "docs/./api.md",
            "docs/subdirectory/../api.md",
        ] {
            let resolved = resolver.resolve(input).unwrap();
            assert!(resolved.starts_with(resolver.base()), "{input}");
        }
    }

    #[test]
    fn safe_traversal_matches_direct_path() {
        let (_dir, resolver) = fixture();
        let via_docs = resolver.resolve("docs/../README.md").unwrap();
        let direct = resolver.resolve("README.md").unwrap();
        assert_eq!(via_docs, direct);
    }

    #[test]
    fn missing_files_inside_base_are_accepted() {
        let (_dir, resolver) = fixture();
        let resolved = resolver.resolve("docs/nonexistent.md").unwrap();
        assert_eq!(resolved.relative(), Path::new("docs/nonexistent.md"));
        assert!(resolver.resolve("readme.md").is_ok());
        assert!(resolver.resolve("文档.md").is_ok());
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, resolver) = fixture();
        for input in [
            "../../../etc/passwd",
            "../",
            "..",
            "..\\..\\..\\windows\\system32",
            "../..\\../etc\\passwd",
            "../nonexistent.md",
            "docs/../../secret",
        ] {
            assert_eq!(
                resolver.resolve(input),
                Err(RejectionReason::PathTraversal),
                "{input}"
            );
        }
    }

    #[test]
    fn scheme_unc_and_drive_have_stable_reasons() {
        let (_dir, resolver) = fixture();
        assert_eq!(
            resolver.resolve("file:///etc/passwd"),
            Err(RejectionReason::SchemeNotAllowed)
        );
        assert_eq!(
            resolver.resolve("\\\\server\\share"),
            Err(RejectionReason::UncNotAllowed)
        );
        assert_eq!(
            resolver.resolve("//server/share/file"),
            Err(RejectionReason::UncNotAllowed)
        );
        assert_eq!(
            resolver.resolve("C:\\Windows"),
            Err(RejectionReason::WindowsAbsoluteNotAllowed)
        );
    }

    #[test]
    fn nul_byte_smuggling_is_invalid_input() {
        let (_dir, resolver) = fixture();
        assert_eq!(
            resolver.resolve("safe.txt\0/../../etc/passwd"),
            Err(RejectionReason::InvalidInput)
        );
        assert_eq!(
            resolver.resolve("../../etc/passwd\0.txt"),
            Err(RejectionReason::InvalidInput)
        );
    }

    #[test]
    fn absent_or_non_string_input_is_invalid() {
        let (_dir, resolver) = fixture();
        assert_eq!(resolver.resolve_opt(None), Err(RejectionReason::InvalidInput));
        assert_eq!(
            resolver.resolve_value(&serde_json::json!(42)),
            Err(RejectionReason::InvalidInput)
        );
        assert!(resolver.resolve_value(&serde_json::json!("docs")).is_ok());
    }

    #[test]
    fn absolute_paths_outside_base_are_rejected() {
        let (_dir, resolver) = fixture();
        for input in ["/etc/passwd", "/proc/self/environ", "/root/.ssh/id_rsa", "/tmp"] {
            assert_eq!(
                resolver.resolve(input),
                Err(RejectionReason::OutsideBase),
                "{input}"
            );
        }
    }

    #[test]
    fn absolute_paths_inside_base_are_reinterpreted() {
        let (_dir, resolver) = fixture();
        let input = format!("{}/docs/api.md", resolver.base().display());
        let resolved = resolver.resolve(&input).unwrap();
        assert_eq!(resolved, resolver.resolve("docs/api.md").unwrap());

        let base_itself = resolver.base().display().to_string();
        assert!(resolver.resolve(&base_itself).unwrap().is_base());
    }

    #[test]
    fn sibling_with_common_prefix_is_outside() {
        let parent = TempDir::new().unwrap();
        let base = parent.path().join("user");
        let sibling = parent.path().join("user2");
        fs::create_dir(&base).unwrap();
        fs::create_dir(&sibling).unwrap();

        let resolver = PathResolver::new(&base).unwrap();
        let input = format!("{}/secret", fs::canonicalize(&sibling).unwrap().display());
        assert_eq!(resolver.resolve(&input), Err(RejectionReason::OutsideBase));
    }

    #[test]
    fn long_traversal_completes_quickly() {
        let (_dir, resolver) = fixture();
        let input = "../".repeat(10_000);
        let started = Instant::now();
        assert_eq!(resolver.resolve(&input), Err(RejectionReason::PathTraversal));
        assert!(started.elapsed() < Duration::from_secs(1));

        let absolute = format!("/{}", "../".repeat(10_000));
        assert!(resolver.resolve(&absolute).is_err());
    }

    #[test]
    fn normalized_input_yields_same_verdict() {
        let (_dir, resolver) = fixture();
        let pairs = [
            ("docs/./subdirectory/../api.md", "docs/api.md"),
            ("docs//api.md", "docs/api.md"),
            ("src/../src/main.py", "src/main.py"),
            ("docs/../../x", "../x"),
        ];
        for (raw, normalized) in pairs {
            assert_eq!(resolver.resolve(raw), resolver.resolve(normalized), "{raw}");
        }
    }

    #[test]
    fn every_accepted_path_is_contained() {
        let (_dir, resolver) = fixture();
        let inputs = [
            "", "/", "README.md", "../x", "/etc", "docs/../..", "．．／etc", "a/b/../../c",
            "docs\\subdirectory\\nested.md", "\u{202e}txt.md", "....//....//etc",
        ];
        for input in inputs {
            if let Ok(resolved) = resolver.resolve(input) {
                assert!(resolved.starts_with(resolver.base()), "{input:?}");
            }
        }
    }

    #[test]
    fn resolver_is_shareable_across_threads() {
        let (_dir, resolver) = fixture();
        let resolver = Arc::new(resolver);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || {
                    let ok = resolver.resolve("docs/api.md").is_ok();
                    let rejected = resolver.resolve(&format!("{}../etc", "../".repeat(i))).is_err();
                    ok && rejected
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[cfg(unix)]
    mod symlinks {
        use super::*;
        use std::os::unix::fs::symlink;

        #[test]
        fn internal_symlink_is_accepted() {
            let (_dir, resolver) = fixture();
            symlink(resolver.base().join("README.md"), resolver.base().join("link.md")).unwrap();

            let resolved = resolver.resolve("link.md").unwrap();
            assert_eq!(resolved.as_path(), resolver.base().join("README.md"));
        }

        #[test]
        fn symlink_to_existing_outside_dir_is_symlink_escape() {
            let (_dir, resolver) = fixture();
            let outside = TempDir::new().unwrap();
            fs::write(outside.path().join("secret.txt"), "secret").unwrap();
            symlink(outside.path(), resolver.base().join("escape")).unwrap();

            assert_eq!(
                resolver.resolve("escape/secret.txt"),
                Err(RejectionReason::SymlinkEscape)
            );
        }

        #[test]
        fn relative_link_climbing_out_is_symlink_escape() {
            let (_dir, resolver) = fixture();
            let outside = TempDir::new().unwrap();
            let target = fs::canonicalize(outside.path()).unwrap();
            let hops = resolver.base().components().count();
            let relative = Path::new(&"../".repeat(hops)).join(target.strip_prefix("/").unwrap());
            symlink(&relative, resolver.base().join("docs/up")).unwrap();

            assert_eq!(resolver.resolve("docs/up"), Err(RejectionReason::SymlinkEscape));
        }

        #[test]
        fn link_behind_unreadable_directory_is_rejected() {
            use std::os::unix::fs::PermissionsExt;

            let (_dir, resolver) = fixture();
            let locked = resolver.base().join("locked");
            fs::create_dir(&locked).unwrap();
            symlink("/etc/shadow", locked.join("l")).unwrap();
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o600)).unwrap();

            // Permission bits do not bind root.
            let readable = fs::symlink_metadata(locked.join("l")).is_ok();
            let verdict = resolver.resolve("locked/l");
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            if readable {
                return;
            }

            assert!(verdict.unwrap_err().is_escape_attempt());
        }

        #[test]
        fn dangling_symlink_outside_is_symlink_escape() {
            let (_dir, resolver) = fixture();
            symlink("/nonexistent/outside/file", resolver.base().join("dangling")).unwrap();

            assert_eq!(
                resolver.resolve("dangling"),
                Err(RejectionReason::SymlinkEscape)
            );
            assert_eq!(
                resolver.resolve("dangling/child.md"),
                Err(RejectionReason::SymlinkEscape)
            );
        }
    }
}
