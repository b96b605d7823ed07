//! Size and extension allow-lists consulted after a path is resolved.
//!
//! These narrow what the content endpoints will serve. They are not a
//! containment mechanism and never replace [`PathResolver`](super::PathResolver).

use std::collections::BTreeSet;
use std::path::Path;

/// Default byte ceiling: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Text, code and config extensions served by default (lowercase, no dot).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "mdx", "txt", "text", "rst", "adoc", "asciidoc", "org", "tex", "log",
    "csv", "tsv", "json", "jsonl", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "html",
    "htm", "css", "scss", "sass", "less", "svg", "js", "mjs", "cjs", "jsx", "ts", "tsx", "vue",
    "py", "pyi", "rb", "php", "pl", "lua", "sh", "bash", "zsh", "fish", "ps1", "bat", "rs",
    "go", "java", "kt", "kts", "scala", "swift", "c", "h", "cc", "cpp", "hpp", "cxx", "cs",
    "m", "r", "sql", "graphql", "proto", "cmake", "gradle", "lock",
    "properties", "example",
];

/// Byte-size ceiling for served files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    limit: u64,
}

impl SizePolicy {
    /// Creates a policy with the given inclusive limit in bytes.
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    /// Returns the limit in bytes.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Accepts `0 <= size <= limit`. Negative sizes are always rejected.
    #[must_use]
    pub fn check(&self, size: i64) -> bool {
        u64::try_from(size).is_ok_and(|size| size <= self.limit)
    }

    /// Same as [`check`](Self::check) for sizes already known to be unsigned,
    /// such as `Metadata::len`.
    #[must_use]
    pub fn check_len(&self, len: u64) -> bool {
        len <= self.limit
    }
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

/// Case-insensitive allow-list of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    allowed: BTreeSet<String>,
}

impl ExtensionPolicy {
    /// Creates a policy from the default extension list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy allowing exactly `extensions`.
    #[must_use]
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: extensions.into_iter().map(|e| normalize_ext(e.as_ref())).collect(),
        }
    }

    /// Adds an extension (with or without leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.allowed.insert(normalize_ext(extension.as_ref()));
        self
    }

    /// Returns the allowed extensions, lowercase and without dots.
    #[must_use]
    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    /// Checks a file name.
    ///
    /// Empty names are rejected. Names without an extension (`README`,
    /// `Makefile`, `.gitignore`) are accepted. Otherwise the last extension
    /// is looked up case-insensitively.
    #[must_use]
    pub fn check(&self, filename: &str) -> bool {
        if filename.is_empty() {
            return false;
        }
        match Path::new(filename).extension() {
            None => true,
            Some(ext) => self.allowed.contains(&ext.to_string_lossy().to_lowercase()),
        }
    }

    /// Checks the final component of a path; paths without one are rejected.
    #[must_use]
    pub fn check_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.check(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::from_extensions(DEFAULT_EXTENSIONS)
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}
