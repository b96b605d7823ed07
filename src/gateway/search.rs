//! Filename and content search.
//!
//! The walk runs on the blocking pool. It never follows symbolic links and
//! skips hidden entries, so it cannot leave the scope directory it was given.

use super::content::{looks_binary, SNIFF_LEN};
use super::fuzzy::filename_score;
use super::GatewayError;
use crate::security::{ExtensionPolicy, ResolvedPath, SizePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::{DirEntry, WalkDir};

/// Largest accepted result limit.
pub const MAX_SEARCH_LIMIT: usize = 200;

/// Score given to every content match.
const CONTENT_SCORE: f64 = 0.8;

/// Maximum snippet length in characters.
const SNIPPET_CHARS: usize = 100;

/// What to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// File names only
    Filename,
    /// File contents only
    Content,
    /// Both
    #[default]
    Both,
}

impl SearchKind {
    fn names(self) -> bool {
        matches!(self, Self::Filename | Self::Both)
    }

    fn contents(self) -> bool {
        matches!(self, Self::Content | Self::Both)
    }
}

impl FromStr for SearchKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filename" => Ok(Self::Filename),
            "content" => Ok(Self::Content),
            "both" => Ok(Self::Both),
            _ => Err(GatewayError::invalid_argument(
                "type",
                "expected one of filename, content, both",
            )),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Filename => "filename",
            Self::Content => "content",
            Self::Both => "both",
        })
    }
}

/// Where a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// The file name matched
    Filename,
    /// A line of the file matched
    Content,
}

/// Options for [`DocumentService::search`](super::DocumentService::search).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// What to search
    pub kind: SearchKind,
    /// Directory to search in, as a user-supplied path; `None` is the base
    pub scope: Option<String>,
    /// Only consider files with these extensions (empty means all)
    pub extensions: Vec<String>,
    /// Maximum number of results, `1..=200`
    pub limit: usize,
    /// Allow edit-distance filename matches
    pub fuzzy: bool,
    /// Minimum filename score, `0.0..=1.0`
    pub fuzzy_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            kind: SearchKind::Both,
            scope: None,
            extensions: Vec::new(),
            limit: 50,
            fuzzy: true,
            fuzzy_threshold: 0.7,
        }
    }
}

impl SearchOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what to search.
    #[must_use]
    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Restricts the search to a directory.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Restricts the search to the given extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Enables or disables fuzzy filename matching and sets its threshold.
    #[must_use]
    pub fn with_fuzzy(mut self, fuzzy: bool, threshold: f64) -> Self {
        self.fuzzy = fuzzy;
        self.fuzzy_threshold = threshold;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.limit == 0 || self.limit > MAX_SEARCH_LIMIT {
            return Err(GatewayError::invalid_argument(
                "limit",
                format!("must be between 1 and {MAX_SEARCH_LIMIT}"),
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(GatewayError::invalid_argument(
                "fuzzy_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Sandbox-relative path of the file
    pub path: String,
    /// What matched
    pub match_type: MatchType,
    /// Relevance in `0.0..=1.0`
    pub score: f64,
    /// The matching line, trimmed and shortened (content hits)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// 1-indexed line number (content hits)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

/// Search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The sanitized query
    pub query: String,
    /// Hits, best first
    pub results: Vec<SearchHit>,
    /// Number of hits returned
    pub total_results: usize,
    /// Wall time spent searching
    pub search_time_ms: u64,
    /// Whether fuzzy matching was enabled
    pub fuzzy_enabled: bool,
    /// The filename score threshold used
    pub fuzzy_threshold: f64,
}

/// Everything the blocking walk needs, owned.
pub(crate) struct SearchJob {
    pub(crate) query: String,
    pub(crate) base: PathBuf,
    pub(crate) scope: ResolvedPath,
    pub(crate) options: SearchOptions,
    pub(crate) extensions: ExtensionPolicy,
    pub(crate) sizes: SizePolicy,
}

impl SearchJob {
    /// Walks the scope and returns at most one hit per file, sorted by score
    /// and truncated to the limit.
    pub(crate) fn run(self) -> Vec<SearchHit> {
        let needle = self.query.to_lowercase();
        let mut hits = Vec::new();

        let walker = WalkDir::new(self.scope.as_path())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(Result::ok);

        for entry in walker {
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.extension_selected(entry.path()) {
                continue;
            }
            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };

            let name_score = if self.options.kind.names() {
                let score = self.name_score(entry.path());
                (score > 0.0 && score >= self.options.fuzzy_threshold).then_some(score)
            } else {
                None
            };
            let line = if self.options.kind.contents() {
                self.first_matching_line(&entry, &needle)
            } else {
                None
            };

            if let Some(hit) = merge(relative, name_score, line) {
                hits.push(hit);
            }
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.options.limit);
        hits
    }

    /// Returns the 1-based number and text of the first line containing
    /// `needle`. Reading stops at that line.
    fn first_matching_line(&self, entry: &DirEntry, needle: &str) -> Option<(usize, String)> {
        if !self.extensions.check_path(entry.path()) {
            return None;
        }
        let len = entry.metadata().ok()?.len();
        if !self.sizes.check_len(len) {
            return None;
        }

        let mut file = File::open(entry.path()).ok()?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .ok()?;
        if looks_binary(&head) {
            return None;
        }

        let reader = BufReader::new(Cursor::new(head).chain(file));
        for (idx, raw) in reader.split(b'\n').enumerate() {
            let raw = raw.ok()?;
            let line = String::from_utf8_lossy(&raw);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.to_lowercase().contains(needle) {
                return Some((idx + 1, line.to_string()));
            }
        }
        None
    }

    /// Best of the full name and the name without its extension.
    fn name_score(&self, path: &Path) -> f64 {
        let fuzzy = self.options.fuzzy;
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let full = filename_score(&self.query, &name, fuzzy);
        match path.file_stem().map(|s| s.to_string_lossy()) {
            Some(stem) if stem != name => full.max(filename_score(&self.query, &stem, fuzzy)),
            _ => full,
        }
    }

    fn extension_selected(&self, path: &Path) -> bool {
        if self.options.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.options.extensions.contains(&ext))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.base).ok()?;
        Some(
            rest.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Folds the filename and content matches of one file into a single hit.
///
/// The higher score decides the match type; a content score only wins when
/// it is strictly higher. The first matching line is kept as the snippet
/// either way.
fn merge(path: String, name_score: Option<f64>, line: Option<(usize, String)>) -> Option<SearchHit> {
    let (match_type, score) = match (name_score, &line) {
        (Some(name), Some(_)) if CONTENT_SCORE > name => (MatchType::Content, CONTENT_SCORE),
        (Some(name), _) => (MatchType::Filename, name),
        (None, Some(_)) => (MatchType::Content, CONTENT_SCORE),
        (None, None) => return None,
    };
    let (line_number, snippet) = match line {
        Some((number, text)) => (Some(number), Some(snippet(&text))),
        None => (None, None),
    };
    Some(SearchHit {
        path,
        match_type,
        score,
        snippet,
        line_number,
    })
}

fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(SNIPPET_CHARS).collect()
    }
}
