//! Filesystem operations behind the path sandbox.
//!
//! [`DocumentService`] is the single entry point. Each operation takes the
//! raw, user-supplied path string, snapshots the active resolver once,
//! resolves, and from then on touches only the [`ResolvedPath`]. Nothing in
//! this module builds a filesystem path from user input any other way.
//!
//! # Example
//!
//! ```rust,no_run
//! use docroot::gateway::{DocumentService, ListOptions};
//! use docroot::security::SandboxHandle;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DocumentService::new(SandboxHandle::open("/srv/docs")?);
//!
//! let listing = service.list_directory("docs", ListOptions::new()).await?;
//! let page = service.read_page("README.md", 1, None).await?;
//!
//! // Escapes are refused before anything is read.
//! assert!(service.read_page("../../etc/passwd", 1, None).await.is_err());
//! # Ok(())
//! # }
//! ```

mod content;
mod error;
mod fuzzy;
mod git;
mod listing;
mod search;
mod terminal;

pub use content::{looks_binary, FileContentPage, FileMetadata, MAX_LINES_PER_PAGE};
pub use error::{GatewayError, GatewayErrorKind};
pub use fuzzy::{filename_score, match_score, split_words};
pub use git::{
    is_valid_commit, ChangeSet, CommitInfo, FileDiff, FileState, FileStatus, GitInfo,
    GitRepository, MAX_HISTORY,
};
pub use listing::{DirectoryListing, EntryKind, FileItem, ListOptions, SortBy, SortOrder};
pub use search::{
    MatchType, SearchHit, SearchKind, SearchOptions, SearchResults, MAX_SEARCH_LIMIT,
};
pub use terminal::{TerminalLauncher, DEFAULT_SHELL};

use crate::config::DocrootConfig;
use crate::error::DocrootError;
use crate::security::{
    ExtensionPolicy, InputSanitizer, PathResolver, ResolvedPath, SandboxHandle, SizePolicy,
};
use search::SearchJob;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;

/// Sandboxed document operations.
///
/// Cheap to clone; clones share the same [`SandboxHandle`].
#[derive(Debug, Clone)]
pub struct DocumentService {
    sandbox: SandboxHandle,
    extensions: ExtensionPolicy,
    sizes: SizePolicy,
    sanitizer: InputSanitizer,
    lines_per_page: usize,
    search_defaults: SearchOptions,
    terminal: TerminalLauncher,
}

impl DocumentService {
    /// Creates a service with default policies.
    #[must_use]
    pub fn new(sandbox: SandboxHandle) -> Self {
        Self {
            sandbox,
            extensions: ExtensionPolicy::default(),
            sizes: SizePolicy::default(),
            sanitizer: InputSanitizer::default(),
            lines_per_page: 1000,
            search_defaults: SearchOptions::default(),
            terminal: TerminalLauncher::default(),
        }
    }

    /// Creates a service from configuration.
    ///
    /// `base` overrides the configured base directory; see
    /// [`DocrootConfig::base_path`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the base directory
    /// is unusable.
    pub fn from_config(config: &DocrootConfig, base: Option<&std::path::Path>) -> Result<Self, DocrootError> {
        config.validate()?;
        let sandbox = SandboxHandle::open(config.base_path(base)?)?;
        Ok(Self::new(sandbox)
            .with_extension_policy(config.extension_policy())
            .with_size_policy(config.size_policy())
            .with_lines_per_page(config.lines_per_page)
            .with_search_defaults(config.search_defaults())
            .with_terminal(TerminalLauncher::new(&config.terminal.shell)))
    }

    /// Sets the extension allow-list.
    #[must_use]
    pub fn with_extension_policy(mut self, extensions: ExtensionPolicy) -> Self {
        self.extensions = extensions;
        self
    }

    /// Sets the size limit.
    #[must_use]
    pub fn with_size_policy(mut self, sizes: SizePolicy) -> Self {
        self.sizes = sizes;
        self
    }

    /// Sets the default page size.
    #[must_use]
    pub fn with_lines_per_page(mut self, lines_per_page: usize) -> Self {
        self.lines_per_page = lines_per_page;
        self
    }

    /// Sets the defaults returned by [`search_options`](Self::search_options).
    #[must_use]
    pub fn with_search_defaults(mut self, options: SearchOptions) -> Self {
        self.search_defaults = options;
        self
    }

    /// Sets the terminal launcher.
    #[must_use]
    pub fn with_terminal(mut self, terminal: TerminalLauncher) -> Self {
        self.terminal = terminal;
        self
    }

    /// The shared resolver handle.
    #[must_use]
    pub fn sandbox(&self) -> &SandboxHandle {
        &self.sandbox
    }

    /// Configured search defaults, to be adjusted per request.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        self.search_defaults.clone()
    }

    /// Resolves `path` against a fresh snapshot of the resolver.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayErrorKind::Rejected`] if the resolver refuses it.
    pub fn resolve(&self, path: &str) -> Result<ResolvedPath, GatewayError> {
        Ok(self.sandbox.current().resolve(path)?)
    }

    /// Lists a directory.
    ///
    /// # Errors
    ///
    /// Rejected paths, missing targets and non-directories are errors.
    pub async fn list_directory(
        &self,
        path: &str,
        options: ListOptions,
    ) -> Result<DirectoryListing, GatewayError> {
        let dir = self.resolve(path)?;
        listing::list(&dir, options).await
    }

    /// Reads one page of a text file. `lines_per_page` defaults to the
    /// configured page size.
    ///
    /// # Errors
    ///
    /// Rejected paths, non-files, unsupported or oversized files and
    /// out-of-range paging arguments are errors.
    pub async fn read_page(
        &self,
        path: &str,
        page: usize,
        lines_per_page: Option<usize>,
    ) -> Result<FileContentPage, GatewayError> {
        let lines_per_page = lines_per_page.unwrap_or(self.lines_per_page);
        let file = self.resolve(path)?;
        content::read_page(&file, page, lines_per_page, &self.extensions, &self.sizes).await
    }

    /// Returns file or directory metadata.
    ///
    /// # Errors
    ///
    /// Rejected paths and missing targets are errors.
    pub async fn file_info(&self, path: &str) -> Result<FileMetadata, GatewayError> {
        let target = self.resolve(path)?;
        content::file_info(&target, &self.extensions, &self.sizes).await
    }

    /// Searches file names and contents.
    ///
    /// The query is free text and is only sanitized; `options.scope` is a
    /// path and is resolved like any other.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or oversized query, out-of-range
    /// options, or a rejected or non-directory scope.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SearchResults, GatewayError> {
        let query = self.sanitizer.sanitize(query)?;
        if query.trim().is_empty() {
            return Err(GatewayError::invalid_argument("q", "must not be empty"));
        }
        options.validate()?;

        let resolver = self.sandbox.current();
        let scope = resolver.resolve(options.scope.as_deref().unwrap_or(""))?;
        let metadata = tokio::fs::metadata(scope.as_path())
            .await
            .map_err(|e| GatewayError::io(&e, &scope))?;
        if !metadata.is_dir() {
            return Err(GatewayError::not_a_directory());
        }

        let started = Instant::now();
        let fuzzy_enabled = options.fuzzy;
        let fuzzy_threshold = options.fuzzy_threshold;
        let job = SearchJob {
            query: query.clone(),
            base: resolver.base().to_path_buf(),
            scope,
            options,
            extensions: self.extensions.clone(),
            sizes: self.sizes,
        };

        let results = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "search task failed");
                GatewayError::new(GatewayErrorKind::Io {
                    reason: "search task failed".to_string(),
                })
            })?;

        let search_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(hits = results.len(), search_time_ms, "search finished");

        Ok(SearchResults {
            query,
            total_results: results.len(),
            results,
            search_time_ms,
            fuzzy_enabled,
            fuzzy_threshold,
        })
    }

    /// Git queries bound to the current base directory.
    #[must_use]
    pub fn git(&self) -> GitRepository {
        GitRepository::new(self.sandbox.current().base())
    }

    /// Repository summary for the base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be run.
    pub async fn git_info(&self) -> Result<GitInfo, GatewayError> {
        self.git().info().await
    }

    /// Git status of one file.
    ///
    /// # Errors
    ///
    /// Rejected paths and git failures are errors.
    pub async fn git_status(&self, path: &str) -> Result<FileStatus, GatewayError> {
        let (repo, file) = self.git_target(path)?;
        repo.file_status(&file).await
    }

    /// Commit history of one file.
    ///
    /// # Errors
    ///
    /// Rejected paths, an out-of-range limit and git failures are errors.
    pub async fn git_history(&self, path: &str, limit: usize) -> Result<Vec<CommitInfo>, GatewayError> {
        let (repo, file) = self.git_target(path)?;
        repo.file_history(&file, limit).await
    }

    /// Diff of one file.
    ///
    /// # Errors
    ///
    /// Rejected paths, malformed commits and git failures are errors.
    pub async fn git_diff(&self, path: &str, commit: Option<&str>) -> Result<FileDiff, GatewayError> {
        let (repo, file) = self.git_target(path)?;
        repo.file_diff(&file, commit).await
    }

    /// Changed files below the base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the base is not a repository or git fails.
    pub async fn git_changes(&self) -> Result<ChangeSet, GatewayError> {
        self.git().changes().await
    }

    /// Prepares a shell started in `path` (the base directory by default).
    ///
    /// # Errors
    ///
    /// Rejected paths and non-directories are errors.
    pub async fn terminal(&self, path: Option<&str>) -> Result<Command, GatewayError> {
        let dir = self.resolve(path.unwrap_or(""))?;
        self.terminal.prepare(&dir).await
    }

    /// Resolves a file and binds git to the same resolver snapshot.
    fn git_target(&self, path: &str) -> Result<(GitRepository, ResolvedPath), GatewayError> {
        let resolver: Arc<PathResolver> = self.sandbox.current();
        let file = resolver.resolve(path)?;
        Ok((GitRepository::new(resolver.base()), file))
    }
}
