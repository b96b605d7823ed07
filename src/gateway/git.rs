//! Read-only git queries scoped to the base directory.
//!
//! Every command runs with the base directory as its working directory and
//! receives file arguments only as sandbox-relative paths after `--`, so a
//! path can never be read as an option.

use super::GatewayError;
use crate::security::ResolvedPath;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Commit references accepted by [`GitRepository::file_diff`].
static COMMIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{4,40}$|^HEAD(~[0-9]{1,4})?$").expect("commit regex is valid")
});

/// Upper bound on a single git invocation.
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted history limit.
pub const MAX_HISTORY: usize = 100;

const FIELD_SEP: char = '\u{1f}';

/// Returns true if `commit` is an accepted commit reference.
#[must_use]
pub fn is_valid_commit(commit: &str) -> bool {
    COMMIT_REGEX.is_match(commit)
}

/// Repository summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Whether the base directory is inside a work tree
    pub is_repo: bool,
    /// Current branch name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Full hash of HEAD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// URL of the `origin` remote
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// Working-tree state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    /// Tracked and unchanged (or ignored)
    Clean,
    /// Changed in the index or work tree
    Modified,
    /// Newly added to the index
    Added,
    /// Deleted
    Deleted,
    /// Renamed or copied
    Renamed,
    /// Not tracked
    Untracked,
    /// Unmerged or otherwise unrecognized
    Conflicted,
}

/// Status of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Sandbox-relative path
    pub path: String,
    /// State
    pub status: FileState,
    /// Whether the change is staged
    pub staged: bool,
}

/// One commit of a file's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full hash
    pub hash: String,
    /// Abbreviated hash
    pub short_hash: String,
    /// Author name
    pub author: String,
    /// Author email
    pub email: String,
    /// Author date (ISO 8601)
    pub date: String,
    /// Subject line
    pub message: String,
}

/// A diff of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Sandbox-relative path
    pub path: String,
    /// The commit compared against; `None` means the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Unified diff text
    pub diff: String,
}

/// Changed files below the base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Current branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// True if nothing below the base has changed
    pub clean: bool,
    /// Modified files
    pub modified: Vec<String>,
    /// Added files
    pub added: Vec<String>,
    /// Deleted files
    pub deleted: Vec<String>,
    /// Renamed files (new name)
    pub renamed: Vec<String>,
    /// Untracked files
    pub untracked: Vec<String>,
}

/// Git queries bound to one base directory.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Binds to a canonical base directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory commands run in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Summarizes the repository. Outside a work tree this is
    /// `is_repo: false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be started.
    pub async fn info(&self) -> Result<GitInfo, GatewayError> {
        let inside = self.try_run(&["rev-parse", "--is-inside-work-tree"]).await?;
        if inside.as_deref().map(str::trim) != Some("true") {
            return Ok(GitInfo {
                is_repo: false,
                branch: None,
                commit: None,
                remote_url: None,
            });
        }

        let branch = self
            .try_run(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let commit = self
            .try_run(&["rev-parse", "HEAD"])
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let remote_url = self
            .try_run(&["config", "--get", "remote.origin.url"])
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(GitInfo {
            is_repo: true,
            branch,
            commit,
            remote_url,
        })
    }

    /// Status of a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the base is not a repository or git fails.
    pub async fn file_status(&self, file: &ResolvedPath) -> Result<FileStatus, GatewayError> {
        let out = self
            .run_with_path(&["status", "--porcelain=v1", "-z"], file)
            .await?;
        let entry = parse_porcelain(&out).into_iter().next();

        let (status, staged) = match entry {
            Some(entry) => (entry.state, entry.staged),
            None => (FileState::Clean, false),
        };
        Ok(FileStatus {
            path: file.display_relative(),
            status,
            staged,
        })
    }

    /// Up to `limit` commits touching a file, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is out of range, the base is not a
    /// repository, or git fails.
    pub async fn file_history(
        &self,
        file: &ResolvedPath,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, GatewayError> {
        if limit == 0 || limit > MAX_HISTORY {
            return Err(GatewayError::invalid_argument(
                "limit",
                format!("must be between 1 and {MAX_HISTORY}"),
            ));
        }
        let max_count = format!("--max-count={limit}");
        let format = "--format=%H%x1f%h%x1f%an%x1f%ae%x1f%aI%x1f%s";
        let out = self
            .run_with_path(&["log", max_count.as_str(), format], file)
            .await?;
        Ok(parse_log(&out))
    }

    /// Diff of a file against `commit`, or of the work tree against the
    /// index when `commit` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayErrorKind::InvalidArgument`](super::GatewayErrorKind::InvalidArgument)
    /// for a malformed commit, or an error if git fails.
    pub async fn file_diff(
        &self,
        file: &ResolvedPath,
        commit: Option<&str>,
    ) -> Result<FileDiff, GatewayError> {
        let diff = match commit {
            Some(commit) => {
                if !is_valid_commit(commit) {
                    return Err(GatewayError::invalid_argument(
                        "commit",
                        "expected a hex hash or HEAD~N",
                    ));
                }
                self.run_with_path(&["diff", "--no-color", commit], file).await?
            }
            None => self.run_with_path(&["diff", "--no-color"], file).await?,
        };

        Ok(FileDiff {
            path: file.display_relative(),
            commit: commit.map(str::to_string),
            diff,
        })
    }

    /// Every changed file below the base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the base is not a repository or git fails.
    pub async fn changes(&self) -> Result<ChangeSet, GatewayError> {
        let prefix = self.run(&["rev-parse", "--show-prefix"]).await?;
        let prefix = prefix.trim_end_matches(['\n', '\r']);
        let out = self
            .run(&["status", "--porcelain=v1", "-z", "--branch", "--", "."])
            .await?;
        let mut changes = ChangeSet {
            branch: parse_branch(&out),
            ..ChangeSet::default()
        };

        for entry in parse_porcelain(&out) {
            let Some(path) = entry.path.strip_prefix(prefix) else {
                continue;
            };
            let path = path.to_string();
            match entry.state {
                FileState::Modified | FileState::Conflicted => changes.modified.push(path),
                FileState::Added => changes.added.push(path),
                FileState::Deleted => changes.deleted.push(path),
                FileState::Renamed => changes.renamed.push(path),
                FileState::Untracked => changes.untracked.push(path),
                FileState::Clean => {}
            }
        }

        changes.clean = changes.modified.is_empty()
            && changes.added.is_empty()
            && changes.deleted.is_empty()
            && changes.renamed.is_empty()
            && changes.untracked.is_empty();
        Ok(changes)
    }

    async fn run_with_path(&self, args: &[&str], file: &ResolvedPath) -> Result<String, GatewayError> {
        let relative: &OsStr = if file.is_base() {
            OsStr::new(".")
        } else {
            file.relative().as_os_str()
        };
        let mut full: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        full.push(OsStr::new("--"));
        full.push(relative);
        self.exec(&full).await?.ok_or_else(|| GatewayError::git("not a git repository"))
    }

    async fn run(&self, args: &[&str]) -> Result<String, GatewayError> {
        self.try_run(args)
            .await?
            .ok_or_else(|| GatewayError::git("not a git repository"))
    }

    /// Runs git; `Ok(None)` means it exited unsuccessfully.
    async fn try_run(&self, args: &[&str]) -> Result<Option<String>, GatewayError> {
        let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        self.exec(&args).await
    }

    async fn exec(&self, args: &[&OsStr]) -> Result<Option<String>, GatewayError> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(GIT_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to run git");
                return Err(GatewayError::git("git is not available"));
            }
            Err(_) => {
                tracing::warn!(timeout_secs = GIT_TIMEOUT.as_secs(), "git timed out");
                return Err(GatewayError::git("git timed out"));
            }
        };

        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }

        tracing::debug!(
            status = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git exited unsuccessfully"
        );
        Ok(None)
    }
}

/// One record of `git status --porcelain=v1 -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PorcelainEntry {
    path: String,
    state: FileState,
    staged: bool,
}

fn classify(index: char, worktree: char) -> FileState {
    match (index, worktree) {
        ('?', '?') => FileState::Untracked,
        ('!', '!') => FileState::Clean,
        ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => FileState::Conflicted,
        ('R', _) | ('C', _) => FileState::Renamed,
        ('A', _) => FileState::Added,
        ('D', _) | (_, 'D') => FileState::Deleted,
        ('M', _) | (_, 'M') | ('T', _) | (_, 'T') => FileState::Modified,
        _ => FileState::Conflicted,
    }
}

fn parse_porcelain(out: &str) -> Vec<PorcelainEntry> {
    let mut entries = Vec::new();
    let mut records = out.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        if record.starts_with("## ") {
            continue;
        }
        let mut chars = record.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(path) = record.get(3..) else {
            continue;
        };
        if matches!(index, 'R' | 'C') {
            // The source path follows as its own record.
            records.next();
        }
        entries.push(PorcelainEntry {
            path: path.to_string(),
            state: classify(index, worktree),
            staged: !matches!(index, ' ' | '?' | '!'),
        });
    }
    entries
}

fn parse_branch(out: &str) -> Option<String> {
    let header = out.split('\0').find(|r| r.starts_with("## "))?;
    let name = header.trim_start_matches("## ");
    let name = name.strip_prefix("No commits yet on ").unwrap_or(name);
    let name = name.split("...").next().unwrap_or(name);
    let name = name.split(' ').next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_log(out: &str) -> Vec<CommitInfo> {
    out.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(6, FIELD_SEP);
            Some(CommitInfo {
                hash: fields.next()?.to_string(),
                short_hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                email: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                message: fields.next()?.to_string(),
            })
        })
        .collect()
}
