//! Directory listing.

use super::GatewayError;
use crate::security::ResolvedPath;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// What a directory entry is. Links are reported as links, not followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
}

/// Field to sort a listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Directories first, then by name
    #[default]
    Name,
    /// File size
    Size,
    /// Modification time
    Modified,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl FromStr for SortBy {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "modified" => Ok(Self::Modified),
            _ => Err(GatewayError::invalid_argument(
                "sort_by",
                "expected one of name, size, modified",
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(GatewayError::invalid_argument("sort_order", "expected asc or desc")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Modified => "modified",
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Options for [`DocumentService::list_directory`](super::DocumentService::list_directory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    /// Include entries whose name starts with `.`
    pub include_hidden: bool,
    /// Sort field
    pub sort_by: SortBy,
    /// Sort direction
    pub sort_order: SortOrder,
}

impl ListOptions {
    /// Creates default options: hidden entries skipped, sorted by name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes or skips hidden entries.
    #[must_use]
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Sets the sort field and direction.
    #[must_use]
    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Entry name
    pub name: String,
    /// Sandbox-relative path with `/` separators
    pub path: String,
    /// Entry type
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modified timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Lowercase extension without the dot (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// A directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// The listed directory, sandbox-relative (`/` for the base)
    pub path: String,
    /// Its parent, sandbox-relative (`/` at the top)
    pub parent: String,
    /// The entries
    pub items: Vec<FileItem>,
    /// Number of entries
    pub total_items: usize,
}

/// Formats a system time as ISO 8601.
pub(crate) fn format_time(time: SystemTime) -> String {
    let datetime = chrono::DateTime::<chrono::Utc>::from(time);
    datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Joins a sandbox-relative directory and a child name.
pub(crate) fn child_path(dir: &ResolvedPath, name: &str) -> String {
    if dir.is_base() {
        name.to_string()
    } else {
        format!("{}/{}", dir.display_relative(), name)
    }
}

pub(crate) fn parent_of(dir: &ResolvedPath) -> String {
    match dir.relative().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => "/".to_string(),
    }
}

pub(crate) fn extension_of(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Lists `dir`, which has already been resolved.
pub(crate) async fn list(
    dir: &ResolvedPath,
    options: ListOptions,
) -> Result<DirectoryListing, GatewayError> {
    let metadata = tokio::fs::metadata(dir.as_path())
        .await
        .map_err(|e| GatewayError::io(&e, dir))?;
    if !metadata.is_dir() {
        return Err(GatewayError::not_a_directory());
    }

    let mut read_dir = tokio::fs::read_dir(dir.as_path())
        .await
        .map_err(|e| GatewayError::io(&e, dir))?;

    let mut items = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| GatewayError::io(&e, dir))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if !options.include_hidden && name.starts_with('.') {
            continue;
        }

        // file_type does not follow links; metadata on a dangling link fails.
        let file_type = entry.file_type().await.ok();
        let metadata = entry.metadata().await.ok();

        let kind = match file_type {
            Some(ft) if ft.is_symlink() => EntryKind::Symlink,
            Some(ft) if ft.is_dir() => EntryKind::Directory,
            _ => EntryKind::File,
        };

        let size = metadata
            .as_ref()
            .filter(|_| kind == EntryKind::File)
            .map(std::fs::Metadata::len);
        let modified = metadata
            .as_ref()
            .and_then(|m| m.modified().ok())
            .map(format_time);
        let extension = if kind == EntryKind::File {
            extension_of(&name)
        } else {
            None
        };

        items.push(FileItem {
            path: child_path(dir, &name),
            name,
            kind,
            size,
            modified,
            extension,
        });
    }

    sort_items(&mut items, options.sort_by, options.sort_order);
    tracing::debug!(path = %dir, count = items.len(), "directory listed");

    Ok(DirectoryListing {
        path: dir.display_relative(),
        parent: parent_of(dir),
        total_items: items.len(),
        items,
    })
}

fn sort_items(items: &mut [FileItem], sort_by: SortBy, order: SortOrder) {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match sort_by {
        SortBy::Name => items.sort_by(|a, b| {
            let a_dir = a.kind == EntryKind::Directory;
            let b_dir = b.kind == EntryKind::Directory;
            b_dir
                .cmp(&a_dir)
                .then_with(|| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase())))
        }),
        SortBy::Size => items.sort_by(|a, b| {
            directed(a.size.unwrap_or(0).cmp(&b.size.unwrap_or(0))).then_with(|| a.name.cmp(&b.name))
        }),
        SortBy::Modified => {
            items.sort_by(|a, b| directed(a.modified.cmp(&b.modified)).then_with(|| a.name.cmp(&b.name)))
        }
    }
}
