//! Paginated file content and file metadata.

use super::listing::{extension_of, format_time, EntryKind};
use super::GatewayError;
use crate::security::{ExtensionPolicy, ResolvedPath, SizePolicy};
use serde::{Deserialize, Serialize};

/// Largest accepted page size.
pub const MAX_LINES_PER_PAGE: usize = 10_000;

/// Bytes inspected by the binary sniff.
pub(crate) const SNIFF_LEN: usize = 8192;

/// Metadata for a file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Sandbox-relative path (`/` for the base)
    pub path: String,
    /// Final component (`/` for the base)
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Creation timestamp, where the platform records one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Entry type
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Lowercase extension without the dot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Number of lines, for servable text files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
}

/// One page of a text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContentPage {
    /// Sandbox-relative path
    pub path: String,
    /// The lines of this page joined with `\n`
    pub content: String,
    /// Page number, starting at 1
    pub page: usize,
    /// Number of pages (at least 1)
    pub total_pages: usize,
    /// Number of lines in the file
    pub total_lines: usize,
    /// Requested page size
    pub lines_per_page: usize,
    /// File metadata
    pub metadata: FileMetadata,
}

/// Returns true if the leading bytes look binary: more than a tenth NUL.
#[must_use]
pub fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let nul_count = sample.iter().filter(|&&b| b == 0).count();
    nul_count > sample.len() / 10
}

/// Validates pagination arguments.
pub(crate) fn check_paging(page: usize, lines_per_page: usize) -> Result<(), GatewayError> {
    if page == 0 {
        return Err(GatewayError::invalid_argument("page", "must be at least 1"));
    }
    if lines_per_page == 0 || lines_per_page > MAX_LINES_PER_PAGE {
        return Err(GatewayError::invalid_argument(
            "lines_per_page",
            format!("must be between 1 and {MAX_LINES_PER_PAGE}"),
        ));
    }
    Ok(())
}

/// Reads one page of `file`, which has already been resolved.
///
/// Checks run in order: regular file, extension, size, binary sniff.
pub(crate) async fn read_page(
    file: &ResolvedPath,
    page: usize,
    lines_per_page: usize,
    extensions: &ExtensionPolicy,
    sizes: &SizePolicy,
) -> Result<FileContentPage, GatewayError> {
    check_paging(page, lines_per_page)?;

    let metadata = tokio::fs::metadata(file.as_path())
        .await
        .map_err(|e| GatewayError::io(&e, file))?;
    if !metadata.is_file() {
        return Err(GatewayError::not_a_file());
    }
    if !extensions.check_path(file.as_path()) {
        tracing::debug!(path = %file, "extension not served");
        return Err(GatewayError::unsupported_type());
    }
    if !sizes.check_len(metadata.len()) {
        tracing::debug!(path = %file, size = metadata.len(), "file over size limit");
        return Err(GatewayError::too_large(sizes.limit()));
    }

    let bytes = tokio::fs::read(file.as_path())
        .await
        .map_err(|e| GatewayError::io(&e, file))?;
    if looks_binary(&bytes) {
        tracing::debug!(path = %file, "binary content refused");
        return Err(GatewayError::unsupported_type());
    }

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let total_lines = lines.len();
    let total_pages = total_lines.div_ceil(lines_per_page).max(1);

    let start = (page - 1).saturating_mul(lines_per_page).min(total_lines);
    let end = start.saturating_add(lines_per_page).min(total_lines);
    let content = lines[start..end].join("\n");

    let mut info = describe(file, &metadata);
    info.line_count = Some(total_lines);

    Ok(FileContentPage {
        path: file.display_relative(),
        content,
        page,
        total_pages,
        total_lines,
        lines_per_page,
        metadata: info,
    })
}

/// Returns metadata for `target`, which has already been resolved.
///
/// `line_count` is filled in only for files the content endpoint would serve.
pub(crate) async fn file_info(
    target: &ResolvedPath,
    extensions: &ExtensionPolicy,
    sizes: &SizePolicy,
) -> Result<FileMetadata, GatewayError> {
    let metadata = tokio::fs::metadata(target.as_path())
        .await
        .map_err(|e| GatewayError::io(&e, target))?;

    let mut info = describe(target, &metadata);

    if metadata.is_file()
        && extensions.check_path(target.as_path())
        && sizes.check_len(metadata.len())
    {
        match tokio::fs::read(target.as_path()).await {
            Ok(bytes) if !looks_binary(&bytes) => {
                info.line_count = Some(String::from_utf8_lossy(&bytes).lines().count());
            }
            Ok(_) => {}
            Err(e) => return Err(GatewayError::io(&e, target)),
        }
    }

    Ok(info)
}

fn describe(target: &ResolvedPath, metadata: &std::fs::Metadata) -> FileMetadata {
    let name = if target.is_base() {
        "/".to_string()
    } else {
        target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    let kind = if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let extension = if kind == EntryKind::File {
        extension_of(&name)
    } else {
        None
    };

    FileMetadata {
        path: target.display_relative(),
        size: metadata.len(),
        modified: metadata.modified().ok().map(format_time),
        created: metadata.created().ok().map(format_time),
        kind,
        extension,
        line_count: None,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_heavy_content_is_binary() {
        let mut bytes = vec![b'a'; 100];
        bytes.extend(vec![0u8; 20]);
        assert!(looks_binary(&bytes));
    }

    #[test]
    fn text_and_empty_are_not_binary() {
        assert!(!looks_binary(b"# Title\n\nsome text\n"));
        assert!(!looks_binary(b""));
        // A single NUL in a large text file is tolerated.
        let mut bytes = vec![b'x'; 1000];
        bytes[10] = 0;
        assert!(!looks_binary(&bytes));
    }

    #[test]
    fn only_the_leading_bytes_are_sniffed() {
        let mut bytes = vec![b'x'; SNIFF_LEN];
        bytes.extend(vec![0u8; SNIFF_LEN]);
        assert!(!looks_binary(&bytes));
    }

    #[test]
    fn paging_bounds() {
        assert!(check_paging(1, 1).is_ok());
        assert!(check_paging(3, MAX_LINES_PER_PAGE).is_ok());
        assert!(check_paging(0, 10).is_err());
        assert!(check_paging(1, 0).is_err());
        assert!(check_paging(1, MAX_LINES_PER_PAGE + 1).is_err());
    }
}
