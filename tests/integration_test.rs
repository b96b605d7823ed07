//! Integration tests for docroot.
//!
//! These tests drive the public API against a real directory tree:
//! - Path resolution and every rejection category
//! - Listing, paging, metadata and search through `DocumentService`
//! - Configuration loading into a working service
//! - Git queries against a throwaway repository (skipped without git)

use docroot::config;
use docroot::prelude::*;
use docroot::security::SymlinkGuard;
use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("docs/subdirectory")).unwrap();
    fs::create_dir(root.join("src")).unwrap();
    fs::create_dir(root.join(".hidden")).unwrap();
    fs::write(root.join("README.md"), "# Test Project\n\nWelcome.\n").unwrap();
    fs::write(
        root.join("docs/api.md"),
        "# API\n\n## Endpoints\nGET /api/files\n",
    )
    .unwrap();
    fs::write(root.join("docs/guide.md"), "# Guide\n\nRead the API docs.\n").unwrap();
    fs::write(root.join("docs/subdirectory/nested.md"), "# Nested\n").unwrap();
    fs::write(root.join("src/main.py"), "print('hello')\n").unwrap();
    fs::write(root.join(".hidden/secret.md"), "# Secret\n").unwrap();
    dir
}

fn service(dir: &TempDir) -> DocumentService {
    DocumentService::new(SandboxHandle::open(dir.path()).unwrap())
}

fn git_available() -> bool {
    StdCommand::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args([
            "-c",
            "user.name=Docroot Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// Traversal in every spelling is refused before touching the filesystem.
#[test]
fn traversal_inputs_are_rejected() {
    let dir = fixture();
    let resolver = PathResolver::new(dir.path()).unwrap();

    let cases = [
        ("../../etc/passwd", RejectionReason::PathTraversal),
        ("docs/../../etc/passwd", RejectionReason::PathTraversal),
        ("..\\..\\etc\\passwd", RejectionReason::PathTraversal),
        ("/etc/passwd", RejectionReason::OutsideBase),
        ("file:///etc/passwd", RejectionReason::SchemeNotAllowed),
        ("C:\\Windows\\System32", RejectionReason::WindowsAbsoluteNotAllowed),
        ("\\\\server\\share", RejectionReason::UncNotAllowed),
        ("//server/share", RejectionReason::UncNotAllowed),
        ("README.md\0.txt", RejectionReason::InvalidInput),
    ];
    for (input, expected) in cases {
        assert_eq!(resolver.resolve(input).unwrap_err(), expected, "{input:?}");
    }
}

/// Absolute paths that already live in the base are accepted as relative.
#[test]
fn absolute_path_inside_base_is_reinterpreted() {
    let dir = fixture();
    let resolver = PathResolver::new(dir.path()).unwrap();
    let input = resolver.base().join("docs/api.md");

    let resolved = resolver.resolve(input.to_str().unwrap()).unwrap();
    assert_eq!(resolved.relative(), Path::new("docs/api.md"));
}

/// A sibling directory sharing the base's name prefix is still outside.
#[test]
fn sibling_prefix_directory_is_outside() {
    let parent = TempDir::new().unwrap();
    let base = parent.path().join("docs");
    let sibling = parent.path().join("docs-private");
    fs::create_dir(&base).unwrap();
    fs::create_dir(&sibling).unwrap();
    fs::write(sibling.join("keys.txt"), "secret").unwrap();

    let resolver = PathResolver::new(&base).unwrap();
    let input = resolver
        .base()
        .parent()
        .unwrap()
        .join("docs-private/keys.txt");
    assert_eq!(
        resolver.resolve(input.to_str().unwrap()).unwrap_err(),
        RejectionReason::OutsideBase
    );
}

#[cfg(unix)]
#[test]
fn symlinks_escaping_the_base_are_rejected() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("passwd"), "root:x:0:0").unwrap();

    let dir = fixture();
    symlink(outside.path().join("passwd"), dir.path().join("escape")).unwrap();
    symlink(outside.path().join("missing"), dir.path().join("dangling")).unwrap();
    symlink("docs/api.md", dir.path().join("inside")).unwrap();

    let resolver = PathResolver::new(dir.path()).unwrap();
    let escape = resolver.resolve("escape").unwrap_err();
    assert!(escape.is_escape_attempt());
    let dangling = resolver.resolve("dangling").unwrap_err();
    assert!(dangling.is_escape_attempt());

    let inside = resolver.resolve("inside").unwrap();
    assert_eq!(inside.relative(), Path::new("docs/api.md"));

    let guard = SymlinkGuard::new(resolver.base());
    assert!(guard.check(inside.as_path()).is_ok());
}

/// Rejections reach the boundary as a coarse status with no path in it.
#[tokio::test]
async fn rejections_never_leak_paths() {
    let dir = fixture();
    let service = service(&dir);
    let base = service.sandbox().current().base().display().to_string();

    let err = service
        .read_page("../../etc/passwd", 1, None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 403);
    assert_eq!(err.rejection(), Some(RejectionReason::PathTraversal));

    let message = err.public_message();
    assert!(!message.contains("etc"));
    assert!(!message.contains(&base));

    let err = service.read_page("missing.md", 1, None).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.public_message().contains(&base));
}

#[tokio::test]
async fn browse_read_and_inspect() {
    let dir = fixture();
    let service = service(&dir);

    let root = service.list_directory("/", ListOptions::new()).await.unwrap();
    let names: Vec<&str> = root.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["docs", "src", "README.md"]);
    assert_eq!(root.path, "/");

    let docs = service
        .list_directory("docs", ListOptions::new())
        .await
        .unwrap();
    assert_eq!(docs.parent, "/");
    assert!(docs.items.iter().any(|i| i.path == "docs/api.md"));

    let page = service.read_page("docs/api.md", 1, Some(2)).await.unwrap();
    assert_eq!(page.content, "# API\n");
    assert_eq!(page.total_lines, 4);
    assert_eq!(page.total_pages, 2);

    let info = service.file_info("docs/api.md").await.unwrap();
    assert_eq!(info.name, "api.md");
    assert_eq!(info.extension.as_deref(), Some("md"));
    assert_eq!(info.line_count, Some(4));
}

#[tokio::test]
async fn search_finds_names_and_contents_inside_scope() {
    let dir = fixture();
    let service = service(&dir);

    let results = service
        .search("api", service.search_options())
        .await
        .unwrap();
    let paths: Vec<&str> = results.results.iter().map(|h| h.path.as_str()).collect();
    assert!(paths.contains(&"docs/api.md"));
    assert!(paths.iter().all(|p| !p.starts_with(".hidden")));

    let scoped = service
        .search(
            "nested",
            service
                .search_options()
                .with_kind(SearchKind::Filename)
                .with_scope("docs/subdirectory"),
        )
        .await
        .unwrap();
    assert_eq!(scoped.total_results, 1);
    assert_eq!(scoped.results[0].path, "docs/subdirectory/nested.md");

    let err = service
        .search("api", service.search_options().with_scope("../.."))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 403);
}

/// Requests in flight keep their snapshot when the base is swapped.
#[tokio::test]
async fn rebase_swaps_the_base_for_new_requests() {
    let first = fixture();
    let second = TempDir::new().unwrap();
    fs::write(second.path().join("other.md"), "# Other\n").unwrap();

    let service = service(&first);
    let snapshot = service.sandbox().current();

    service.sandbox().rebase(second.path()).unwrap();

    assert!(snapshot.resolve("README.md").is_ok());
    assert!(service.read_page("other.md", 1, None).await.is_ok());
    assert!(service.read_page("README.md", 1, None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn service_from_config_applies_policies() {
    let dir = fixture();
    fs::write(dir.path().join("notes.adoc"), "= Notes\n").unwrap();
    let toml = format!(
        "base_path = {:?}\nextra_extensions = [\"adoc\"]\nlines_per_page = 1\n\n[logging]\nenabled = false\n",
        dir.path().display().to_string()
    );

    let config = config::from_str(&toml).unwrap();
    let service = DocumentService::from_config(&config, None).unwrap();

    let page = service.read_page("notes.adoc", 1, None).await.unwrap();
    assert_eq!(page.lines_per_page, 1);
    assert_eq!(page.content, "= Notes");
}

#[test]
fn from_config_without_base_is_a_configuration_error() {
    let config = DocrootConfig::default();
    if std::env::var_os(config::BASE_PATH_ENV).is_some() {
        return;
    }
    let err = DocumentService::from_config(&config, None).unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn git_queries_on_a_real_repository() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "Initial commit"]);
    fs::write(dir.path().join("README.md"), "# Changed\n").unwrap();
    fs::write(dir.path().join("docs/new.md"), "# New\n").unwrap();

    let service = service(&dir);

    let info = service.git_info().await.unwrap();
    assert!(info.is_repo);
    assert_eq!(info.branch.as_deref(), Some("main"));
    assert_eq!(info.commit.as_ref().map(String::len), Some(40));

    let status = service.git_status("README.md").await.unwrap();
    assert_eq!(status.status, docroot::gateway::FileState::Modified);
    assert!(!status.staged);

    let history = service.git_history("README.md", 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "Initial commit");
    assert_eq!(history[0].author, "Docroot Test");

    let diff = service.git_diff("README.md", Some("HEAD")).await.unwrap();
    assert!(diff.diff.contains("+# Changed"));

    let changes = service.git_changes().await.unwrap();
    assert!(!changes.clean);
    assert_eq!(changes.modified, ["README.md"]);
    assert_eq!(changes.untracked, ["docs/new.md"]);

    let err = service.git_diff("README.md", Some("HEAD; rm -rf /")).await.unwrap_err();
    assert_eq!(err.http_status(), 400);
    let err = service.git_status("../outside").await.unwrap_err();
    assert_eq!(err.http_status(), 403);
}

#[tokio::test]
async fn git_info_outside_a_repository() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let service = service(&dir);

    let info = service.git_info().await.unwrap();
    if info.is_repo {
        // The temp dir sits inside someone else's work tree.
        return;
    }
    assert!(info.branch.is_none());
    assert!(service.git_changes().await.is_err());
}
