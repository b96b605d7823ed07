//! # docroot: Sandboxed Document Serving
//!
//! Serves a directory tree to untrusted clients. Every path a client sends
//! is checked by one resolver before any filesystem call, so nothing outside
//! the configured base directory can be listed, read, searched, diffed or
//! used as a shell's working directory.
//!
//! ## Architecture
//!
//! - **Security**: `PathResolver` and its gates, symlink checks, input and
//!   content policies, the swappable `SandboxHandle`
//! - **Gateway**: `DocumentService`, the listing, paging, metadata, search,
//!   git and terminal operations built on resolved paths
//! - **Config**: TOML configuration with XDG lookup
//! - **Logging**: tracing with daily rolling files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docroot::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DocumentService::new(SandboxHandle::open("/srv/docs")?);
//!
//! let listing = service.list_directory("/", ListOptions::new()).await?;
//! for item in &listing.items {
//!     println!("{} {}", item.name, item.path);
//! }
//!
//! match service.read_page("../secrets.txt", 1, None).await {
//!     Err(e) => println!("{} {}", e.http_status(), e.public_message()),
//!     Ok(page) => println!("{}", page.content),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod security;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::DocrootConfig;
    pub use crate::error::DocrootError;
    pub use crate::gateway::{
        DocumentService, GatewayError, GatewayErrorKind, ListOptions, SearchKind, SearchOptions,
        SortBy, SortOrder,
    };
    pub use crate::security::{
        PathResolver, RejectionClass, RejectionReason, ResolvedPath, SandboxHandle,
    };
}
