//! Configuration management for docroot.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./docroot.toml` (project-local)
//! 2. `~/.config/docroot/config.toml` (XDG config)
//!
//! Every field is optional. The base directory can also be given on the
//! command line or through `DOCROOT_BASE_PATH`; see
//! [`DocrootConfig::base_path`] for the precedence.
//!
//! # Example Configuration
//!
//! ```toml
//! base_path = "/srv/docs"
//! extra_extensions = ["adoc", "nfo"]
//!
//! [search]
//! fuzzy_threshold = 0.6
//!
//! [logging]
//! level = "Debug"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use docroot::config;
//!
//! let config = config::load()?;
//! let base = config.base_path(None)?;
//! # Ok::<(), docroot::error::DocrootError>(())
//! ```

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};
pub use types::{DocrootConfig, SearchConfig, TerminalConfig, BASE_PATH_ENV};
