//! Path sandboxing.
//!
//! Every filesystem operation in this crate starts with a user-supplied path
//! string. This module decides whether that string names something inside
//! the configured base directory and, if so, hands back a [`ResolvedPath`]
//! that the rest of the crate uses instead of the raw input.
//!
//! # Components
//!
//! - [`PathResolver`]: the gate pipeline (see its docs for the order)
//! - [`SymlinkGuard`]: follow-up check for links canonicalization could not
//!   resolve
//! - [`SandboxHandle`]: shared access to the active resolver, with atomic
//!   rebase
//! - [`InputSanitizer`]: free-text inputs such as search queries
//! - [`SizePolicy`] / [`ExtensionPolicy`]: what the content endpoints serve
//!
//! # Rejections
//!
//! Failures are reported as a [`RejectionReason`]. Its `Display` and
//! [`RejectionClass::public_message`] never contain a path, so either can be
//! returned to a client as is.

mod handle;
mod input;
pub mod lexical;
mod policy;
mod rejection;
mod resolved;
mod resolver;
mod symlink;

pub use handle::SandboxHandle;
pub use input::{InputSanitizer, DEFAULT_MAX_INPUT_CHARS};
pub use lexical::MAX_PATH_LEN;
pub use policy::{ExtensionPolicy, SizePolicy, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
pub use rejection::{RejectionClass, RejectionReason};
pub use resolved::ResolvedPath;
pub use resolver::PathResolver;
pub use symlink::{SymlinkGuard, MAX_SYMLINK_HOPS};
