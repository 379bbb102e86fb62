//! Mapping requests onto the served directory tree.
//!
//! This module provides:
//! - Request path resolution with lexical cleaning
//! - Breadcrumb construction for the current location
//! - Directory listing with hidden-entry filtering
//! - Human-readable sizes and timestamps
//!
//! # Security
//!
//! Request paths are cleaned before they are joined to the served root, so
//! `..` segments cannot escape it. Symbolic links inside the tree are
//! followed as-is.

pub mod breadcrumb;
pub mod browser;
pub mod humanize;
pub mod resolver;

pub use breadcrumb::{build_breadcrumbs, Breadcrumb};
pub use browser::{list_entries, BrowserError, FileEntry};
pub use humanize::{human_size, human_time, Clock};
pub use resolver::{clean_request_path, DisplayPath, ResolveError, ResolvedPath, ServedRoot};
