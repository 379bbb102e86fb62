//! # dirshare
//!
//! A small HTTP server that exposes one directory tree: directories render
//! as HTML listings with breadcrumb navigation, files download as
//! attachments, and everything else gets a not-found page.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 HttpServer (axum, catch-all)              │
//! ├──────────────────────────────────────────────────────────┤
//! │                        Dispatcher                         │
//! │   resolve ─▶ stat ─┬─▶ directory ─▶ breadcrumbs + entries │
//! │                    │                 ─▶ ListingRenderer   │
//! │                    ├─▶ file ─▶ content server (ranges)    │
//! │                    └─▶ missing ─▶ 404 page                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dirshare::{Config, HttpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::default();
//!     config.server.root = "/srv/files".into();
//!     config.validate()?;
//!
//!     HttpServer::from_config(&config).await?.run().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: Path resolution, breadcrumbs, directory listing
//! - [`render`]: Listing and not-found pages
//! - [`server`]: HTTP routing, dispatch and file streaming

pub mod config;
pub mod files;
pub mod render;
pub mod server;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export files types for convenience
pub use files::{Breadcrumb, Clock, DisplayPath, FileEntry, ResolvedPath, ServedRoot};

// Re-export render types for convenience
pub use render::{HtmlRenderer, ListingRenderer, ListingView, RenderError, Template};

// Re-export server types for convenience
pub use server::{router, DispatchError, Dispatcher, HttpServer};
