//! Page rendering.
//!
//! Renderers turn a named template plus its view model into response bytes.
//! [`HtmlRenderer`] is the built-in implementation; other implementations can
//! be plugged into the dispatcher through [`ListingRenderer`].

pub mod html;

use serde::Serialize;
use thiserror::Error;

use crate::files::{Breadcrumb, FileEntry};

pub use html::HtmlRenderer;

/// Template name of the directory listing page.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Template name of the not-found page.
pub const NOT_FOUND_TEMPLATE: &str = "404.html";

/// Errors that can occur while rendering a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template execution failed.
    #[error("template {template} failed: {reason}")]
    Failed {
        template: &'static str,
        reason: String,
    },
}

/// Everything the listing page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ListingView {
    /// Navigation trail, root first.
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Visible children of the current directory.
    pub entries: Vec<FileEntry>,
}

/// A template together with the variables it consumes.
#[derive(Debug, Clone, Copy)]
pub enum Template<'a> {
    /// `index.html`, the directory listing.
    Index(&'a ListingView),
    /// `404.html`, takes no variables.
    NotFound,
}

impl Template<'_> {
    /// The template name.
    pub fn name(&self) -> &'static str {
        match self {
            Template::Index(_) => INDEX_TEMPLATE,
            Template::NotFound => NOT_FOUND_TEMPLATE,
        }
    }
}

/// Produces page bytes for a template.
///
/// Implementations are shared across concurrent requests.
pub trait ListingRenderer: Send + Sync {
    fn render(&self, template: Template<'_>) -> Result<Vec<u8>, RenderError>;
}
