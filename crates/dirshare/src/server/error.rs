//! Request failure taxonomy.

use std::io;
use std::path::PathBuf;

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use thiserror::Error;

use crate::files::ResolveError;
use crate::render::RenderError;

/// Errors that end a request early.
///
/// Directory read failures never reach this type; the listing degrades to
/// zero entries instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The resolved path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The request path could not be mapped onto the served tree.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Metadata lookup failed for a reason other than non-existence.
    #[error("stat {path} failed: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An existing regular file could not be opened.
    #[error("open {path} failed: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Preparing the file body failed after opening.
    #[error("streaming {path} failed: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A response header could not be built from file data.
    #[error("header for {path} is invalid: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: InvalidHeaderValue,
    },

    /// Template execution failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DispatchError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::Resolve(ResolveError::InvalidEncoding(_)) => StatusCode::NOT_FOUND,
            DispatchError::Resolve(_)
            | DispatchError::Stat { .. }
            | DispatchError::FileOpen { .. }
            | DispatchError::Stream { .. }
            | DispatchError::Header { .. }
            | DispatchError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Operation that failed, for log fields.
    pub fn op(&self) -> &'static str {
        match self {
            DispatchError::NotFound(_) | DispatchError::Stat { .. } => "stat",
            DispatchError::Resolve(_) => "resolve",
            DispatchError::FileOpen { .. } => "open",
            DispatchError::Stream { .. } => "stream",
            DispatchError::Header { .. } => "header",
            DispatchError::Render(_) => "render",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = DispatchError::NotFound(PathBuf::from("/x"));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_encoding = DispatchError::Resolve(ResolveError::InvalidEncoding("%FF".into()));
        assert_eq!(bad_encoding.status(), StatusCode::NOT_FOUND);

        let outside = DispatchError::Resolve(ResolveError::OutsideRoot {
            path: PathBuf::from("/etc"),
        });
        assert_eq!(outside.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let stat = DispatchError::Stat {
            path: PathBuf::from("/x"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(stat.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(stat.op(), "stat");

        let render = DispatchError::Render(RenderError::Failed {
            template: "index.html",
            reason: "bad".into(),
        });
        assert_eq!(render.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(render.op(), "render");
    }

    #[test]
    fn test_header_failure_is_internal_error() {
        let source = axum::http::HeaderValue::from_str("bad\nvalue").unwrap_err();
        let err = DispatchError::Header {
            path: PathBuf::from("/x"),
            source,
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.op(), "header");
    }
}
