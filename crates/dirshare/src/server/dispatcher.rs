//! Request dispatch: stat the resolved path, then list, download or 404.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tracing::{debug, error, warn};

use super::content::serve_content;
use super::error::DispatchError;
use crate::files::{build_breadcrumbs, list_entries, Clock, ResolvedPath, ServedRoot};
use crate::render::{ListingRenderer, ListingView, Template};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Turns request paths into responses.
///
/// Holds only immutable state, so one instance serves all concurrent
/// requests.
pub struct Dispatcher {
    root: ServedRoot,
    renderer: Arc<dyn ListingRenderer>,
    clock: Clock,
}

impl Dispatcher {
    pub fn new(root: ServedRoot, renderer: Arc<dyn ListingRenderer>) -> Self {
        Self {
            root,
            renderer,
            clock: Clock::System,
        }
    }

    /// Use `clock` for relative timestamps in listings.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &ServedRoot {
        &self.root
    }

    /// Handle one request for `request_path` (raw, percent-encoded).
    pub async fn dispatch(&self, request_path: &str, headers: &HeaderMap) -> Response {
        match self.try_dispatch(request_path, headers).await {
            Ok(response) => response,
            Err(err) => self.error_response(request_path, &err),
        }
    }

    async fn try_dispatch(
        &self,
        request_path: &str,
        headers: &HeaderMap,
    ) -> Result<Response, DispatchError> {
        let resolved = self.root.resolve(request_path)?;

        let metadata = match tokio::fs::metadata(&resolved.absolute).await {
            Ok(m) => m,
            // NotADirectory: the path continues below a regular file, e.g.
            // `/readme.txt/x`, and names nothing.
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Err(DispatchError::NotFound(resolved.absolute));
            }
            Err(source) => {
                return Err(DispatchError::Stat {
                    path: resolved.absolute,
                    source,
                });
            }
        };

        if metadata.is_dir() {
            self.listing(resolved).await
        } else if metadata.is_file() {
            self.download(resolved, &metadata, headers).await
        } else {
            // Sockets, FIFOs and devices are never streamed.
            Err(DispatchError::NotFound(resolved.absolute))
        }
    }

    async fn listing(&self, resolved: ResolvedPath) -> Result<Response, DispatchError> {
        let ResolvedPath {
            absolute,
            display: dir_path,
        } = resolved;
        let breadcrumbs = build_breadcrumbs(&dir_path);

        let now = self.clock.now();
        let listed = dir_path.clone();
        let task = tokio::task::spawn_blocking(move || list_entries(&absolute, &listed, now));
        let entries = match task.await {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!(path = %dir_path, op = "read_dir", error = %e, "listing without entries");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %dir_path, op = "read_dir", error = %e, "listing task failed");
                Vec::new()
            }
        };

        debug!(path = %dir_path, entries = entries.len(), "rendering listing");
        let view = ListingView {
            breadcrumbs,
            entries,
        };
        let body = self.renderer.render(Template::Index(&view))?;

        Ok(([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response())
    }

    async fn download(
        &self,
        resolved: ResolvedPath,
        metadata: &Metadata,
        headers: &HeaderMap,
    ) -> Result<Response, DispatchError> {
        let ResolvedPath {
            absolute: path,
            display: file_path,
        } = resolved;
        let file = File::open(&path)
            .await
            .map_err(|source| DispatchError::FileOpen {
                path: path.clone(),
                source,
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let disposition =
            HeaderValue::from_str(&content_disposition(&name)).map_err(|source| {
                DispatchError::Header {
                    path: path.clone(),
                    source,
                }
            })?;

        debug!(path = %file_path, size = metadata.len(), "streaming file");
        let mut response = serve_content(headers, file, metadata, &path)
            .await
            .map_err(|source| DispatchError::Stream {
                path: path.clone(),
                source,
            })?;

        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);

        Ok(response)
    }

    fn error_response(&self, request_path: &str, err: &DispatchError) -> Response {
        let status = err.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path = request_path, op = err.op(), error = %err, "not found");
            return self.not_found_page();
        }

        error!(path = request_path, op = err.op(), error = %err, "request failed");
        generic_error(status)
    }

    fn not_found_page(&self) -> Response {
        match self.renderer.render(Template::NotFound) {
            Ok(body) => (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(op = "render", error = %e, "not-found page failed");
                generic_error(StatusCode::NOT_FOUND)
            }
        }
    }
}

/// Plain-text body holding only the status reason.
fn generic_error(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}

/// `attachment; filename="<name>"` with quotes and backslashes escaped.
pub fn content_disposition(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_control() => {}
            c => quoted.push(c),
        }
    }
    format!("attachment; filename=\"{quoted}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::DisplayPath;
    use crate::render::HtmlRenderer;
    use std::fs;
    use tempfile::TempDir;

    fn dispatcher(dir: &std::path::Path) -> Dispatcher {
        let root = ServedRoot::new(dir).unwrap();
        Dispatcher::new(root, Arc::new(HtmlRenderer::new()))
    }

    #[tokio::test]
    async fn test_listing_degrades_when_directory_cannot_be_read() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(temp_dir.path());

        // Gone between stat and read_dir.
        let resolved = ResolvedPath {
            absolute: temp_dir.path().join("vanished"),
            display: DisplayPath::new("/vanished"),
        };
        let response = dispatcher.listing(resolved).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8_lossy(&body);
        assert!(page.contains("<title>Index of /vanished</title>"));
        assert!(!page.contains("<td"));
    }

    #[tokio::test]
    async fn test_download_open_failure_is_internal_error() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.txt");
        fs::write(&present, "data").unwrap();
        let metadata = fs::metadata(&present).unwrap();
        let dispatcher = dispatcher(temp_dir.path());

        // Removed between stat and open.
        let resolved = ResolvedPath {
            absolute: temp_dir.path().join("removed.txt"),
            display: DisplayPath::new("/removed.txt"),
        };
        let err = dispatcher
            .download(resolved, &metadata, &HeaderMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::FileOpen { .. }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = dispatcher.error_response("/removed.txt", &err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[test]
    fn test_content_disposition_always_builds_a_header() {
        for name in ["plain.txt", "caf\u{e9}.txt", "tab\tand\u{7f}del", "quote\"d"] {
            assert!(HeaderValue::from_str(&content_disposition(name)).is_ok());
        }
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say \\\"hi\\\".txt\""
        );
        assert_eq!(
            content_disposition("bad\r\nname"),
            "attachment; filename=\"badname\""
        );
    }

    #[test]
    fn test_generic_error_has_no_detail() {
        let response = generic_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
