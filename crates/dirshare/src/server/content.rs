//! Range-aware streaming of an open file.
//!
//! Sets `Content-Type`, `Last-Modified`, `ETag` and `Accept-Ranges`, answers
//! conditional requests with 304 and single byte ranges with 206. The body
//! streams from the file handle, which is dropped with the body.

use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use httpdate::{fmt_http_date, parse_http_date};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Outcome of interpreting a `Range` header against a file length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range; serve the whole file.
    Full,
    /// Inclusive byte range.
    Partial { start: u64, end: u64 },
    /// The range cannot be satisfied for this length.
    Unsatisfiable,
}

/// Validators derived from file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Validators {
    etag: String,
    modified_secs: Option<u64>,
    last_modified: Option<String>,
}

impl Validators {
    fn from_metadata(len: u64, modified: Option<SystemTime>) -> Self {
        let modified_secs = modified
            .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        Self {
            etag: format!("W/\"{:x}-{:x}\"", len, modified_secs.unwrap_or(0)),
            modified_secs,
            last_modified: modified.map(fmt_http_date),
        }
    }

    /// Whether the client's cached copy is still current.
    fn not_modified(&self, headers: &HeaderMap) -> bool {
        if let Some(value) = header_str(headers, header::IF_NONE_MATCH) {
            return value
                .split(',')
                .map(str::trim)
                .any(|tag| tag == "*" || weak_eq(tag, &self.etag));
        }

        match (header_str(headers, header::IF_MODIFIED_SINCE), self.modified_secs) {
            (Some(value), Some(modified)) => parse_http_date(value)
                .ok()
                .and_then(|since| since.duration_since(UNIX_EPOCH).ok())
                .is_some_and(|since| modified <= since.as_secs()),
            _ => false,
        }
    }

    /// Whether a `Range` header may be honoured given `If-Range`.
    fn range_allowed(&self, headers: &HeaderMap) -> bool {
        let Some(value) = header_str(headers, header::IF_RANGE) else {
            return true;
        };

        // Our entity tags are weak and never match the strong comparison
        // If-Range requires.
        if value.starts_with('"') || value.starts_with("W/") {
            return false;
        }

        match (parse_http_date(value), self.modified_secs) {
            (Ok(date), Some(modified)) => date
                .duration_since(UNIX_EPOCH)
                .is_ok_and(|d| d.as_secs() == modified),
            _ => false,
        }
    }
}

/// Serve `file` as the response body.
///
/// `path` is only used to guess the content type.
pub async fn serve_content(
    request_headers: &HeaderMap,
    mut file: File,
    metadata: &Metadata,
    path: &Path,
) -> std::io::Result<Response> {
    let len = metadata.len();
    let validators = Validators::from_metadata(len, metadata.modified().ok());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Ok(value) = HeaderValue::from_str(&validators.etag) {
        headers.insert(header::ETAG, value);
    }
    if let Some(value) = validators
        .last_modified
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::LAST_MODIFIED, value);
    }

    if validators.not_modified(request_headers) {
        tracing::debug!(path = %path.display(), "not modified");
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let range = if validators.range_allowed(request_headers) {
        parse_range(header_str(request_headers, header::RANGE), len)
    } else {
        ByteRange::Full
    };

    match range {
        ByteRange::Full => {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
            let body = Body::from_stream(ReaderStream::new(file));
            Ok((StatusCode::OK, headers, body).into_response())
        }
        ByteRange::Partial { start, end } => {
            let length = end - start + 1;
            tracing::debug!(path = %path.display(), start, end, length, "serving byte range");

            file.seek(SeekFrom::Start(start)).await?;
            if let Ok(value) = HeaderValue::from_str(&format!("bytes {start}-{end}/{len}")) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
            let body = Body::from_stream(ReaderStream::new(file.take(length)));
            Ok((StatusCode::PARTIAL_CONTENT, headers, body).into_response())
        }
        ByteRange::Unsatisfiable => {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{len}")) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            Ok((StatusCode::RANGE_NOT_SATISFIABLE, headers).into_response())
        }
    }
}

/// Interpret a single `bytes=` range against a file of `len` bytes.
///
/// Malformed and multi-range headers are ignored rather than rejected.
pub fn parse_range(value: Option<&str>, len: u64) -> ByteRange {
    let Some(value) = value else {
        return ByteRange::Full;
    };
    let Some(ranges) = value.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if ranges.contains(',') {
        return ByteRange::Full;
    }
    let Some((start_part, end_part)) = ranges.trim().split_once('-') else {
        return ByteRange::Full;
    };

    if start_part.is_empty() {
        let Ok(suffix) = end_part.parse::<u64>() else {
            return ByteRange::Full;
        };
        if suffix == 0 || len == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: len.saturating_sub(suffix),
            end: len - 1,
        };
    }

    let Ok(start) = start_part.parse::<u64>() else {
        return ByteRange::Full;
    };
    let end = if end_part.is_empty() {
        None
    } else {
        match end_part.parse::<u64>() {
            Ok(end) => Some(end),
            Err(_) => return ByteRange::Full,
        }
    };

    if let Some(end) = end {
        if end < start {
            return ByteRange::Full;
        }
    }
    if start >= len {
        return ByteRange::Unsatisfiable;
    }

    let last = len - 1;
    ByteRange::Partial {
        start,
        end: end.map_or(last, |e| e.min(last)),
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn weak_eq(a: &str, b: &str) -> bool {
    a.trim_start_matches("W/") == b.trim_start_matches("W/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn validators() -> Validators {
        Validators::from_metadata(100, Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)))
    }

    #[test]
    fn test_parse_range_absent_or_malformed() {
        assert_eq!(parse_range(None, 100), ByteRange::Full);
        assert_eq!(parse_range(Some("items=0-1"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=abc"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=0-1,5-6"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=9-3"), 100), ByteRange::Full);
    }

    #[test]
    fn test_parse_range_bounded() {
        assert_eq!(
            parse_range(Some("bytes=0-9"), 100),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(
            parse_range(Some("bytes=90-500"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
    }

    #[test]
    fn test_parse_range_open_and_suffix() {
        assert_eq!(
            parse_range(Some("bytes=95-"), 100),
            ByteRange::Partial { start: 95, end: 99 }
        );
        assert_eq!(
            parse_range(Some("bytes=-10"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
        assert_eq!(
            parse_range(Some("bytes=-500"), 100),
            ByteRange::Partial { start: 0, end: 99 }
        );
    }

    #[test]
    fn test_parse_range_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=100-"), 100), ByteRange::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=0-"), 0), ByteRange::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=-0"), 100), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_etag_format() {
        let v = validators();
        assert_eq!(v.etag, format!("W/\"64-{:x}\"", 1_700_000_000u64));
        assert_eq!(v.last_modified.as_deref(), Some("Tue, 14 Nov 2023 22:13:20 GMT"));
    }

    #[test]
    fn test_not_modified_by_etag() {
        let v = validators();
        assert!(v.not_modified(&headers(&[(header::IF_NONE_MATCH, v.etag.as_str())])));
        assert!(v.not_modified(&headers(&[(header::IF_NONE_MATCH, "\"x\", *")])));
        assert!(!v.not_modified(&headers(&[(header::IF_NONE_MATCH, "\"other\"")])));
    }

    #[test]
    fn test_not_modified_by_date() {
        let v = validators();
        let same = headers(&[(header::IF_MODIFIED_SINCE, "Tue, 14 Nov 2023 22:13:20 GMT")]);
        let older = headers(&[(header::IF_MODIFIED_SINCE, "Tue, 14 Nov 2023 22:13:19 GMT")]);
        assert!(v.not_modified(&same));
        assert!(!v.not_modified(&older));
        assert!(!v.not_modified(&HeaderMap::new()));
    }

    #[test]
    fn test_if_none_match_takes_precedence_over_date() {
        let v = validators();
        let map = headers(&[
            (header::IF_NONE_MATCH, "\"other\""),
            (header::IF_MODIFIED_SINCE, "Tue, 14 Nov 2023 22:13:20 GMT"),
        ]);
        assert!(!v.not_modified(&map));
    }

    #[test]
    fn test_if_range() {
        let v = validators();
        assert!(v.range_allowed(&HeaderMap::new()));
        assert!(v.range_allowed(&headers(&[(header::IF_RANGE, "Tue, 14 Nov 2023 22:13:20 GMT")])));
        assert!(!v.range_allowed(&headers(&[(header::IF_RANGE, "Mon, 13 Nov 2023 00:00:00 GMT")])));
        assert!(!v.range_allowed(&headers(&[(header::IF_RANGE, v.etag.as_str())])));
    }
}
