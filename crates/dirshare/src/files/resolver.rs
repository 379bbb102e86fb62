//! Request path resolution against the served root.
//!
//! Request paths are cleaned lexically before they touch the filesystem, so
//! `..` segments can never climb above the root. The result carries both the
//! absolute path used for I/O and the display path used for rendering.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while resolving a request path.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The served root could not be opened.
    #[error("cannot open served root {path}: {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The served root exists but is not a directory.
    #[error("served root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// The request path is not valid percent-encoded UTF-8, or contains NUL.
    #[error("request path is not valid: {0}")]
    InvalidEncoding(String),

    /// The resolved path does not start with the served root.
    #[error("resolved path {path} is outside the served root")]
    OutsideRoot { path: PathBuf },
}

/// Request path relative to the served root, always in rooted form.
///
/// `/` denotes the root itself; other values look like `/docs/reports`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayPath(String);

impl DisplayPath {
    /// The root display path (`/`).
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Build a display path from slash separated text, normalizing it.
    pub fn new(path: &str) -> Self {
        Self(clean_request_path(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its leading separator (`docs/reports`, or empty).
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Non-empty path segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Display path of a direct child named `name`.
    pub fn join(&self, name: &str) -> DisplayPath {
        if self.is_root() {
            DisplayPath::new(&format!("/{name}"))
        } else {
            DisplayPath::new(&format!("{}/{}", self.0, name))
        }
    }
}

impl fmt::Display for DisplayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request path resolved against the served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute filesystem path, always under the served root.
    pub absolute: PathBuf,
    /// Request path relative to the served root.
    pub display: DisplayPath,
}

/// The directory exposed by the server.
///
/// Fixed at startup and immutable afterwards; share it by cloning or behind
/// an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedRoot {
    path: PathBuf,
}

impl ServedRoot {
    /// Canonicalize `path` and check it is a directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|source| ResolveError::InvalidRoot {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata = fs::metadata(&canonical).map_err(|source| ResolveError::InvalidRoot {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ResolveError::RootNotDirectory(canonical));
        }

        Ok(Self { path: canonical })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Map a raw (percent-encoded) request path onto the served tree.
    ///
    /// Existence is not checked.
    pub fn resolve(&self, request_path: &str) -> Result<ResolvedPath, ResolveError> {
        let decoded = urlencoding::decode(request_path)
            .map_err(|_| ResolveError::InvalidEncoding(request_path.to_string()))?;
        if decoded.contains('\0') {
            return Err(ResolveError::InvalidEncoding(request_path.to_string()));
        }

        let cleaned = clean_request_path(&decoded);
        let mut absolute = self.path.clone();
        for segment in cleaned.split('/').filter(|s| !s.is_empty()) {
            absolute.push(segment);
        }

        let display = self.display_path(&absolute)?;
        Ok(ResolvedPath { absolute, display })
    }

    /// Strip the root prefix from `absolute`, component-wise.
    pub fn display_path(&self, absolute: &Path) -> Result<DisplayPath, ResolveError> {
        let relative = absolute
            .strip_prefix(&self.path)
            .map_err(|_| ResolveError::OutsideRoot {
                path: absolute.to_path_buf(),
            })?;

        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(DisplayPath::new(&format!("/{}", segments.join("/"))))
    }
}

/// Lexically clean a slash separated path into rooted form.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and
/// is discarded at the root. The result always starts with `/` and never ends
/// with one unless it is the root.
pub fn clean_request_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}
