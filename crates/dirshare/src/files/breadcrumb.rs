//! Breadcrumb navigation built from a display path.

use serde::Serialize;

use super::resolver::DisplayPath;

/// One ancestor segment of the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Last path segment.
    pub name: String,
    /// Cumulative path from the root to this segment, without a leading `/`.
    pub path: String,
}

/// Decompose `display` into breadcrumbs, root first.
///
/// The last breadcrumb's path equals the display path without its leading
/// separator. The root itself yields no breadcrumb.
pub fn build_breadcrumbs(display: &DisplayPath) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::new();
    let mut cumulative = String::new();

    for segment in display.segments() {
        if !cumulative.is_empty() {
            cumulative.push('/');
        }
        cumulative.push_str(segment);
        crumbs.push(Breadcrumb {
            name: segment.to_string(),
            path: cumulative.clone(),
        });
    }

    crumbs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumb(name: &str, path: &str) -> Breadcrumb {
        Breadcrumb {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_root_has_no_breadcrumbs() {
        assert!(build_breadcrumbs(&DisplayPath::root()).is_empty());
        assert!(build_breadcrumbs(&DisplayPath::new("")).is_empty());
    }

    #[test]
    fn test_single_segment() {
        assert_eq!(
            build_breadcrumbs(&DisplayPath::new("/docs")),
            vec![crumb("docs", "docs")]
        );
    }

    #[test]
    fn test_nested_root_to_leaf() {
        assert_eq!(
            build_breadcrumbs(&DisplayPath::new("/docs/reports/q1")),
            vec![
                crumb("docs", "docs"),
                crumb("reports", "docs/reports"),
                crumb("q1", "docs/reports/q1"),
            ]
        );
    }

    #[test]
    fn test_last_breadcrumb_matches_display_path() {
        let display = DisplayPath::new("/a/b c/d");
        let crumbs = build_breadcrumbs(&display);

        assert_eq!(crumbs.len(), display.segments().count());
        assert_eq!(crumbs.last().unwrap().path, display.relative());
    }
}
