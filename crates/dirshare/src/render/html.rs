//! Built-in HTML pages.

use maud::{html, Markup, DOCTYPE};

use super::{ListingRenderer, ListingView, RenderError, Template};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:60rem;padding:0 1rem;color:#222}\
nav{margin-bottom:1rem}nav a{text-decoration:none}\
table{width:100%;border-collapse:collapse}\
th,td{text-align:left;padding:.35rem .5rem;border-bottom:1px solid #eee}\
td.size,td.date{white-space:nowrap;color:#666}\
a.dir{font-weight:600}";

/// Renders the listing and not-found pages with `maud`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    fn index(&self, view: &ListingView) -> Markup {
        let title = match view.breadcrumbs.last() {
            Some(crumb) => format!("Index of /{}", crumb.path),
            None => "Index of /".to_string(),
        };

        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    style { (STYLE) }
                }
                body {
                    nav {
                        a href="/" { "Home" }
                        @for crumb in &view.breadcrumbs {
                            " / "
                            a href=(href(&crumb.path)) { (crumb.name) }
                        }
                    }
                    table {
                        thead {
                            tr { th { "Name" } th { "Size" } th { "Modified" } }
                        }
                        tbody {
                            @for entry in &view.entries {
                                tr {
                                    td {
                                        @if entry.is_dir {
                                            a.dir href=(href(&entry.path)) { (entry.name) "/" }
                                        } @else {
                                            a href=(href(&entry.path)) { (entry.name) }
                                        }
                                    }
                                    td.size { @if entry.is_dir { "-" } @else { (entry.size) } }
                                    td.date { (entry.modified) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn not_found(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { "404 Not Found" }
                    style { (STYLE) }
                }
                body {
                    h1 { "404 Not Found" }
                    p { "The requested path does not exist." }
                    p { a href="/" { "Back to the root" } }
                }
            }
        }
    }
}

impl ListingRenderer for HtmlRenderer {
    fn render(&self, template: Template<'_>) -> Result<Vec<u8>, RenderError> {
        let markup = match template {
            Template::Index(view) => self.index(view),
            Template::NotFound => self.not_found(),
        };
        Ok(markup.into_string().into_bytes())
    }
}

/// Absolute link for a display path, each segment percent-encoded.
fn href(path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}
