//! HTML page shells around rendered documents.

use scraper::{Html, Selector};

use crate::routing::NavEntry;

const PAGE_TEMPLATE: &str = include_str!("../../assets/page.html");

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Converter output split into what belongs in the shell's `<head>` and
/// the content itself.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderedParts {
    pub head: String,
    pub body: String,
}

fn is_standalone(html: &str) -> bool {
    let start = html.trim_start();
    let starts_with = |prefix: &str| {
        start
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts_with("<!doctype") || starts_with("<html")
}

/// Split a converter result.
///
/// A standalone document contributes its head elements (stylesheets,
/// scripts, meta) except `<title>`, which the shell owns, and the inner
/// HTML of its body. Anything else is a fragment and is used as is.
pub fn split_rendered(html: &str) -> RenderedParts {
    if !is_standalone(html) {
        return RenderedParts {
            head: String::new(),
            body: html.to_string(),
        };
    }

    let doc = Html::parse_document(html);
    let mut parts = RenderedParts::default();

    if let Ok(sel) = Selector::parse("head > *") {
        parts.head = doc
            .select(&sel)
            .filter(|element| element.value().name() != "title")
            .map(|element| element.html())
            .collect::<Vec<_>>()
            .join("\n");
    }
    if let Ok(sel) = Selector::parse("body")
        && let Some(body) = doc.select(&sel).next()
    {
        parts.body = body.inner_html();
    }

    parts
}

/// Fills the page template.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    template: String,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(PAGE_TEMPLATE)
    }
}

impl PageRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Home page: the navigation listing only.
    pub fn home(&self, navigation: &[NavEntry]) -> String {
        let content = if navigation.is_empty() {
            "<h1>No documents found</h1>".to_string()
        } else {
            format!("<h1>{} documents</h1>", navigation.len())
        };
        self.fill("home", "Documents", navigation, "", &content)
    }

    /// Not-found page. Still lists every document.
    pub fn not_found(&self, path: &str, navigation: &[NavEntry]) -> String {
        let content = format!("<h1>Nothing was found on {}</h1>", escape_html(path));
        self.fill("not-found", "Not found", navigation, "", &content)
    }

    /// Rendered document. A fragment is inserted verbatim; a standalone
    /// document is split with [`split_rendered`].
    pub fn document(&self, title: Option<&str>, file: &str, html: &str, navigation: &[NavEntry]) -> String {
        let parts = split_rendered(html);
        self.fill("document", title.unwrap_or(file), navigation, &parts.head, &parts.body)
    }

    fn fill(&self, kind: &str, title: &str, navigation: &[NavEntry], head: &str, content: &str) -> String {
        self.template
            .replace("<!--page-kind-->", kind)
            .replace("<!--app-head-->", head)
            .replace("<!--app-title-->", &escape_html(title))
            .replace("<!--navigation-->", &render_navigation(navigation))
            .replace("<!--app-html-->", content)
    }
}

/// One `router-link` block per entry, in the given order.
pub fn render_navigation(navigation: &[NavEntry]) -> String {
    navigation
        .iter()
        .map(|entry| {
            let file = escape_html(&entry.file);
            let route = escape_html(&entry.route);
            let label = entry.title.as_deref().map_or_else(|| file.clone(), escape_html);
            format!(
                r#"<div class="router-link" data-route="{route}" data-file="{file}"><span>{file}</span><a href="{route}">{label}</a></div>"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
