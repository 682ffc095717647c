//! HTML content extractor
//!
//! This module handles parsing fetched HTML to extract:
//! - The page title and first heading
//! - Visible body text (the input to lemmatization)
//! - Links to follow (from `<a>` tags)

use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Text of the first <h1>
    pub heading: Option<String>,

    /// Body text with markup stripped and whitespace collapsed
    pub text: String,

    /// Distinct links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

impl ParsedPage {
    /// Best available display title: `<title>`, then the first heading, then
    /// the beginning of the text
    pub fn display_title(&self, max_chars: usize) -> Option<String> {
        self.title.clone().or_else(|| self.heading.clone()).or_else(|| {
            let text = self.text.trim();
            (!text.is_empty()).then(|| text.chars().take(max_chars).collect())
        })
    }
}

/// Parses HTML content and extracts text, headings and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use sitelex::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_links(&document, base_url),
        ..extract_document_content(&document)
    }
}

/// Extracts title, heading and text of a stored page, without links
pub fn extract_content(html: &str) -> ParsedPage {
    extract_document_content(&Html::parse_document(html))
}

fn extract_document_content(document: &Html) -> ParsedPage {
    ParsedPage {
        title: first_text(document, "title"),
        heading: first_text(document, "h1"),
        text: extract_text(document),
        links: Vec::new(),
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|s| !s.is_empty())
}

fn extract_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_visible_text(body, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_visible_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => parts.push(text),
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then(|| absolute_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title_and_heading() {
        let html = r#"<html><head><title>  Test Page  </title></head>
            <body><h1>Main <em>heading</em></h1><h1>Second</h1></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
        assert_eq!(parsed.heading, Some("Main heading".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_html("<html><head></head><body></body></html>", &base_url());
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.heading, None);
        assert_eq!(parsed.display_title(80), None);
    }

    #[test]
    fn test_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>Ignored title</title><style>p { color: red }</style></head>
            <body><p>Visible   text</p><script>var hidden = 1;</script>
            <noscript>enable js</noscript><div>more <b>words</b></div></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.text, "Visible text more words");
    }

    #[test]
    fn test_display_title_fallbacks() {
        let with_heading = parse_html("<body><h1>Heading</h1>text</body>", &base_url());
        assert_eq!(with_heading.display_title(80), Some("Heading".to_string()));

        let text_only = parse_html("<body><p>abcdefghij</p></body>", &base_url());
        assert_eq!(text_only.display_title(4), Some("abcd".to_string()));
    }

    #[test]
    fn test_extract_content_has_no_links() {
        let content = extract_content("<title>T</title><p>one</p><p>two <a href=\"/x\">x</a></p>");
        assert_eq!(content.text, "one two x");
        assert_eq!(content.title, Some("T".to_string()));
        assert!(content.links.is_empty());
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<a href="/other">A</a><a href="sibling">B</a><a href="https://other.com/x">C</a>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/other".to_string(),
                "https://example.com/sibling".to_string(),
                "https://other.com/x".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_links_are_collapsed() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"
            <a href="javascript:void(0)">js</a>
            <a href="JavaScript:alert(1)">js upper</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">tel</a>
            <a href="data:text/html,hi">data</a>
            <a href="#section">anchor</a>
            <a href="/file.pdf" download>file</a>
            <a href="ftp://example.com/file">ftp</a>
            <a href="/valid">ok</a>
        "##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/valid".to_string()]);
    }
}
