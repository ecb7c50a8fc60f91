//! HTML extraction for fetched pages
//!
//! This module pulls out everything the pipeline needs from one page:
//! - Anchor hrefs to classify and follow
//! - Title, description and keywords for the record
//! - The declared document language

use crate::url::is_ignored_href;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeSet;

/// Paragraphs longer than this are preferred for the description
const PREFERRED_PARAGRAPH_CHARS: usize = 150;

/// Maximum description length (characters)
const MAX_DESCRIPTION_CHARS: usize = 300;

/// Heading words must be longer than this to become keywords
const MIN_KEYWORD_CHARS: usize = 6;

/// Elements whose content never contributes to descriptive text
const EXCLUDED_CONTAINERS: &[&str] = &["script", "style", "ul", "table", "form"];

/// Content extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// Title with line breaks removed; empty if the page has none
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// Lowercased `<html lang>` value
    pub language: Option<String>,
    /// Raw anchor hrefs in document order, ignored schemes already dropped
    pub hrefs: Vec<String>,
}

/// Parses an HTML document and extracts its content
///
/// # Example
///
/// ```
/// use disco_crawl::crawler::extract_page;
///
/// let html = r#"<html lang="en"><head><title>Test</title></head>
///     <body><a href="/page">Link</a></body></html>"#;
/// let page = extract_page(html);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.hrefs, vec!["/page"]);
/// ```
pub fn extract_page(html: &str) -> PageContent {
    let document = Html::parse_document(html);

    PageContent {
        title: extract_title(&document),
        description: extract_description(&document),
        keywords: extract_keywords(&document),
        language: extract_language(&document),
        hrefs: extract_hrefs(&document),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn extract_title(document: &Html) -> String {
    let Some(title_selector) = selector("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .replace(['\r', '\n'], "")
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

fn extract_language(document: &Html) -> Option<String> {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Some(a_selector) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !is_ignored_href(href))
        .map(str::to_string)
        .collect()
}

/// True if the node sits inside an element that is stripped for text
fn is_excluded(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| EXCLUDED_CONTAINERS.contains(&el.name()))
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks the description text
///
/// The first paragraph longer than 150 characters that does not mention
/// "script" wins; otherwise the longest paragraph; otherwise the visible
/// text of the whole page.
fn extract_description(document: &Html) -> String {
    let paragraphs: Vec<String> = selector("p")
        .map(|p_selector| {
            document
                .select(&p_selector)
                .filter(|p| !is_excluded(*p))
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let chosen = paragraphs
        .iter()
        .find(|p| p.chars().count() > PREFERRED_PARAGRAPH_CHARS && !p.contains("script"))
        .or_else(|| paragraphs.iter().max_by_key(|p| p.chars().count()))
        .cloned()
        .unwrap_or_else(|| page_text(document));

    chosen
        .chars()
        .take(MAX_DESCRIPTION_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Visible text of the body, outside the excluded containers
fn page_text(document: &Html) -> String {
    let Some(body_selector) = selector("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let inside_excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| EXCLUDED_CONTAINERS.contains(&el.name()))
        });
        if !inside_excluded && !text.trim().is_empty() {
            parts.push(text.trim().to_string());
        }
    }

    collapse_whitespace(&parts.join(" "))
}

/// Distinct, sorted heading words longer than six characters
fn extract_keywords(document: &Html) -> Vec<String> {
    let Some(heading_selector) = selector("h1, h2, h3, h4") else {
        return Vec::new();
    };

    let keywords: BTreeSet<String> = document
        .select(&heading_selector)
        .flat_map(|heading| {
            heading
                .text()
                .collect::<String>()
                .split_whitespace()
                .map(|word| {
                    word.trim_matches(|c: char| !c.is_alphanumeric())
                        .to_lowercase()
                })
                .collect::<Vec<_>>()
        })
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .collect();

    keywords.into_iter().collect()
}
