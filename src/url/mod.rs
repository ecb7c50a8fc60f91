//! URL handling module for Disco Crawl
//!
//! This module provides host-spelling scope checks, link resolution and
//! normalization, and domain-class lookup for page caps.

mod domain;
mod normalize;

pub use domain::{netloc, DomainScope};
pub use normalize::{is_ignored_href, normalize_url, resolve_link};

/// Coarse domain classes used to pick a page-count ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainClass {
    /// Government sites get the higher ceiling
    Government,
    /// Everything else
    General,
}

/// Classifies a domain against a list of wildcard patterns
///
/// A pattern is either an exact host (`agency.gov.au`) or a wildcard
/// (`*.gov.au`) that matches the base itself and any subdomain of it.
///
/// # Examples
///
/// ```
/// use disco_crawl::url::{classify_domain, DomainClass};
///
/// let patterns = vec!["*.gov.au".to_string()];
/// assert_eq!(classify_domain("health.gov.au", &patterns), DomainClass::Government);
/// assert_eq!(classify_domain("example.com", &patterns), DomainClass::General);
/// ```
pub fn classify_domain(domain: &str, government_patterns: &[String]) -> DomainClass {
    let domain = domain.to_lowercase();
    // Ports never take part in classification
    let host = domain.split(':').next().unwrap_or_default();

    if government_patterns
        .iter()
        .any(|pattern| matches_pattern(&pattern.to_lowercase(), host))
    {
        DomainClass::Government
    } else {
        DomainClass::General
    }
}

fn matches_pattern(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}
