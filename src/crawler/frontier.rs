//! Per-session seen-set
//!
//! The frontier is owned by the crawl session and only ever mutated by the
//! pipeline task, so membership test and insert happen without interleaving.

use std::collections::HashSet;
use std::fmt;

/// Why link discovery was switched off for the rest of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// The seen-set reached the domain-class page cap
    PageCap,
    /// The fetch error count went past the ceiling
    ErrorCeiling,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suppression::PageCap => write!(f, "page cap reached"),
            Suppression::ErrorCeiling => write!(f, "error ceiling exceeded"),
        }
    }
}

/// The set of URLs already scheduled in this session
///
/// Keys are normalized URL strings. The set only grows. Once suppressed, it
/// stays suppressed.
#[derive(Debug, Default)]
pub struct Frontier {
    seen: HashSet<String>,
    suppressed: Option<Suppression>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Inserts a key, returning true if it was not seen before
    pub fn insert(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Latches discovery off; the first reason is kept
    pub fn suppress(&mut self, reason: Suppression) {
        if self.suppressed.is_none() {
            self.suppressed = Some(reason);
        }
    }

    pub fn suppression(&self) -> Option<Suppression> {
        self.suppressed
    }

    /// Consumes the frontier, returning the seen URLs in sorted order
    pub fn into_sorted_urls(self) -> Vec<String> {
        let mut urls: Vec<String> = self.seen.into_iter().collect();
        urls.sort();
        urls
    }
}
