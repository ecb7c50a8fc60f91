//! Link admission rules
//!
//! Every candidate internal link goes through the same ordered checks; the
//! first rejection wins and the link is dropped silently.
//!
//! 1. Extension blacklist
//! 2. Domain-class page cap
//! 3. Error ceiling
//! 4. Robots rules
//!
//! The link is resolved against the session root first so that steps 1 and
//! 4 see an absolute path.

use crate::config::PolicyConfig;
use crate::crawler::frontier::Suppression;
use crate::robots::ParsedRobots;
use crate::url::{classify_domain, resolve_link, DomainClass, DomainScope};
use url::Url;

/// Why a link was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not an http(s) link after resolution
    Unresolvable,
    BlockedExtension,
    PageCap,
    ErrorCeiling,
    Robots,
}

impl Rejection {
    /// Rejections that switch off discovery for the remaining session
    pub fn suppression(&self) -> Option<Suppression> {
        match self {
            Rejection::PageCap => Some(Suppression::PageCap),
            Rejection::ErrorCeiling => Some(Suppression::ErrorCeiling),
            _ => None,
        }
    }
}

/// The pure decision functions consulted before a link becomes a job
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    root: Url,
    page_cap: usize,
    max_errors: usize,
    blocked_extensions: Vec<String>,
    robots: Option<ParsedRobots>,
    robots_agent: String,
}

impl CrawlPolicy {
    /// Builds the policy for one session
    ///
    /// The page cap is chosen once from the domain class of the scope.
    pub fn new(
        config: &PolicyConfig,
        scope: &DomainScope,
        root: Url,
        robots: Option<ParsedRobots>,
        robots_agent: &str,
    ) -> Self {
        let page_cap = match classify_domain(scope.pure_domain(), &config.government_domains) {
            DomainClass::Government => config.government_page_cap,
            DomainClass::General => config.page_cap,
        };

        Self {
            root,
            page_cap,
            max_errors: config.max_errors,
            blocked_extensions: config
                .blocked_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            robots,
            robots_agent: robots_agent.to_string(),
        }
    }

    pub fn page_cap(&self) -> usize {
        self.page_cap
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn robots(&self) -> Option<&ParsedRobots> {
        self.robots.as_ref()
    }

    /// Resolves an internal href into its normalized absolute form
    pub fn resolve(&self, href: &str) -> Option<Url> {
        resolve_link(href, &self.root)
    }

    /// Applies the ordered checks to an already resolved URL
    ///
    /// # Arguments
    ///
    /// * `url` - Normalized absolute URL
    /// * `seen` - Current size of the session's seen-set
    /// * `errors` - Current session fetch error count
    pub fn check(&self, url: &Url, seen: usize, errors: usize) -> Result<(), Rejection> {
        let path = url.path().to_ascii_lowercase();
        if self
            .blocked_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
        {
            return Err(Rejection::BlockedExtension);
        }

        if seen >= self.page_cap {
            return Err(Rejection::PageCap);
        }

        if errors > self.max_errors {
            return Err(Rejection::ErrorCeiling);
        }

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(url.as_str(), &self.robots_agent) {
                return Err(Rejection::Robots);
            }
        }

        Ok(())
    }

    /// Resolves and checks in one step
    pub fn evaluate(&self, href: &str, seen: usize, errors: usize) -> Result<Url, Rejection> {
        let url = self.resolve(href).ok_or(Rejection::Unresolvable)?;
        self.check(&url, seen, errors)?;
        Ok(url)
    }
}
