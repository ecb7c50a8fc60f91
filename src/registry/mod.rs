//! Frontier expansion across domains
//!
//! Every external domain found during a crawl is a candidate for its own
//! crawl. The registry makes sure a domain is enqueued at most once across
//! the fleet; the check-then-mark is best effort, and a race that enqueues a
//! domain twice only costs a duplicate crawl.

mod queue;
mod schema;
mod sqlite;

pub use queue::{DomainQueue, FileDomainQueue};
pub use sqlite::SqliteDomainRegistry;

use crate::output::Record;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Key/value store of domains already handed to the request queue
pub trait DomainRegistry {
    fn exists(&self, domain: &str) -> RegistryResult<bool>;

    /// Records that a domain has been enqueued
    fn mark(&mut self, domain: &str, seen_at: DateTime<Utc>) -> RegistryResult<()>;
}

/// Counters from one expansion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Distinct external domains across the Records
    pub considered: usize,
    /// Domains pushed to the request queue
    pub enqueued: usize,
    /// Domains the registry already knew
    pub known: usize,
}

/// Enqueues every unseen external domain referenced by `records`
pub fn expand_frontier(
    records: &[Record],
    registry: &mut dyn DomainRegistry,
    queue: &mut dyn DomainQueue,
) -> RegistryResult<ExpansionReport> {
    let mut report = ExpansionReport::default();
    let mut batch = HashSet::new();

    for domain in records.iter().flat_map(|r| r.external_domains.iter()) {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() || !batch.insert(domain.clone()) {
            continue;
        }
        report.considered += 1;

        if registry.exists(&domain)? {
            report.known += 1;
            continue;
        }

        // Queued before marked: a failed push leaves the domain unmarked so a
        // later pass retries it, at worst crawling it twice
        queue.push(&domain)?;
        registry.mark(&domain, Utc::now())?;
        report.enqueued += 1;
        tracing::debug!("expand: enqueued {}", domain);
    }

    tracing::info!(
        "expand: {} domains considered, {} enqueued, {} already known",
        report.considered,
        report.enqueued,
        report.known
    );
    Ok(report)
}
