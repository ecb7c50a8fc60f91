//! SQLite domain registry
//!
//! Stands in for the fleet-wide key/value store: one row per domain that has
//! been enqueued, with the time it was first seen.

use crate::registry::schema::initialize_schema;
use crate::registry::{DomainRegistry, RegistryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed registry
pub struct SqliteDomainRegistry {
    conn: Connection,
}

impl SqliteDomainRegistry {
    /// Opens (or creates) the registry database at `path`
    pub fn new(path: &Path) -> RegistryResult<Self> {
        let conn = Connection::open(path)?;

        // Several manager processes may share one file
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory registry
    pub fn new_in_memory() -> RegistryResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// When a domain was first marked, if ever
    pub fn first_seen(&self, domain: &str) -> RegistryResult<Option<String>> {
        let first_seen = self
            .conn
            .query_row(
                "SELECT first_seen FROM seen_domains WHERE domain = ?1",
                params![domain.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(first_seen)
    }

    /// Number of registered domains
    pub fn count(&self) -> RegistryResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_domains", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl DomainRegistry for SqliteDomainRegistry {
    fn exists(&self, domain: &str) -> RegistryResult<bool> {
        Ok(self.first_seen(domain)?.is_some())
    }

    fn mark(&mut self, domain: &str, seen_at: DateTime<Utc>) -> RegistryResult<()> {
        // The first sighting wins; a concurrent mark is harmless
        self.conn.execute(
            "INSERT OR IGNORE INTO seen_domains (domain, first_seen) VALUES (?1, ?2)",
            params![domain.to_lowercase(), seen_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_mark_then_exists() {
        let mut registry = SqliteDomainRegistry::new_in_memory().unwrap();
        assert!(!registry.exists("example.com").unwrap());

        registry.mark("Example.com", Utc::now()).unwrap();
        assert!(registry.exists("example.com").unwrap());
        assert_eq!(registry.count().unwrap(), 1);
    }

    #[test]
    fn test_first_sighting_is_kept() {
        let mut registry = SqliteDomainRegistry::new_in_memory().unwrap();
        let first = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

        registry.mark("example.com", first).unwrap();
        registry.mark("example.com", later).unwrap();

        assert_eq!(
            registry.first_seen("example.com").unwrap(),
            Some(first.to_rfc3339())
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.db");

        {
            let mut registry = SqliteDomainRegistry::new(&path).unwrap();
            registry.mark("example.com", Utc::now()).unwrap();
        }

        let registry = SqliteDomainRegistry::new(&path).unwrap();
        assert!(registry.exists("example.com").unwrap());
    }
}
