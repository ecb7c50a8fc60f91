//! Database schema for the domain registry

/// SQL schema for the registry database
pub const SCHEMA_SQL: &str = r#"
-- Domains already handed to the request queue
CREATE TABLE IF NOT EXISTS seen_domains (
    domain TEXT PRIMARY KEY,
    first_seen TEXT NOT NULL
);
"#;

/// Initializes the registry schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='seen_domains'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
