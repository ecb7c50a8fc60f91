//! Output module for publishing crawl results
//!
//! This module handles:
//! - The Record produced for every processed page
//! - Chunked publishing of a session's Records to a result sink
//! - Reading published results back for frontier expansion

mod publish;
mod record;
mod sinks;
mod traits;

pub use publish::publish_records;
pub use record::Record;
pub use sinks::{JsonLinesSink, StdoutSink};
pub use traits::{PublishError, PublishReport, PublishResult, ResultSink};

use std::path::Path;

/// Reads every Record from a JSON-lines results file
///
/// Each non-empty line must hold a JSON array of Records, as written by
/// [`JsonLinesSink`].
pub fn read_results(path: &Path) -> PublishResult<Vec<Record>> {
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        let batch: Vec<Record> = serde_json::from_str(line)?;
        records.extend(batch);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_back_published_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");
        let sink = JsonLinesSink::new(&path);

        let record = Record {
            identifier: "http://example.com/".to_string(),
            owner: "example.com".to_string(),
            hash: "00".repeat(32),
            title: String::new(),
            description: String::new(),
            author: "unknown".to_string(),
            date_created: Some("2015-10-21T07:28:00+00:00".to_string()),
            classification: "UNCLASSIFIED".to_string(),
            language: "en-us".to_string(),
            size: 1,
            mime_type: "text/html".to_string(),
            storage_key: "00".repeat(32),
            external_domains: vec!["other.org".to_string()],
            links: vec![],
            keywords: vec![],
        };
        let records = vec![record.clone(), record];

        // Force one record per message
        let report = publish_records(&sink, &records, 1, 10).await.unwrap();
        assert_eq!(report.sent, 2);

        let read = read_results(&path).unwrap();
        assert_eq!(read, records);
    }
}
