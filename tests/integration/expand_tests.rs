use crate::common::{domain_of, mount_page, test_config};
use disco_crawl::crawler::crawl_domain;
use disco_crawl::output::{publish_records, read_results, JsonLinesSink};
use disco_crawl::registry::{expand_frontier, FileDomainQueue, SqliteDomainRegistry};
use disco_crawl::storage::MemoryObjectStore;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

#[tokio::test]
async fn test_crawl_publish_expand() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &["/news", "https://Partner.example/", "https://cdn.example/lib.js"],
    )
    .await;
    mount_page(&server, "/news", &["https://partner.example/feed", "//media.example/x"]).await;

    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results.jsonl");
    let config = test_config();

    let report = crawl_domain(&config, &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();
    assert_eq!(report.records.len(), 2);

    let sink = JsonLinesSink::new(&results);
    let published = publish_records(
        &sink,
        &report.records,
        config.output.chunk_size,
        config.output.max_message_bytes,
    )
    .await
    .unwrap();
    assert!(published.is_complete());
    assert_eq!(published.sent, 1);

    let records = read_results(&results).unwrap();
    assert_eq!(records.len(), 2);

    let mut registry = SqliteDomainRegistry::new(&dir.path().join("registry.db")).unwrap();
    let queue_path = dir.path().join("queue.txt");
    let mut queue = FileDomainQueue::new(&queue_path);

    let first = expand_frontier(&records, &mut registry, &mut queue).unwrap();
    assert_eq!(first.considered, 3);
    assert_eq!(first.enqueued, 3);
    assert_eq!(first.known, 0);

    let mut queued: Vec<String> = std::fs::read_to_string(&queue_path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    queued.sort();
    assert_eq!(queued, vec!["cdn.example", "media.example", "partner.example"]);

    // A second pass over the same results enqueues nothing new
    let second = expand_frontier(&records, &mut registry, &mut queue).unwrap();
    assert_eq!(second.enqueued, 0);
    assert_eq!(second.known, 3);
    assert_eq!(registry.count().unwrap(), 3);
}
