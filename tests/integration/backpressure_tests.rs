use crate::common::{domain_of, mount_page, page_requests, test_config};
use async_trait::async_trait;
use disco_crawl::crawler::crawl_domain;
use disco_crawl::storage::{ObjectStore, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use wiremock::MockServer;

/// Object store that lets the first put through and holds the rest
struct GatedStore {
    puts: AtomicUsize,
    gate: Semaphore,
}

#[async_trait]
impl ObjectStore for GatedStore {
    async fn put(&self, _key: &str, _body: &[u8]) -> StorageResult<()> {
        if self.puts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(());
        }
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_pipeline_bounds_fetches() {
    let server = MockServer::start().await;
    let pages: Vec<String> = (0..20).map(|i| format!("/p{}", i)).collect();
    let links: Vec<&str> = pages.iter().map(String::as_str).collect();
    mount_page(&server, "/", &links).await;
    for page in &pages {
        mount_page(&server, page, &[]).await;
    }

    let mut config = test_config();
    config.crawler.worker_count = 2;
    config.crawler.pipeline_capacity = 1;

    let store = Arc::new(GatedStore {
        puts: AtomicUsize::new(0),
        gate: Semaphore::new(0),
    });
    let domain = domain_of(&server);
    let crawl = {
        let store = store.clone();
        tokio::spawn(async move { crawl_domain(&config, &domain, store).await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;

    // Root, the page stuck in the pipeline, one queued, and one held by each worker
    let fetched = page_requests(&server).await;
    assert!(fetched <= 1 + 1 + 1 + 2, "fetched {} pages", fetched);
    assert!(!crawl.is_finished());

    store.gate.add_permits(100);
    let report = crawl.await.unwrap().unwrap();
    assert_eq!(report.records.len(), 21);
    assert_eq!(page_requests(&server).await, 21);
}
