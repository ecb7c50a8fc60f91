use crate::common::{
    domain_of, html_page, mount_page, page_requests, test_config, HTML_CONTENT_TYPE,
};
use disco_crawl::crawler::{crawl_domain, Suppression};
use disco_crawl::storage::{content_hash, FsObjectStore, MemoryObjectStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_internal_and_external_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &[
            "/a",
            "b",
            "/c/",
            "https://external-one.example/x",
            "http://external-two.example/",
            "mailto:someone@example.com",
        ],
    )
    .await;
    mount_page(&server, "/a", &["/", "/b"]).await;
    mount_page(&server, "/b", &["/a"]).await;
    mount_page(&server, "/c", &[]).await;

    let store = MemoryObjectStore::new();
    let report = crawl_domain(&test_config(), &domain_of(&server), Arc::new(store.clone()))
        .await
        .unwrap();

    let base = format!("http://{}", domain_of(&server));
    assert_eq!(
        report.seen_urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/c", base),
        ]
    );
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.dispatched, 4);
    assert_eq!(report.error_count, 0);
    assert!(!report.discovery_suppressed());

    let root = report
        .records
        .iter()
        .find(|r| r.identifier == format!("{}/", base))
        .unwrap();
    assert_eq!(
        root.external_domains,
        vec!["external-one.example", "external-two.example"]
    );
    assert_eq!(root.owner, domain_of(&server));
    assert_eq!(root.title, "/");
    assert_eq!(root.mime_type, HTML_CONTENT_TYPE);
    let wire = serde_json::to_value(root).unwrap();
    assert_eq!(wire["MIMEType"], HTML_CONTENT_TYPE);
    assert_eq!(root.language, "en-us");

    // Every record's body made it to the store under its hash
    assert_eq!(store.len(), 4);
    for record in &report.records {
        assert!(store.get(&record.storage_key).is_some());
    }

    // Each page was requested exactly once
    assert_eq!(page_requests(&server).await, 4);
}

#[tokio::test]
async fn test_concurrent_fetches_overlap() {
    let server = MockServer::start().await;
    let latency = Duration::from_millis(200);
    let pages: Vec<String> = (1..10).map(|i| format!("/p{}", i)).collect();
    let links: Vec<&str> = pages.iter().map(String::as_str).collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("root", &links).set_delay(latency))
        .mount(&server)
        .await;
    for page in &pages {
        Mock::given(method("GET"))
            .and(path(page.as_str()))
            .respond_with(html_page(page, &[]).set_delay(latency))
            .mount(&server)
            .await;
    }

    let mut config = test_config();
    config.crawler.worker_count = 2;

    let started = Instant::now();
    let report = crawl_domain(&config, &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.records.len(), 10);
    // The root, then nine pages two at a time: six rounds instead of ten
    assert!(elapsed >= latency * 6, "took {:?}", elapsed);
    assert!(elapsed < latency * 9, "took {:?}", elapsed);
}

#[tokio::test]
async fn test_error_ceiling_stops_discovery() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/f1", "/f2", "/f3", "/page"]).await;
    for slow in ["/f1", "/f2", "/f3"] {
        Mock::given(method("GET"))
            .and(path(slow))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
    }
    mount_page(&server, "/page", &["/deep"]).await;
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html_page("deep", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.worker_count = 1;
    config.crawler.request_timeout_ms = 300;
    config.policy.max_errors = 2;

    let report = crawl_domain(&config, &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();

    assert_eq!(report.error_count, 3);
    assert_eq!(report.suppression, Some(Suppression::ErrorCeiling));
    // The root and /page still produce records
    assert_eq!(report.records.len(), 2);
    assert!(!report.seen_urls.iter().any(|u| u.ends_with("/deep")));
}

#[tokio::test]
async fn test_page_cap_limits_the_session() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/1", "/2", "/3", "/4", "/5"]).await;
    for page in ["/1", "/2", "/3", "/4", "/5"] {
        mount_page(&server, page, &["/6"]).await;
    }

    let mut config = test_config();
    config.policy.page_cap = 3;

    let report = crawl_domain(&config, &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();

    assert_eq!(report.seen_urls.len(), 3);
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.suppression, Some(Suppression::PageCap));
    assert_eq!(page_requests(&server).await, 3);
}

#[tokio::test]
async fn test_skipped_pages_produce_no_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/image", "/missing", "/big"]).await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0u8; 64], "image/webp"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("x".repeat(4096), "text/html"),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.max_body_bytes = 1024;

    let report = crawl_domain(&config, &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.pages.skipped, 3);
    assert_eq!(report.error_count, 0);
}

#[tokio::test]
async fn test_storage_keys_are_stable_across_crawls() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/about"]).await;
    mount_page(&server, "/about", &[]).await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path().join("pages")));
    let config = test_config();
    let domain = domain_of(&server);

    let first = crawl_domain(&config, &domain, store.clone()).await.unwrap();
    let second = crawl_domain(&config, &domain, store.clone()).await.unwrap();

    let mut first_keys: Vec<String> = first.records.iter().map(|r| r.storage_key.clone()).collect();
    let mut second_keys: Vec<String> = second.records.iter().map(|r| r.storage_key.clone()).collect();
    first_keys.sort();
    second_keys.sort();
    assert_eq!(first_keys, second_keys);

    for key in &first_keys {
        let body = std::fs::read(store.object_path(key).unwrap()).unwrap();
        assert_eq!(&content_hash(&body), key);
    }
    assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 2);
}
