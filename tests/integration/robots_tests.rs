use crate::common::{domain_of, mount_page, test_config};
use disco_crawl::crawler::{crawl_domain, CrawlSession};
use disco_crawl::storage::MemoryObjectStore;
use disco_crawl::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn forbid_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_disallowed_paths_are_never_requested() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
    )
    .await;
    mount_page(&server, "/", &["/private/page", "/public"]).await;
    mount_page(&server, "/public", &["/private/other"]).await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/other"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl_domain(&test_config(), &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(!report.seen_urls.iter().any(|u| u.contains("/private/")));
}

#[tokio::test]
async fn test_robots_timeout_aborts_session() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nAllow: /")
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    forbid_root(&server).await;

    let mut config = test_config();
    config.politeness.robots_timeout_ms = 200;

    let err = CrawlSession::open(&config, &domain_of(&server))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CrawlError::RobotsTimeout { .. }));
}

#[tokio::test]
async fn test_slow_robots_within_deadline_is_obeyed() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nDisallow: /\n")
            .set_delay(Duration::from_secs(1)),
    )
    .await;
    forbid_root(&server).await;

    // Slower than a page fetch may take, but inside the robots deadline
    let mut config = test_config();
    config.crawler.request_timeout_ms = 300;
    config.politeness.robots_timeout_ms = 5_000;

    let session = CrawlSession::open(&config, &domain_of(&server))
        .await
        .unwrap();
    assert!(session.robots().is_some());

    let report = session.run(Arc::new(MemoryObjectStore::new())).await.unwrap();
    assert_eq!(report.dispatched, 0);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_robots_deadline_applies_with_short_page_timeout() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nDisallow: /\n")
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    forbid_root(&server).await;

    let mut config = test_config();
    config.crawler.request_timeout_ms = 300;
    config.politeness.robots_timeout_ms = 1_000;

    let err = CrawlSession::open(&config, &domain_of(&server))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CrawlError::RobotsTimeout { .. }));
}

#[tokio::test]
async fn test_excessive_crawl_delay_aborts_session() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 120\n"),
    )
    .await;
    forbid_root(&server).await;

    let result = crawl_domain(&test_config(), &domain_of(&server), Arc::new(MemoryObjectStore::new())).await;
    match result {
        Err(CrawlError::CrawlDelayTooHigh { seconds, .. }) => assert_eq!(seconds, 120.0),
        other => panic!("unexpected result: {:?}", other.map(|r| r.records.len())),
    }
}

#[tokio::test]
async fn test_crawl_delay_sets_session_delay() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nCrawl-delay: 10\n\nUser-agent: TestBot\nCrawl-delay: 3\n"),
    )
    .await;

    let session = CrawlSession::open(&test_config(), &domain_of(&server))
        .await
        .unwrap();
    assert_eq!(session.delay(), Duration::from_secs(3));
    assert!(session.robots().is_some());
}

#[tokio::test]
async fn test_unreadable_robots_means_no_restrictions() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(500)).await;
    mount_page(&server, "/", &["/anything"]).await;
    mount_page(&server, "/anything", &[]).await;

    let report = crawl_domain(&test_config(), &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn test_forbidden_robots_disallows_everything() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(403)).await;
    forbid_root(&server).await;

    let report = crawl_domain(&test_config(), &domain_of(&server), Arc::new(MemoryObjectStore::new()))
        .await
        .unwrap();
    assert_eq!(report.dispatched, 0);
    assert!(report.records.is_empty());
    assert!(report.seen_urls.is_empty());
}
