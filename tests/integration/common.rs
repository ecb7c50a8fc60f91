use disco_crawl::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Content type every mock page is served with
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Configuration with every politeness wait switched off
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.politeness.default_delay_ms = 0;
    config.politeness.min_delay_ms = 0;
    config.politeness.jitter_min_ms = 0;
    config.politeness.jitter_max_ms = 0;
    config.politeness.robots_timeout_ms = 2_000;
    config.crawler.request_timeout_ms = 2_000;
    config.crawler.connect_timeout_ms = 1_000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// The bare `host:port` a crawl of the mock server starts from
pub fn domain_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// An HTML page linking to each of `links`
pub fn html_page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">{}</a>"#, link, link))
        .collect();
    let body = format!(
        "<html><head><title>{}</title></head><body><p>{} page</p>{}</body></html>",
        title, title, anchors
    );
    ResponseTemplate::new(200).set_body_raw(body, HTML_CONTENT_TYPE)
}

/// Mounts a GET handler for `page_path` serving a page with `links`
pub async fn mount_page(server: &MockServer, page_path: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(page_path, links))
        .mount(server)
        .await;
}

/// Number of requests the server saw, robots.txt excluded
pub async fn page_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() != "/robots.txt")
        .count()
}
