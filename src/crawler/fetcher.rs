//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client with the crawler's user agent
//! - Issuing one request per job with a bounded body read
//! - Classifying transport failures
//!
//! There is no retry logic: a failed fetch is counted by the session and
//! the job is dropped.

use crate::config::Config;
use crate::crawler::job::{CompletedJob, Job, Response};
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of redirects followed for one job
const MAX_REDIRECTS: usize = 10;

/// Transport-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects: {0}")]
    Redirect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_redirect() {
            FetchError::Redirect(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Builds the HTTP client shared by every worker of a session
///
/// Connect and read timeouts come from `[crawler]`; the User-Agent comes
/// from `[user-agent]`. Seeds are plain `http://` URLs, so HTTPS is not
/// enforced.
///
/// # Example
///
/// ```no_run
/// use disco_crawl::config::Config;
/// use disco_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_millis(config.crawler.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.crawler.connect_timeout_ms))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one job
///
/// Any HTTP status counts as a successful fetch; deciding what to do with a
/// non-2xx page is left to the pipeline. The body read stops one byte past
/// `max_body_bytes` so an oversized page never sits fully in memory, while
/// the pipeline can still tell it was too large.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `job` - The job to fetch
/// * `max_body_bytes` - Body size ceiling applied later by the pipeline
pub async fn fetch_job(
    client: &Client,
    job: Job,
    max_body_bytes: usize,
) -> Result<CompletedJob, FetchError> {
    let mut request = client.request(job.method().as_reqwest(), job.url().clone());
    for (name, value) in job.headers() {
        request = request.header(name.as_str(), value.as_str());
    }

    let mut response = request.send().await?;
    let status = response.status().as_u16();

    let headers = collect_headers(response.headers());

    let limit = max_body_bytes.saturating_add(1);
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!("fetch: {} body exceeds {} bytes, truncated", job.url(), max_body_bytes);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(CompletedJob {
        job,
        response: Response { status, headers },
        body,
    })
}

/// Lowercased response headers; a repeated header keeps its first value
fn collect_headers(map: &HeaderMap) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }
    headers
}
