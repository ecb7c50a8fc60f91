//! Robots.txt handling module
//!
//! Robots rules are fetched once per crawl session. The fetch is wrapped in a
//! hard deadline: running out of time aborts the session, while any other
//! problem (network error, odd status, garbage content) means "no
//! restrictions".

mod parser;

pub use parser::ParsedRobots;

use crate::CrawlError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Fetches and parses `/robots.txt` for the site rooted at `root`
///
/// # Returns
///
/// * `Ok(Some(ParsedRobots))` - Rules were loaded (401/403 load as "disallow all")
/// * `Ok(None)` - No usable robots.txt; the crawl proceeds unrestricted
/// * `Err(CrawlError::RobotsTimeout)` - The deadline expired, or the request
///   itself timed out
pub async fn fetch_robots(
    client: &Client,
    root: &Url,
    deadline: Duration,
) -> Result<Option<ParsedRobots>, CrawlError> {
    let robots_url = root.join("/robots.txt")?;
    let domain = root.host_str().unwrap_or_default().to_string();

    tracing::debug!("Fetching {}", robots_url);

    // Dropping the inner future on expiry releases the connection. The
    // per-request timeout replaces the client's page timeout, so the
    // deadline is the only limit on the fetch.
    let fetched = tokio::time::timeout(deadline, async {
        let response = client
            .get(robots_url.clone())
            .timeout(deadline)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    })
    .await;

    match fetched {
        Err(_) => Err(CrawlError::RobotsTimeout { domain }),
        Ok(Err(e)) if e.is_timeout() => Err(CrawlError::RobotsTimeout { domain }),
        Ok(Err(e)) => {
            tracing::warn!("Could not fetch {}: {}; assuming no restrictions", robots_url, e);
            Ok(None)
        }
        Ok(Ok((status, body))) => Ok(rules_for_response(status, &body)),
    }
}

/// Maps a robots.txt response onto the rules the session will obey
fn rules_for_response(status: StatusCode, body: &str) -> Option<ParsedRobots> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(ParsedRobots::disallow_all());
    }
    if !status.is_success() {
        return None;
    }
    Some(ParsedRobots::from_content(body))
}
