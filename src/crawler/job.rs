//! Units of fetch work
//!
//! A [`Job`] is the immutable request half. Workers never mutate it: a
//! successful fetch produces a separate [`CompletedJob`] that owns the job
//! together with the response metadata and body.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// Headers sent with every request unless overridden
///
/// Accept-Encoding is left to the HTTP client so it can decompress bodies.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("cache-control", "max-age=0"),
];

/// HTTP method of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
}

impl Method {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

/// One fetch request
///
/// Identity is the URL alone: two jobs with the same URL hash and compare
/// equal regardless of headers, method or metadata.
#[derive(Debug, Clone)]
pub struct Job {
    url: Url,
    method: Method,
    headers: BTreeMap<String, String>,
    meta: Option<serde_json::Value>,
}

impl Job {
    /// Creates a GET job with the default headers
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::Get,
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            meta: None,
        }
    }

    /// Merges caller headers over the defaults (names are case-insensitive)
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers
                .insert(name.into().to_ascii_lowercase(), value.into());
        }
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Attaches opaque metadata carried through to the pipeline
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The frontier key of this job
    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Job {}

impl Hash for Job {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Job: {}>", self.url)
    }
}

/// Status line and headers of a fetched response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Header names are lowercased
    pub headers: BTreeMap<String, String>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A job after a successful fetch
///
/// Built once by a worker and consumed once by the pipeline.
#[derive(Debug)]
pub struct CompletedJob {
    pub job: Job,
    pub response: Response,
    pub body: Vec<u8>,
}

impl CompletedJob {
    pub fn url(&self) -> &Url {
        self.job.url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn job(url: &str) -> Job {
        Job::new(Url::parse(url).unwrap())
    }

    #[test]
    fn test_identity_is_url_only() {
        let a = job("http://example.com/a");
        let b = job("http://example.com/a")
            .with_method(Method::Head)
            .with_headers([("X-Test", "1")])
            .with_meta(serde_json::json!({"depth": 3}));

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_distinct_urls_differ() {
        assert_ne!(job("http://example.com/a"), job("http://example.com/b"));
    }

    #[test]
    fn test_default_headers_merged_with_overrides() {
        let j = job("http://example.com/").with_headers([("Cache-Control", "no-cache")]);
        assert_eq!(j.headers().get("cache-control").unwrap(), "no-cache");
        assert!(j.headers().contains_key("accept"));
        assert_eq!(j.headers().len(), 2);
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let response = Response {
            status: 200,
            headers: [("content-type".to_string(), "text/html".to_string())]
                .into_iter()
                .collect(),
        };
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert!(response.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            job("http://example.com/x").to_string(),
            "<Job: http://example.com/x>"
        );
    }
}
