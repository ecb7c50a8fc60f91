use crate::UrlError;
use url::Url;

/// Returns the `host[:port]` part of a URL, lowercased
///
/// The port is only included when it differs from the scheme default, so
/// `http://Example.com:80/` and `http://example.com/` share a netloc.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use disco_crawl::url::netloc;
///
/// let url = Url::parse("http://Example.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// The two accepted spellings of the domain being crawled
///
/// A crawl of `example.com` treats `example.com` and `www.example.com` as
/// the same site; any other host is external.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    domain_name: String,
    pure_domain: String,
    www_domain: String,
}

impl DomainScope {
    /// Builds the scope from a bare domain name such as `www.example.com`
    ///
    /// A trailing `/` is tolerated. Anything carrying a scheme, a path or
    /// whitespace is rejected.
    pub fn new(domain_name: &str) -> Result<Self, UrlError> {
        let domain_name = domain_name.trim_end_matches('/').to_lowercase();

        if domain_name.is_empty() {
            return Err(UrlError::MissingDomain);
        }
        if domain_name.contains("://")
            || domain_name.contains('/')
            || domain_name.chars().any(char::is_whitespace)
        {
            return Err(UrlError::Malformed(format!(
                "expected a bare domain name, got '{}'",
                domain_name
            )));
        }

        // Make sure the name forms a usable URL host
        Url::parse(&format!("http://{}/", domain_name))
            .map_err(|e| UrlError::Parse(format!("{}: {}", domain_name, e)))?;

        let pure_domain = domain_name
            .strip_prefix("www.")
            .unwrap_or(&domain_name)
            .to_string();
        let www_domain = format!("www.{}", pure_domain);

        Ok(Self {
            domain_name,
            pure_domain,
            www_domain,
        })
    }

    /// The domain as it was requested (lowercased)
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn pure_domain(&self) -> &str {
        &self.pure_domain
    }

    pub fn www_domain(&self) -> &str {
        &self.www_domain
    }

    /// The seed URL of the crawl
    pub fn first_url(&self) -> Result<Url, UrlError> {
        Url::parse(&format!("http://{}/", self.domain_name))
            .map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// Returns true if a link's netloc belongs to this site
    ///
    /// An empty netloc (relative link) is always local.
    pub fn is_local(&self, netloc: &str) -> bool {
        if netloc.is_empty() {
            return true;
        }
        let netloc = netloc.to_lowercase();
        netloc == self.pure_domain || netloc == self.www_domain
    }
}
