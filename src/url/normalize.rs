use url::Url;

/// Tracking query parameters dropped during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "mc_cid", "_ga"];

/// Schemes and prefixes of anchors that never lead to a crawlable page
const IGNORED_PREFIXES: &[&str] = &["#", "mailto:", "tel:", "javascript:", "data:"];

/// Returns true if an anchor href should be discarded before classification
pub fn is_ignored_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    IGNORED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Resolves an internal href into an absolute, normalized URL
///
/// Protocol-relative links (`//host/path`) take the scheme of the session
/// root; every other relative link is joined against the root itself, not
/// against the page it was found on.
///
/// # Examples
///
/// ```
/// use disco_crawl::url::resolve_link;
/// use url::Url;
///
/// let root = Url::parse("http://example.com/").unwrap();
/// let url = resolve_link("about/", &root).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/about");
/// ```
pub fn resolve_link(href: &str, root: &Url) -> Option<Url> {
    let href = href.trim();
    if is_ignored_href(href) {
        return None;
    }

    let absolute = if href.starts_with("//") {
        Url::parse(&format!("{}:{}", root.scheme(), href)).ok()?
    } else {
        // Url::join handles absolute hrefs and root-relative ones; bare
        // relative paths are anchored at the site root.
        match Url::parse(href) {
            Ok(url) => url,
            Err(_) if href.starts_with('/') => root.join(href).ok()?,
            Err(_) => root.join(&format!("/{}", href)).ok()?,
        }
    };

    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    Some(normalize_url(absolute))
}

/// Normalizes an absolute URL into its frontier key form
///
/// # Normalization Steps
///
/// 1. Lowercase the host (done by the parser)
/// 2. Collapse dot segments and duplicate slashes
/// 3. Remove trailing slash (except for root /)
/// 4. Remove fragment
/// 5. Remove tracking query parameters, sort the rest
/// 6. Remove empty query string
///
/// The scheme is left alone: `http` and `https` are distinct frontier entries.
pub fn normalize_url(mut url: Url) -> Url {
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    url
}

/// Collapses dot segments and empty segments, dropping any trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
