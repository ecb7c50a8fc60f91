use serde::Deserialize;

/// Main configuration structure for Disco Crawl
///
/// Every section is optional; missing sections fall back to the values the
/// crawler fleet was deployed with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub politeness: PolitenessConfig,
    pub policy: PolicyConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub record: RecordConfig,
    pub output: OutputConfig,
}

/// Worker pool and pipeline sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    pub worker_count: usize,

    /// Capacity of the bounded queue in front of the pipeline
    pub pipeline_capacity: usize,

    /// Read timeout for a single fetch (milliseconds)
    pub request_timeout_ms: u64,

    /// Connect timeout for a single fetch (milliseconds)
    pub connect_timeout_ms: u64,

    /// Bodies larger than this are skipped by the pipeline
    pub max_body_bytes: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            pipeline_capacity: 100,
            request_timeout_ms: 20_000,
            connect_timeout_ms: 10_000,
            max_body_bytes: 100 * 1024,
        }
    }
}

/// Per-domain request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolitenessConfig {
    /// Delay used when robots.txt does not specify a crawl-delay
    pub default_delay_ms: u64,

    /// Floor applied to the robots.txt crawl-delay
    pub min_delay_ms: u64,

    /// Lower bound of the random jitter added before each fetch
    pub jitter_min_ms: u64,

    /// Upper bound of the random jitter added before each fetch
    pub jitter_max_ms: u64,

    /// Sites asking for a longer delay than this are not crawled at all
    pub max_delay_secs: u64,

    /// Hard wall-clock limit on the robots.txt fetch
    pub robots_timeout_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 2_000,
            min_delay_ms: 1_000,
            jitter_min_ms: 1_000,
            jitter_max_ms: 3_000,
            max_delay_secs: 30,
            robots_timeout_ms: 10_000,
        }
    }
}

/// Link admission limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// Maximum URLs scheduled per session for general domains
    pub page_cap: usize,

    /// Maximum URLs scheduled per session for government-class domains
    pub government_page_cap: usize,

    /// Domain patterns (e.g., "*.gov.au") that get the government cap
    pub government_domains: Vec<String>,

    /// Discovery stops once the fetch error count exceeds this
    pub max_errors: usize,

    /// Path suffixes that are never fetched
    pub blocked_extensions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            page_cap: 500,
            government_page_cap: 3_000,
            government_domains: vec!["*.gov.au".to_string()],
            max_errors: 10,
            blocked_extensions: [
                ".gif", ".jpeg", ".jpg", ".png", ".svg", ".docx", ".zip", ".tar", ".exe",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DiscoCrawl".to_string(),
            crawler_version: "2.0".to_string(),
            contact_url: "https://example.org/crawler".to_string(),
            contact_email: "crawler@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Fixed values stamped on every record
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RecordConfig {
    pub author: String,
    pub classification: String,
    pub default_language: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            author: "unknown".to_string(),
            classification: "UNCLASSIFIED".to_string(),
            default_language: "en-us".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory backing the filesystem object store
    pub storage_dir: String,

    /// Records per message when a result batch has to be split
    pub chunk_size: usize,

    /// Transport payload ceiling for a single result message
    pub max_message_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            storage_dir: "./pages".to_string(),
            chunk_size: 128,
            max_message_bytes: 256 * 1024,
        }
    }
}
