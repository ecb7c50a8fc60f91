//! Disco Crawl: a polite single-domain crawler
//!
//! This crate crawls one domain at a time, respecting robots.txt and
//! per-domain politeness delays, and turns every text page it finds into a
//! publishable Record. External domains found along the way feed the
//! fleet-wide request queue.

pub mod config;
pub mod crawler;
pub mod output;
pub mod registry;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Disco Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Timed out fetching robots.txt for {domain}")]
    RobotsTimeout { domain: String },

    #[error("Crawl-delay of {seconds}s for {domain} exceeds the allowed maximum")]
    CrawlDelayTooHigh { domain: String, seconds: f64 },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Disco Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_domain, CrawlReport, CrawlSession, Job};
pub use output::Record;
pub use url::{classify_domain, DomainClass, DomainScope};
