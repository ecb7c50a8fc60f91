//! Crawl session - one domain from robots bootstrap to final report
//!
//! Opening a session resolves everything that must be known before the
//! first job is scheduled:
//! - The accepted host spellings and the seed URL
//! - Robots rules, fetched once under a hard deadline
//! - The politeness delay derived from robots crawl-delay
//!
//! A robots timeout or an excessive crawl-delay aborts the session here,
//! before any page is requested.

use crate::config::{Config, PolitenessConfig};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::{Frontier, Suppression};
use crate::crawler::job::Job;
use crate::crawler::pipeline::{Pipeline, PipelineStats};
use crate::crawler::policy::CrawlPolicy;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::worker::{Politeness, WorkerContext};
use crate::output::Record;
use crate::robots::{fetch_robots, ParsedRobots};
use crate::storage::ObjectStore;
use crate::url::DomainScope;
use crate::CrawlError;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Summary of a finished session
#[derive(Debug)]
pub struct CrawlReport {
    pub domain: String,
    pub records: Vec<Record>,
    /// Every URL scheduled during the session, sorted
    pub seen_urls: Vec<String>,
    pub error_count: usize,
    /// Jobs handed to a worker
    pub dispatched: usize,
    /// Why discovery stopped early, if it did
    pub suppression: Option<Suppression>,
    pub pages: PipelineStats,
}

impl CrawlReport {
    pub fn discovery_suppressed(&self) -> bool {
        self.suppression.is_some()
    }
}

/// Per-domain crawl state
pub struct CrawlSession {
    config: Config,
    scope: DomainScope,
    root: Url,
    client: Client,
    robots: Option<ParsedRobots>,
    delay: Duration,
}

impl CrawlSession {
    /// Opens a session for `domain`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSession)` - Ready to run
    /// * `Err(CrawlError::RobotsTimeout)` - robots.txt did not answer in time
    /// * `Err(CrawlError::CrawlDelayTooHigh)` - The site asks for too slow a crawl
    pub async fn open(config: &Config, domain: &str) -> Result<Self, CrawlError> {
        let scope = DomainScope::new(domain)?;
        let root = scope.first_url()?;
        let client = build_http_client(config)?;

        let deadline = Duration::from_millis(config.politeness.robots_timeout_ms);
        let robots = match fetch_robots(&client, &root, deadline).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::error!("Aborting {}: {}", scope.domain_name(), e);
                return Err(e);
            }
        };

        let delay = match politeness_delay(
            robots.as_ref(),
            &config.user_agent.crawler_name,
            &config.politeness,
        ) {
            Ok(delay) => delay,
            Err(seconds) => {
                let e = CrawlError::CrawlDelayTooHigh {
                    domain: scope.domain_name().to_string(),
                    seconds,
                };
                tracing::error!("Aborting {}: {}", scope.domain_name(), e);
                return Err(e);
            }
        };

        tracing::info!(
            "Opened session for {} (robots: {}, delay: {:?})",
            scope.domain_name(),
            if robots.is_some() { "loaded" } else { "none" },
            delay
        );

        Ok(Self {
            config: config.clone(),
            scope,
            root,
            client,
            robots,
            delay,
        })
    }

    pub fn domain(&self) -> &str {
        self.scope.domain_name()
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn robots(&self) -> Option<&ParsedRobots> {
        self.robots.as_ref()
    }

    /// Politeness delay applied before every request
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Crawls the domain until quiescence
    pub async fn run(self, store: Arc<dyn ObjectStore>) -> Result<CrawlReport, CrawlError> {
        let domain = self.scope.domain_name().to_string();
        let crawler = &self.config.crawler;
        let politeness = &self.config.politeness;
        let errors = Arc::new(AtomicUsize::new(0));

        let policy = CrawlPolicy::new(
            &self.config.policy,
            &self.scope,
            self.root.clone(),
            self.robots.clone(),
            &self.config.user_agent.crawler_name,
        );

        let seed_allowed = self
            .robots
            .as_ref()
            .map(|r| r.is_allowed(self.root.as_str(), &self.config.user_agent.crawler_name))
            .unwrap_or(true);

        let mut frontier = Frontier::new();
        if seed_allowed {
            frontier.insert(self.root.as_str());
        } else {
            tracing::warn!("robots.txt disallows the root of {}; nothing to crawl", domain);
        }

        let (queue_tx, queue_rx) = mpsc::channel(crawler.pipeline_capacity);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pipeline = Pipeline::new(
            self.scope.clone(),
            policy,
            frontier,
            store,
            self.config.record.clone(),
            crawler.max_body_bytes,
            errors.clone(),
        );
        let pipeline = tokio::spawn(pipeline.run(queue_rx, events_tx));

        let ctx = WorkerContext {
            client: self.client.clone(),
            politeness: Politeness {
                delay: self.delay,
                jitter_min: Duration::from_millis(politeness.jitter_min_ms),
                jitter_max: Duration::from_millis(politeness.jitter_max_ms),
            },
            max_body_bytes: crawler.max_body_bytes,
            pipeline: queue_tx,
        };

        let mut scheduler = Scheduler::new(ctx, crawler.worker_count, errors.clone(), events_rx);
        if seed_allowed {
            scheduler.seed(Job::new(self.root.clone()));
        }

        tracing::info!("Crawling {} with {} workers", domain, crawler.worker_count);
        let result = scheduler.run(pipeline).await?;

        let report = CrawlReport {
            domain,
            suppression: result.output.frontier.suppression(),
            seen_urls: result.output.frontier.into_sorted_urls(),
            records: result.output.records,
            error_count: errors.load(Ordering::SeqCst),
            dispatched: result.dispatched,
            pages: result.output.stats,
        };

        tracing::info!(
            "Finished {}: {} records, {} urls, {} errors{}",
            report.domain,
            report.records.len(),
            report.seen_urls.len(),
            report.error_count,
            report
                .suppression
                .map(|s| format!(", discovery stopped ({})", s))
                .unwrap_or_default()
        );

        Ok(report)
    }
}

/// Derives the per-request delay from robots rules
///
/// A crawl-delay is floored at `min_delay_ms`; without one the default
/// applies. Returns `Err(seconds)` when the site asks for more than
/// `max_delay_secs`.
pub fn politeness_delay(
    robots: Option<&ParsedRobots>,
    agent: &str,
    config: &PolitenessConfig,
) -> Result<Duration, f64> {
    let Some(seconds) = robots.and_then(|r| r.crawl_delay(agent)) else {
        return Ok(Duration::from_millis(config.default_delay_ms));
    };

    if seconds > config.max_delay_secs as f64 {
        return Err(seconds);
    }

    let requested = Duration::from_secs_f64(seconds);
    Ok(requested.max(Duration::from_millis(config.min_delay_ms)))
}
