//! Crawler module for one-domain crawl sessions
//!
//! This module contains the crawl engine:
//! - Jobs and the per-session frontier
//! - The link admission policy
//! - Fetch workers, the post-processing pipeline and the scheduler
//! - Session bootstrap (robots, politeness) and the final report

mod extract;
mod fetcher;
mod frontier;
mod job;
mod pipeline;
mod policy;
mod scheduler;
mod session;
mod worker;

pub use extract::{extract_page, PageContent};
pub use fetcher::{build_http_client, fetch_job, FetchError};
pub use frontier::{Frontier, Suppression};
pub use job::{CompletedJob, Job, Method, Response};
pub use pipeline::{
    PageError, Pipeline, PipelineEvent, PipelineOutput, PipelineStats, SkipReason,
};
pub use policy::{CrawlPolicy, Rejection};
pub use scheduler::{ScheduleResult, Scheduler, SchedulerState};
pub use session::{politeness_delay, CrawlReport, CrawlSession};
pub use worker::{run_worker, Politeness, PipelineMessage, WorkerContext, WorkerOutcome};

use crate::config::Config;
use crate::storage::ObjectStore;
use crate::CrawlError;
use std::sync::Arc;

/// Crawls one domain from its root page
///
/// This is the main entry point for a crawl. It will:
/// 1. Fetch robots.txt and derive the politeness delay
/// 2. Seed the frontier with `http://<domain>/`
/// 3. Fetch, process and follow internal links until quiescence
/// 4. Return the Records and counters of the session
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `domain` - Bare domain name, e.g. `www.example.com`
/// * `store` - Where page bodies are written
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The session ran to quiescence
/// * `Err(CrawlError)` - The session was aborted before it started
pub async fn crawl_domain(
    config: &Config,
    domain: &str,
    store: Arc<dyn ObjectStore>,
) -> Result<CrawlReport, CrawlError> {
    CrawlSession::open(config, domain).await?.run(store).await
}
