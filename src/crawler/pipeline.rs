//! Post-processing pipeline
//!
//! One pipeline task per session drains the bounded queue of completed
//! jobs, one at a time. It is the only writer of the frontier and the result
//! list. For each page it:
//!
//! 1. Skips pages that are not worth a Record (status, empty, non-text, too large)
//! 2. Extracts anchors and splits them into internal links and external domains
//! 3. Runs every new internal link through the crawl policy
//! 4. Stores the body and appends the Record
//!
//! A failure on one page is logged and the loop moves on. The loop only
//! ends on [`PipelineMessage::Shutdown`].

use crate::config::RecordConfig;
use crate::crawler::extract::{extract_page, PageContent};
use crate::crawler::frontier::Frontier;
use crate::crawler::job::{CompletedJob, Job};
use crate::crawler::policy::CrawlPolicy;
use crate::crawler::worker::PipelineMessage;
use crate::output::Record;
use crate::storage::{content_hash, ObjectStore, StorageError};
use crate::url::{netloc, DomainScope};
use chrono::DateTime;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Content type assumed when a response does not declare one
const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

/// MIME type recorded when a processed page did not declare one
const DEFAULT_MIME_TYPE: &str = "text/html";

/// Notifications from the pipeline back to the scheduler
///
/// All `Discovered` events for a page are sent before its `Processed`
/// event, on the same channel.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A link passed the policy and became a new job
    Discovered(Job),
    /// One forwarded job has been fully handled
    Processed,
}

/// Why a fetched page produced no Record without being an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Status(u16),
    EmptyBody,
    NotText,
    TooLarge,
}

/// A page that could not be turned into a Record
#[derive(Debug, Error)]
pub enum PageError {
    #[error("body is not valid UTF-8")]
    Decode,

    #[error("failed to store body: {0}")]
    Store(#[from] StorageError),
}

/// Per-session page counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub recorded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What the pipeline hands back after shutdown
#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub frontier: Frontier,
    pub stats: PipelineStats,
}

/// Internal and external links of one page
#[derive(Debug, Default)]
struct ClassifiedLinks {
    internal: Vec<Url>,
    external_domains: BTreeSet<String>,
}

pub struct Pipeline {
    scope: DomainScope,
    policy: CrawlPolicy,
    frontier: Frontier,
    store: Arc<dyn ObjectStore>,
    record: RecordConfig,
    max_body_bytes: usize,
    errors: Arc<AtomicUsize>,
    records: Vec<Record>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Creates the pipeline for one session
    ///
    /// `frontier` must already contain the seed. `errors` is the session
    /// fetch error counter, written by the scheduler.
    pub fn new(
        scope: DomainScope,
        policy: CrawlPolicy,
        frontier: Frontier,
        store: Arc<dyn ObjectStore>,
        record: RecordConfig,
        max_body_bytes: usize,
        errors: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            scope,
            policy,
            frontier,
            store,
            record,
            max_body_bytes,
            errors,
            records: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Drains the queue until the shutdown sentinel arrives
    pub async fn run(
        mut self,
        mut queue: mpsc::Receiver<PipelineMessage>,
        events: mpsc::UnboundedSender<PipelineEvent>,
    ) -> PipelineOutput {
        while let Some(message) = queue.recv().await {
            let completed = match message {
                PipelineMessage::Job(completed) => completed,
                PipelineMessage::Shutdown => {
                    tracing::debug!("pipeline: shutdown received");
                    break;
                }
            };

            for job in self.process(completed).await {
                if events.send(PipelineEvent::Discovered(job)).is_err() {
                    tracing::warn!("pipeline: scheduler is gone, dropping discovered job");
                }
            }
            // Sent even when the scheduler is gone; nothing to do about it
            let _ = events.send(PipelineEvent::Processed);
        }

        PipelineOutput {
            records: self.records,
            frontier: self.frontier,
            stats: self.stats,
        }
    }

    /// Handles one completed job, returning the newly admitted jobs
    pub async fn process(&mut self, completed: CompletedJob) -> Vec<Job> {
        let url = completed.url().clone();

        if let Some(reason) = self.content_skip(&completed) {
            tracing::debug!("parse: skipping {} ({:?})", url, reason);
            self.stats.skipped += 1;
            return Vec::new();
        }

        let html = match std::str::from_utf8(&completed.body) {
            Ok(html) => html,
            Err(_) => {
                tracing::warn!("parse: {} failed: {}", url, PageError::Decode);
                self.stats.failed += 1;
                return Vec::new();
            }
        };

        let page = extract_page(html);
        let links = self.classify(&page.hrefs);
        let discovered = self.admit(&links.internal);

        match self.build_record(&completed, page, links).await {
            Ok(record) => {
                self.records.push(record);
                self.stats.recorded += 1;
            }
            Err(e) => {
                tracing::warn!("store: {} failed: {}", url, e);
                self.stats.failed += 1;
            }
        }

        discovered
    }

    fn content_skip(&self, completed: &CompletedJob) -> Option<SkipReason> {
        let response = &completed.response;
        if !response.is_success() {
            return Some(SkipReason::Status(response.status));
        }
        if completed.body.is_empty() {
            return Some(SkipReason::EmptyBody);
        }

        let content_type = response
            .header("content-type")
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .trim()
            .to_ascii_lowercase();
        if !content_type.starts_with("text/") {
            return Some(SkipReason::NotText);
        }

        if completed.body.len() > self.max_body_bytes {
            return Some(SkipReason::TooLarge);
        }
        None
    }

    /// Splits anchors by host; internal ones are resolved against the root
    fn classify(&self, hrefs: &[String]) -> ClassifiedLinks {
        let mut links = ClassifiedLinks::default();
        let mut internal_seen = BTreeSet::new();

        for href in hrefs {
            let host = if let Some(rest) = href.strip_prefix("//") {
                Url::parse(&format!("{}://{}", self.policy.root().scheme(), rest))
                    .ok()
                    .and_then(|u| netloc(&u))
            } else {
                match Url::parse(href) {
                    Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => {
                        netloc(&absolute)
                    }
                    // Other schemes never lead anywhere crawlable
                    Ok(_) => continue,
                    Err(_) => None,
                }
            };

            match host {
                Some(host) if !self.scope.is_local(&host) => {
                    links.external_domains.insert(host);
                }
                _ => {
                    if let Some(resolved) = self.policy.resolve(href) {
                        if internal_seen.insert(resolved.to_string()) {
                            links.internal.push(resolved);
                        }
                    }
                }
            }
        }

        links
    }

    /// Applies the frontier and the policy to the internal links of a page
    fn admit(&mut self, internal: &[Url]) -> Vec<Job> {
        let mut admitted = Vec::new();

        for url in internal {
            if self.frontier.suppression().is_some() {
                break;
            }
            if self.frontier.contains(url.as_str()) {
                continue;
            }

            let errors = self.errors.load(Ordering::SeqCst);
            match self.policy.check(url, self.frontier.len(), errors) {
                Ok(()) => {
                    self.frontier.insert(url.as_str());
                    admitted.push(Job::new(url.clone()));
                }
                Err(rejection) => {
                    if let Some(reason) = rejection.suppression() {
                        tracing::info!(
                            "parse: link discovery suppressed for {}: {}",
                            self.scope.domain_name(),
                            reason
                        );
                        self.frontier.suppress(reason);
                    } else {
                        tracing::debug!("parse: rejected {} ({:?})", url, rejection);
                    }
                }
            }
        }

        admitted
    }

    async fn build_record(
        &self,
        completed: &CompletedJob,
        page: PageContent,
        links: ClassifiedLinks,
    ) -> Result<Record, PageError> {
        let url = completed.url();
        let hash = content_hash(&completed.body);

        self.store.put(&hash, &completed.body).await?;

        let date_created = completed
            .response
            .header("last-modified")
            .and_then(|value| DateTime::parse_from_rfc2822(value.trim()).ok())
            .map(|date| date.to_rfc3339());

        let mime_type = completed
            .response
            .header("content-type")
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let mut internal_links: Vec<String> =
            links.internal.iter().map(|u| u.to_string()).collect();
        internal_links.sort();

        Ok(Record {
            identifier: url.to_string(),
            owner: netloc(url).unwrap_or_default(),
            hash: hash.clone(),
            title: page.title,
            description: page.description,
            author: self.record.author.clone(),
            date_created,
            classification: self.record.classification.clone(),
            language: page
                .language
                .unwrap_or_else(|| self.record.default_language.clone()),
            size: completed.body.len(),
            mime_type,
            storage_key: hash,
            external_domains: links.external_domains.into_iter().collect(),
            links: internal_links,
            keywords: page.keywords,
        })
    }
}
