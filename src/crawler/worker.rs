//! Fetch worker task
//!
//! A worker takes exactly one job: it waits out the politeness delay,
//! fetches, and hands the completed job to the pipeline queue. The queue is
//! bounded, so a backed-up pipeline stalls the worker here.

use crate::crawler::fetcher::{fetch_job, FetchError};
use crate::crawler::job::{CompletedJob, Job};
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Messages accepted by the pipeline queue
#[derive(Debug)]
pub enum PipelineMessage {
    Job(CompletedJob),
    /// Pushed by the scheduler once quiescence is reached
    Shutdown,
}

/// Result of one worker task, observed by the scheduler
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The completed job was queued for the pipeline
    Forwarded { url: Url },
    /// The fetch failed; the job is dropped
    Failed { url: Url, error: FetchError },
    /// The pipeline queue is gone; nothing more can be processed
    PipelineClosed { url: Url },
}

/// Politeness delay settings shared by all workers of a session
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    pub delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Politeness {
    /// Samples the wait before one request: delay plus uniform jitter
    pub fn sample(&self) -> Duration {
        let min = self.jitter_min.as_millis() as u64;
        let max = self.jitter_max.as_millis() as u64;
        let jitter = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        self.delay + Duration::from_millis(jitter)
    }
}

/// Everything a worker needs; cloned cheaply into each task
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub client: Client,
    pub politeness: Politeness,
    pub max_body_bytes: usize,
    pub pipeline: mpsc::Sender<PipelineMessage>,
}

/// Runs one job to completion
pub async fn run_worker(ctx: WorkerContext, job: Job) -> WorkerOutcome {
    let url = job.url().clone();

    let wait = ctx.politeness.sample();
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }

    tracing::debug!("fetch: {}", url);
    let completed = match fetch_job(&ctx.client, job, ctx.max_body_bytes).await {
        Ok(completed) => completed,
        Err(error) => {
            tracing::warn!("fetch: {} failed: {}", url, error);
            return WorkerOutcome::Failed { url, error };
        }
    };

    tracing::debug!(
        "fetch: {} -> {} ({} bytes)",
        url,
        completed.response.status,
        completed.body.len()
    );

    match ctx.pipeline.send(PipelineMessage::Job(completed)).await {
        Ok(()) => WorkerOutcome::Forwarded { url },
        Err(_) => WorkerOutcome::PipelineClosed { url },
    }
}
