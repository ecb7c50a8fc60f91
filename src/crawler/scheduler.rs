//! Scheduler for dispatching jobs and detecting quiescence
//!
//! This module handles:
//! - The local queue of jobs waiting for a worker
//! - Bounded worker concurrency (submission blocks while the pool is full)
//! - Counting fetch failures for the session
//! - Detecting quiescence and shutting the pipeline down
//!
//! A job is *outstanding* from the moment it is spawned until either its
//! worker reports a failure or the pipeline reports it processed. Because the
//! pipeline sends all discoveries of a page before the page's `Processed`
//! event, an empty queue with zero outstanding jobs means no more work can
//! ever appear.

use crate::crawler::job::Job;
use crate::crawler::pipeline::{PipelineEvent, PipelineOutput};
use crate::crawler::worker::{run_worker, PipelineMessage, WorkerContext, WorkerOutcome};
use crate::CrawlError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Seeded, not yet started
    Idle,
    /// Jobs are queued and being handed to workers
    Dispatching,
    /// Queue is empty; waiting on workers or the pipeline
    Draining,
    Terminated,
}

/// Result of a completed scheduler run
#[derive(Debug)]
pub struct ScheduleResult {
    pub output: PipelineOutput,
    /// Jobs handed to a worker
    pub dispatched: usize,
    /// Jobs whose fetch failed
    pub failed: usize,
}

pub struct Scheduler {
    queue: VecDeque<Job>,
    workers: JoinSet<WorkerOutcome>,
    pool_size: usize,
    outstanding: usize,
    dispatched: usize,
    failed: usize,
    errors: Arc<AtomicUsize>,
    ctx: WorkerContext,
    events: mpsc::UnboundedReceiver<PipelineEvent>,
    state: SchedulerState,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `ctx` - Worker context, including the pipeline queue sender
    /// * `pool_size` - Maximum number of concurrent workers
    /// * `errors` - Session fetch error counter, shared with the pipeline
    /// * `events` - Receiving end of the pipeline's event channel
    pub fn new(
        ctx: WorkerContext,
        pool_size: usize,
        errors: Arc<AtomicUsize>,
        events: mpsc::UnboundedReceiver<PipelineEvent>,
    ) -> Self {
        Self {
            queue: VecDeque::new(),
            workers: JoinSet::new(),
            pool_size: pool_size.max(1),
            outstanding: 0,
            dispatched: 0,
            failed: 0,
            errors,
            ctx,
            events,
            state: SchedulerState::Idle,
        }
    }

    /// Queues the seed job
    pub fn seed(&mut self, job: Job) {
        self.queue.push_back(job);
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Runs until quiescence, then shuts the pipeline down and joins it
    pub async fn run(
        mut self,
        pipeline: JoinHandle<PipelineOutput>,
    ) -> Result<ScheduleResult, CrawlError> {
        self.state = SchedulerState::Dispatching;

        loop {
            if let Some(job) = self.queue.pop_front() {
                self.state = SchedulerState::Dispatching;
                while self.workers.len() >= self.pool_size {
                    self.wait_for_worker().await;
                }
                self.spawn(job);
                continue;
            }

            self.drain_events();
            if !self.queue.is_empty() {
                continue;
            }
            if self.outstanding == 0 {
                break;
            }

            self.state = SchedulerState::Draining;
            tokio::select! {
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    self.reap(joined);
                }
                event = self.events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        return Err(CrawlError::TaskFailed(
                            "pipeline stopped before the crawl finished".to_string(),
                        ));
                    }
                },
            }
        }

        tracing::debug!(
            "scheduler: quiescent after {} jobs ({} failed)",
            self.dispatched,
            self.failed
        );

        while let Some(joined) = self.workers.join_next().await {
            self.reap(joined);
        }

        self.ctx
            .pipeline
            .send(PipelineMessage::Shutdown)
            .await
            .map_err(|_| CrawlError::TaskFailed("pipeline queue closed".to_string()))?;

        let output = pipeline
            .await
            .map_err(|e| CrawlError::TaskFailed(format!("pipeline task: {}", e)))?;

        self.state = SchedulerState::Terminated;
        Ok(ScheduleResult {
            output,
            dispatched: self.dispatched,
            failed: self.failed,
        })
    }

    fn spawn(&mut self, job: Job) {
        tracing::debug!("scheduler: dispatching {}", job);
        self.outstanding += 1;
        self.dispatched += 1;
        self.workers.spawn(run_worker(self.ctx.clone(), job));
    }

    /// Blocks until one worker finishes, handling pipeline events meanwhile
    async fn wait_for_worker(&mut self) {
        tokio::select! {
            Some(joined) = self.workers.join_next() => self.reap(joined),
            Some(event) = self.events.recv() => self.on_event(event),
            else => {}
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.on_event(event);
        }
    }

    fn on_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Discovered(job) => self.queue.push_back(job),
            PipelineEvent::Processed => self.settle(),
        }
    }

    fn reap(&mut self, joined: Result<WorkerOutcome, JoinError>) {
        match joined {
            // Settled when the pipeline reports it processed
            Ok(WorkerOutcome::Forwarded { .. }) => {}
            Ok(WorkerOutcome::Failed { url, error }) => {
                let errors = self.errors.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!("scheduler: {} failed ({} errors): {}", url, errors, error);
                self.failed += 1;
                self.settle();
            }
            Ok(WorkerOutcome::PipelineClosed { url }) => {
                tracing::error!("scheduler: pipeline closed, {} dropped", url);
                self.settle();
            }
            Err(e) => {
                tracing::error!("scheduler: worker task failed: {}", e);
                self.errors.fetch_add(1, Ordering::SeqCst);
                self.failed += 1;
                self.settle();
            }
        }
    }

    fn settle(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}
