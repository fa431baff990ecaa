//! Job coordination
//!
//! Long-running ingests run as queued jobs; the RPC surface only
//! exposes status snapshots and a streamed view of them. Each queue is
//! FIFO with a single background worker, so jobs complete in enqueue
//! order and completion logging fires in-order on that worker. Queue
//! gauges (remaining, high-water, active) feed `GetJobStatus`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// One unit of queued work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> anyhow::Result<()>;
}

type JobFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Closure-backed job, for callers that don't want a dedicated type.
pub struct FnJob {
    name: String,
    f: Box<dyn Fn() -> JobFuture + Send + Sync>,
}

impl FnJob {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn() -> JobFuture + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Job for FnJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        (self.f)().await
    }
}

struct Envelope {
    id: Uuid,
    enqueued_at: DateTime<Utc>,
    job: Box<dyn Job>,
}

#[derive(Default)]
struct Counters {
    remaining: AtomicUsize,
    high_water: AtomicUsize,
    active: AtomicUsize,
}

/// Point-in-time view of one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: String,
    pub remaining: usize,
    pub high_water: usize,
    pub active: usize,
}

/// FIFO queue with one worker.
pub struct JobQueue {
    name: String,
    sender: mpsc::UnboundedSender<Envelope>,
    counters: Arc<Counters>,
}

impl JobQueue {
    fn start(name: String, cancel: CancellationToken) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let queue = Arc::new(Self {
            name: name.clone(),
            sender,
            counters: counters.clone(),
        });
        tokio::spawn(worker(name, receiver, counters, cancel));
        queue
    }

    pub fn enqueue(&self, job: Box<dyn Job>) {
        let envelope = Envelope {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            job,
        };
        let remaining = self.counters.remaining.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters
            .high_water
            .fetch_max(remaining, Ordering::SeqCst);
        if self.sender.send(envelope).is_err() {
            self.counters.remaining.fetch_sub(1, Ordering::SeqCst);
            warn!(queue = %self.name, "worker is gone; job dropped");
        }
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            name: self.name.clone(),
            remaining: self.counters.remaining.load(Ordering::SeqCst),
            high_water: self.counters.high_water.load(Ordering::SeqCst),
            active: self.counters.active.load(Ordering::SeqCst),
        }
    }
}

async fn worker(
    queue: String,
    mut receiver: mpsc::UnboundedReceiver<Envelope>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
) {
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            received = receiver.recv() => match received {
                Some(envelope) => envelope,
                None => break,
            },
        };
        counters.remaining.fetch_sub(1, Ordering::SeqCst);
        counters.active.fetch_add(1, Ordering::SeqCst);
        let started = Utc::now();
        match envelope.job.run().await {
            Ok(()) => debug!(
                queue = %queue,
                job = %envelope.job.name(),
                id = %envelope.id,
                queued_for_ms = (started - envelope.enqueued_at).num_milliseconds(),
                "job completed"
            ),
            Err(e) => warn!(
                queue = %queue,
                job = %envelope.job.name(),
                id = %envelope.id,
                error = %e,
                "job failed"
            ),
        }
        counters.active.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(queue = %queue, "worker stopped");
}

/// Registry of named queues, one worker each.
pub struct JobCoordinator {
    queues: DashMap<String, Arc<JobQueue>>,
    cancel: CancellationToken,
}

impl JobCoordinator {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Get or create a queue; creating spawns its worker.
    pub fn queue(&self, name: &str) -> Arc<JobQueue> {
        self.queues
            .entry(name.to_string())
            .or_insert_with(|| JobQueue::start(name.to_string(), self.cancel.child_token()))
            .clone()
    }

    pub fn enqueue(&self, queue: &str, job: Box<dyn Job>) {
        self.queue(queue).enqueue(job);
    }

    /// Snapshot of every queue, sorted by name for stable output.
    pub fn snapshot(&self) -> Vec<QueueStatus> {
        let mut statuses: Vec<QueueStatus> =
            self.queues.iter().map(|entry| entry.status()).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Stop every worker. Queued jobs that have not started are
    /// abandoned.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Default for JobCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    fn counting_job(log: Arc<Mutex<Vec<usize>>>, n: usize) -> Box<dyn Job> {
        Box::new(FnJob::new(format!("job-{n}"), move || {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(n);
                Ok(())
            }
            .boxed()
        }))
    }

    async fn drain(coordinator: &JobCoordinator, queue: &str) {
        for _ in 0..200 {
            let status = coordinator.queue(queue).status();
            if status.remaining == 0 && status.active == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("queue '{queue}' did not drain");
    }

    #[tokio::test]
    async fn jobs_run_in_fifo_order() {
        let coordinator = JobCoordinator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..10 {
            coordinator.enqueue("ingest", counting_job(log.clone(), n));
        }
        drain(&coordinator, "ingest").await;
        assert_eq!(*log.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn gauges_track_queue_depth() {
        let coordinator = JobCoordinator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..5 {
            coordinator.enqueue("ingest", counting_job(log.clone(), n));
        }
        drain(&coordinator, "ingest").await;

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.len(), 1);
        let status = &snapshot[0];
        assert_eq!(status.name, "ingest");
        assert_eq!(status.remaining, 0);
        assert_eq!(status.active, 0);
        assert!(status.high_water >= 1);
    }

    #[tokio::test]
    async fn failing_jobs_do_not_stop_the_worker() {
        let coordinator = JobCoordinator::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        coordinator.enqueue(
            "ingest",
            Box::new(FnJob::new("broken", || {
                async { anyhow::bail!("boom") }.boxed()
            })),
        );
        coordinator.enqueue("ingest", counting_job(log.clone(), 1));
        drain(&coordinator, "ingest").await;
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn snapshot_covers_multiple_queues_sorted() {
        let coordinator = JobCoordinator::new();
        coordinator.queue("labels");
        coordinator.queue("indexing");
        let names: Vec<String> = coordinator.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["indexing", "labels"]);
    }
}
