//! Bounded worker pool for outbound notifications.
//!
//! The event bus submits one job per accepted mutation. Jobs go into a
//! bounded queue that a fixed number of workers drain. When the queue is
//! full the job is dropped and counted; submission never waits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::model::{BroadcastEvent, Reservation};
use crate::notify::{DispatchError, NotificationDispatcher};
use crate::observability::metrics;

/// Pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Capacity of the job queue.
    pub queue_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_size: 256,
        }
    }
}

enum DispatchJob {
    Event(Arc<BroadcastEvent>),
    Message {
        reservation: Reservation,
        subject: String,
        body_html: String,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
}

/// Counters shared by the pool and its handles.
#[derive(Debug, Default)]
pub struct DispatchStats {
    submitted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle for submitting work to the pool.
#[derive(Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<DispatchJob>,
    stats: Arc<DispatchStats>,
}

impl DispatchHandle {
    /// Queue a notification for `event` without waiting.
    ///
    /// Returns `false` when the job was dropped because the queue is full
    /// or the pool has shut down.
    pub fn submit(&self, event: Arc<BroadcastEvent>) -> bool {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        match self.sender.try_send(DispatchJob::Event(event)) {
            Ok(()) => true,
            Err(e) => {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "pool closed",
                };
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_dispatch("dropped");
                warn!(reason, "Dropping notification job");
                false
            }
        }
    }

    /// Send a free-form message and wait for the outcome.
    ///
    /// Unlike [`submit`](Self::submit), this waits for queue capacity.
    pub async fn send_message(
        &self,
        reservation: Reservation,
        subject: String,
        body_html: String,
    ) -> Result<(), DispatchError> {
        let (reply, outcome) = oneshot::channel();
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        self.sender
            .send(DispatchJob::Message {
                reservation,
                subject,
                body_html,
                reply,
            })
            .await
            .map_err(|_| DispatchError::QueueClosed)?;
        outcome.await.map_err(|_| DispatchError::QueueClosed)?
    }

    /// Shared counters.
    pub fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }
}

/// The running worker pool.
pub struct DispatchPool {
    handle: DispatchHandle,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl DispatchPool {
    /// Start `config.workers` workers sharing one queue.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<D: NotificationDispatcher>(dispatcher: D, config: DispatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_size.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let dispatcher = Arc::new(dispatcher);
        let stats = Arc::new(DispatchStats::default());
        let tracker = TaskTracker::new();
        let cancel = CancellationToken::new();

        for worker in 0..config.workers.max(1) {
            tracker.spawn(run_worker(
                worker,
                Arc::clone(&dispatcher),
                Arc::clone(&receiver),
                Arc::clone(&stats),
                cancel.clone(),
            ));
        }
        tracker.close();

        debug!(
            workers = config.workers.max(1),
            queue_size = config.queue_size.max(1),
            "Dispatch pool started"
        );

        Self {
            handle: DispatchHandle { sender, stats },
            tracker,
            cancel,
        }
    }

    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Stop the workers after the jobs already queued have run.
    ///
    /// Handles still held elsewhere see [`DispatchError::QueueClosed`] or
    /// dropped submissions afterwards.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tracker.wait().await;
        debug!(stats = ?self.handle.stats.snapshot(), "Dispatch pool stopped");
    }
}

async fn run_worker<D: NotificationDispatcher>(
    worker: usize,
    dispatcher: Arc<D>,
    receiver: Arc<Mutex<mpsc::Receiver<DispatchJob>>>,
    stats: Arc<DispatchStats>,
    cancel: CancellationToken,
) {
    loop {
        let job = {
            let mut rx = receiver.lock().await;
            if cancel.is_cancelled() {
                // Drain what is already queued, then stop.
                match rx.try_recv() {
                    Ok(job) => Some(job),
                    Err(_) => None,
                }
            } else {
                tokio::select! {
                    biased;
                    job = rx.recv() => job,
                    () = cancel.cancelled() => rx.try_recv().ok(),
                }
            }
        };

        let Some(job) = job else {
            break;
        };

        match job {
            DispatchJob::Event(event) => match dispatcher.dispatch(&event).await {
                Ok(()) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dispatch("delivered");
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dispatch("failed");
                    warn!(
                        worker,
                        reservation_id = %event.reservation.id,
                        event = %event.event,
                        error = %e,
                        "Notification failed"
                    );
                }
            },
            DispatchJob::Message {
                reservation,
                subject,
                body_html,
                reply,
            } => {
                let outcome = dispatcher
                    .send_message(&reservation, &subject, &body_html)
                    .await;
                if outcome.is_ok() {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dispatch("delivered");
                } else {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dispatch("failed");
                }
                // The caller may have given up waiting.
                let _ = reply.send(outcome);
            }
        }
    }
    debug!(worker, "Dispatch worker exiting");
}
