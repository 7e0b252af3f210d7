// Bounded worker pool for inbound wire frames
//
// The transport read loop submits frames into a bounded queue. A fixed set
// of workers drains it, so a burst of pushes applies back-pressure instead of
// spawning one task per message.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// An inbound frame from the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// State push for the entity at `path` (e.g. `["15001", "65537"]`)
    Push { path: Vec<String>, payload: Vec<u8> },
    /// Reply to a correlated request
    Reply { payload: Vec<u8> },
}

/// Consumer of dispatched frames.
pub trait FrameHandler: Send + Sync {
    fn handle_frame(&self, frame: Frame);
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DispatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_workers() -> usize {
    8
}

fn default_queue_depth() -> usize {
    256
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

/// Frame counters
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    processed: AtomicU64,
}

/// Point-in-time view of the dispatch counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchSnapshot {
    pub received: u64,
    pub processed: u64,
    /// Submitted but not yet handled, whether queued or on a worker
    pub in_flight: u64,
}

impl DispatchStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        let processed = self.processed();
        let received = self.received();
        DispatchSnapshot {
            received,
            processed,
            in_flight: received.saturating_sub(processed),
        }
    }
}

pub struct Dispatcher {
    tx: mpsc::Sender<Frame>,
    stats: Arc<DispatchStats>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the worker pool.
    pub fn spawn(handler: Arc<dyn FrameHandler>, config: &DispatchConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let stats = Arc::new(DispatchStats::default());

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    loop {
                        // Hold the receiver lock only while waiting for the next frame
                        let frame = rx.lock().await.recv().await;
                        let Some(frame) = frame else {
                            debug!(worker, "Dispatch queue closed, worker exiting");
                            break;
                        };

                        handler.handle_frame(frame);
                        stats.processed.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        info!(
            workers = config.workers.max(1),
            queue_depth = config.queue_depth.max(1),
            "Frame dispatcher started"
        );

        Self { tx, stats, workers }
    }

    /// Queue a frame, waiting while the queue is full.
    pub async fn submit(&self, frame: Frame) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(frame).await.is_err() {
            warn!("Dispatch queue closed, dropping frame");
        }
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Stop accepting frames and wait for queued frames to drain.
    pub async fn shutdown(self) {
        let Self { tx, workers, .. } = self;
        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        info!("Frame dispatcher stopped");
    }
}
