// Debounced write batching
//
// Mutations against one entity are collected into a shadow object of the
// entity's type for a fixed quiescence window, then sent as a single `put`.
// Only touched fields serialize, so the write carries exactly the union of
// the fields set during the window.

use crate::command::Correlator;
use crate::model::Entity;
use crate::state::EntityHandle;
use crate::timer;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(50);

/// Flush counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub flushed: u64,
    pub failed: u64,
}

pub struct Batcher {
    correlator: Arc<Correlator>,
    window: Duration,
    flushed: AtomicU64,
    failed: AtomicU64,
}

impl Batcher {
    pub fn new(correlator: Arc<Correlator>, window: Duration) -> Self {
        Self {
            correlator,
            window,
            flushed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Apply `setter` to the entity's open batch, opening one if needed.
    ///
    /// The window starts at the call that opens the batch and is never
    /// extended by later calls. Must be called from within a tokio runtime.
    pub fn mutate<T, F>(self: &Arc<Self>, entity: &Arc<EntityHandle<T>>, setter: F)
    where
        T: Entity,
        F: FnOnce(&mut T),
    {
        let mut pending = entity.pending.lock();

        if pending.is_none() {
            *pending = Some(T::default());

            let batcher = Arc::clone(self);
            let target = Arc::clone(entity);
            timer::arm(self.window, async move {
                batcher.flush(&target).await;
            })
            .detach();

            debug!(address = %entity.address(), "Opened write batch");
        }

        if let Some(shadow) = pending.as_mut() {
            setter(shadow);
        }
    }

    async fn flush<T: Entity>(&self, entity: &EntityHandle<T>) {
        let address = entity.address();

        // Detach the shadow; mutations from here on open a new batch
        let shadow = entity.pending.lock().take();
        let Some(shadow) = shadow else {
            return;
        };

        let payload = match serde_json::to_value(&shadow) {
            Ok(payload) => payload,
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(address = %address, error = %e, "Failed to serialize write batch");
                return;
            }
        };

        debug!(address = %address, payload = %payload, "Flushing write batch");

        match self.correlator.put(address.to_string(), payload).await {
            Ok(_) => {
                self.flushed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(address = %address, error = %e, "Failed to send write batch");
            }
        }
    }

    pub fn stats(&self) -> BatchStats {
        BatchStats {
            flushed: self.flushed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests;
