use super::{CommandError, Method, Publisher, ReplyEnvelope, RequestEnvelope};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Subjects and timing for the correlator.
#[derive(Clone, Debug)]
pub struct CorrelatorConfig {
    /// Subject requests are published on
    pub command_subject: String,
    /// Subject this bridge receives replies on
    pub reply_subject: String,
    pub timeout: Duration,
}

type Waiters = Mutex<HashMap<String, oneshot::Sender<ReplyEnvelope>>>;

/// Matches replies to outstanding requests by correlation id.
pub struct Correlator {
    publisher: Arc<dyn Publisher>,
    config: CorrelatorConfig,
    waiting: Waiters,
    unmatched: AtomicU64,
}

/// Removes the waiter when `send` finishes or its future is dropped.
struct WaiterGuard<'a> {
    waiting: &'a Waiters,
    id: String,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.waiting.lock().remove(&self.id);
    }
}

impl Correlator {
    pub fn new(publisher: Arc<dyn Publisher>, config: CorrelatorConfig) -> Self {
        Self {
            publisher,
            config,
            waiting: Mutex::new(HashMap::new()),
            unmatched: AtomicU64::new(0),
        }
    }

    pub fn reply_subject(&self) -> &str {
        &self.config.reply_subject
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Publish a request and wait for its reply or the timeout.
    ///
    /// Returns the reply payload (`Value::Null` when the reply carried none).
    pub async fn send(
        &self,
        method: Method,
        url: impl Into<String>,
        payload: Option<Value>,
    ) -> Result<Value, CommandError> {
        let url = url.into();
        let (tx, rx) = oneshot::channel();
        let id = self.register(tx);
        let _guard = WaiterGuard {
            waiting: &self.waiting,
            id: id.clone(),
        };

        let request = RequestEnvelope {
            method,
            url: url.clone(),
            id: id.clone(),
            reply_topic: self.config.reply_subject.clone(),
            payload,
        };
        let bytes = serde_json::to_vec(&request)?;

        debug!(id = %id, method = %method, url = %url, "Sending request");

        self.publisher
            .publish(&self.config.command_subject, bytes)
            .await
            .map_err(CommandError::Publish)?;

        let reply = match tokio::time::timeout(self.config.timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(CommandError::Abandoned(id)),
            Err(_) => {
                return Err(CommandError::Timeout {
                    method,
                    url,
                    timeout: self.config.timeout,
                })
            }
        };

        if reply.is_error() {
            return Err(CommandError::Remote {
                method,
                url,
                code: reply.code,
            });
        }

        Ok(reply.payload.unwrap_or(Value::Null))
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<Value, CommandError> {
        self.send(Method::Get, url, None).await
    }

    pub async fn put(&self, url: impl Into<String>, payload: Value) -> Result<Value, CommandError> {
        self.send(Method::Put, url, Some(payload)).await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<Value, CommandError> {
        self.send(Method::Delete, url, None).await
    }

    /// Register a waiter under a fresh id, never one that is outstanding.
    fn register(&self, tx: oneshot::Sender<ReplyEnvelope>) -> String {
        let mut waiting = self.waiting.lock();
        let mut id = Uuid::new_v4().to_string();
        while waiting.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        waiting.insert(id.clone(), tx);
        id
    }

    /// Handle a raw reply frame from the transport.
    pub fn on_reply(&self, raw: &[u8]) {
        let reply: ReplyEnvelope = match serde_json::from_slice(raw) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, raw = %String::from_utf8_lossy(raw), "Malformed reply envelope");
                return;
            }
        };

        if reply.id.is_empty() {
            warn!(raw = %String::from_utf8_lossy(raw), "Reply without correlation id");
            return;
        }

        self.deliver(reply);
    }

    /// Hand a reply to its waiter. Returns false if nobody was waiting.
    pub fn deliver(&self, reply: ReplyEnvelope) -> bool {
        let waiter = self.waiting.lock().remove(&reply.id);

        let Some(tx) = waiter else {
            self.unmatched.fetch_add(1, Ordering::Relaxed);
            warn!(id = %reply.id, code = %reply.code, "Reply for unknown or expired request");
            return false;
        };

        // The receiver may have just timed out; the reply is then dropped
        if tx.send(reply).is_err() {
            debug!("Waiter gone before reply delivery");
            return false;
        }
        true
    }

    /// Number of outstanding requests.
    pub fn pending(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Replies that matched no outstanding request.
    pub fn unmatched_replies(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }
}
