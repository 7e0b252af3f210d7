// Test doubles shared by unit tests

use crate::command::{Publisher, RequestEnvelope};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Publisher that records every request instead of sending it.
pub(crate) struct RecordingPublisher {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
    tx: mpsc::UnboundedSender<RequestEnvelope>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<RequestEnvelope>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sent: Mutex::new(Vec::new()),
            tx,
            rx: tokio::sync::Mutex::new(rx),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every later publish fail.
    pub(crate) fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Every request published so far, decoded.
    pub(crate) fn requests(&self) -> Vec<RequestEnvelope> {
        self.sent
            .lock()
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    pub(crate) fn subjects(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(subject, _)| subject.clone()).collect()
    }

    /// Wait for the next published request.
    pub(crate) async fn next_request(&self) -> RequestEnvelope {
        self.rx.lock().await.recv().await.unwrap()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("transport unavailable");
        }

        let request = serde_json::from_slice::<RequestEnvelope>(&payload);
        self.sent.lock().push((subject.to_string(), payload));
        if let Ok(request) = request {
            let _ = self.tx.send(request);
        }
        Ok(())
    }
}
