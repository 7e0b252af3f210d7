use crate::command::Publisher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Publishes gateway requests over core NATS
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        debug!(subject = %subject, bytes = payload.len(), "Publishing to NATS");

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .context(format!("Failed to publish to subject '{}'", subject))?;

        Ok(())
    }
}
