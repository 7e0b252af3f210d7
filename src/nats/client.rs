use crate::config::BridgeSection;
use crate::dispatch::{Dispatcher, Frame};
use crate::nats::publisher::NatsPublisher;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// NATS configuration
#[derive(Clone, Debug, Deserialize)]
pub struct NatsConfig {
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

/// Plain publish/subscribe NATS connection
pub struct NatsClient {
    client: async_nats::Client,
}

impl NatsClient {
    /// Connect to NATS
    pub async fn connect(config: &NatsConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(&config.url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS");
        Ok(Self { client })
    }

    pub fn publisher(&self) -> NatsPublisher {
        NatsPublisher::new(self.client.clone())
    }

    /// Forward raw pushes and replies into the dispatcher until both
    /// subscriptions end.
    pub async fn run(&self, bridge: &BridgeSection, reply_subject: &str, dispatcher: &Dispatcher) -> Result<()> {
        let raw_subject = bridge.raw_subject();

        let mut pushes = self
            .client
            .subscribe(raw_subject.clone())
            .await
            .context(format!("Failed to subscribe to '{}'", raw_subject))?;
        let mut replies = self
            .client
            .subscribe(reply_subject.to_string())
            .await
            .context(format!("Failed to subscribe to '{}'", reply_subject))?;

        info!(raw = %raw_subject, reply = %reply_subject, "Listening for gateway traffic");

        loop {
            tokio::select! {
                Some(message) = pushes.next() => {
                    let subject = message.subject.to_string();
                    match subject_path(&subject, &bridge.raw_prefix) {
                        Some(path) => {
                            dispatcher
                                .submit(Frame::Push { path, payload: message.payload.to_vec() })
                                .await;
                        }
                        None => warn!(subject = %subject, "Ignoring push on unexpected subject"),
                    }
                }
                Some(message) = replies.next() => {
                    debug!(subject = %message.subject, "Received reply");
                    dispatcher
                        .submit(Frame::Reply { payload: message.payload.to_vec() })
                        .await;
                }
                else => break,
            }
        }

        info!("NATS subscriptions closed");
        Ok(())
    }
}

/// Entity path of a raw push subject: `tradfri-raw.15001.65537` gives
/// `["15001", "65537"]`.
pub fn subject_path(subject: &str, raw_prefix: &str) -> Option<Vec<String>> {
    let rest = subject.strip_prefix(raw_prefix)?.strip_prefix('.')?;
    let path: Vec<String> = rest.split('.').map(str::to_string).collect();
    if path.iter().any(String::is_empty) {
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_path() {
        assert_eq!(
            subject_path("tradfri-raw.15001.65537", "tradfri-raw"),
            Some(vec!["15001".to_string(), "65537".to_string()])
        );
        assert_eq!(
            subject_path("tradfri-raw.15005.131073.196608", "tradfri-raw").map(|p| p.len()),
            Some(3)
        );
        assert_eq!(subject_path("tradfri-raw", "tradfri-raw"), None);
        assert_eq!(subject_path("tradfri-rawx.15001", "tradfri-raw"), None);
        assert_eq!(subject_path("other.15001", "tradfri-raw"), None);
    }
}
