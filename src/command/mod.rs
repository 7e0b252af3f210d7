// Request/reply correlation over the asynchronous command channel

mod correlator;
mod envelope;

pub use correlator::{Correlator, CorrelatorConfig, DEFAULT_REQUEST_TIMEOUT};
pub use envelope::{ReplyEnvelope, RequestEnvelope};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;


/// Outbound side of the transport.
///
/// Implementations publish raw bytes on a subject. Ordering and delivery
/// guarantees are whatever the transport provides.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> anyhow::Result<()>;
}

/// Gateway request method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to publish request: {0:#}")]
    Publish(anyhow::Error),

    #[error("{method} {url} timed out after {timeout:?}")]
    Timeout {
        method: Method,
        url: String,
        timeout: Duration,
    },

    #[error("{method} {url} failed with code {code}")]
    Remote {
        method: Method,
        url: String,
        code: String,
    },

    #[error("waiter for request {0} dropped without a reply")]
    Abandoned(String),
}
