use super::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request published on the command subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub method: Method,
    pub url: String,
    pub id: String,
    #[serde(rename = "replyTopic")]
    pub reply_topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Reply published by the gateway side on the bridge's reply subject.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub id: String,
    /// Protocol response code such as `2.05` or `4.04`
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub format: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ReplyEnvelope {
    /// Client (4.xx) and server (5.xx) error classes.
    pub fn is_error(&self) -> bool {
        matches!(self.code.chars().next(), Some('4' | '5'))
    }
}
