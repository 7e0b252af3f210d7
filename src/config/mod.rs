use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

// Re-export config types owned by their modules
pub use crate::dispatch::DispatchConfig;
pub use crate::nats::NatsConfig;

use crate::blind::BlindTimings;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "TRADFRI_BRIDGE_CONFIG";

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Identity and subject layout
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeSection {
    /// Stable bridge id; a random one is generated at startup when unset
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_command_subject")]
    pub command_subject: String,
    /// Raw pushes arrive on `<raw_prefix>.<endpoint>.<id>[.<sub-id>]`
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,
    /// Replies arrive on `<reply_prefix>.<bridge-id>`
    #[serde(default = "default_reply_prefix")]
    pub reply_prefix: String,
}

fn default_command_subject() -> String {
    "tradfri-cmd".to_string()
}

fn default_raw_prefix() -> String {
    "tradfri-raw".to_string()
}

fn default_reply_prefix() -> String {
    "tradfri-reply".to_string()
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            id: None,
            command_subject: default_command_subject(),
            raw_prefix: default_raw_prefix(),
            reply_prefix: default_reply_prefix(),
        }
    }
}

impl BridgeSection {
    pub fn reply_subject(&self, bridge_id: &str) -> String {
        format!("{}.{}", self.reply_prefix, bridge_id)
    }

    /// Subscription pattern for every raw push.
    pub fn raw_subject(&self) -> String {
        format!("{}.>", self.raw_prefix)
    }
}

/// Debounce, timeout and watchdog intervals
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_blind_warmup_ms")]
    pub blind_warmup_ms: u64,
    #[serde(default = "default_blind_watchdog_ms")]
    pub blind_watchdog_ms: u64,
}

fn default_batch_window_ms() -> u64 {
    50
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_blind_warmup_ms() -> u64 {
    3000
}

fn default_blind_watchdog_ms() -> u64 {
    1500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            batch_window_ms: default_batch_window_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            blind_warmup_ms: default_blind_warmup_ms(),
            blind_watchdog_ms: default_blind_watchdog_ms(),
        }
    }
}

impl TimingConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn blind_timings(&self) -> BlindTimings {
        BlindTimings {
            warmup: Duration::from_millis(self.blind_warmup_ms),
            watchdog: Duration::from_millis(self.blind_watchdog_ms),
        }
    }
}

/// Status API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            port: default_api_port(),
        }
    }
}

impl BridgeConfig {
    /// Apply `TRADFRI_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TRADFRI_NATS_URL") {
            self.nats.url = url;
        }
        if let Some(id) = lookup("TRADFRI_BRIDGE_ID") {
            self.bridge.id = Some(id);
        }
        if let Some(port) = lookup("TRADFRI_API_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.api.port = port;
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path))?;
    let config: BridgeConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file '{}'", path))?;
    Ok(config)
}
