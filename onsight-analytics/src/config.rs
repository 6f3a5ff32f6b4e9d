use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when no write key is configured.
pub const WRITE_KEY_ENV: &str = "ONSIGHT_WRITE_KEY";

/// Placeholder used when neither configuration nor environment supply a
/// write key. Batches sent with it are rejected upstream, leaving the
/// client effectively inert.
pub const PLACEHOLDER_WRITE_KEY: &str = "demo-write-key";

/// The top-level configuration for the collection client.
///
/// Every block has a default, so a bare `AnalyticsConfig::default()` yields
/// a working client. It is typically deserialized from a configuration file
/// and passed to the `AnalyticsBuilder`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalyticsConfig {
    /// Per-application credential authorizing event ingestion. Empty means
    /// "resolve from the environment".
    pub write_key: String,
    /// Base URL of the ingestion endpoint.
    pub endpoint: String,
    /// Master enable. When false the client accepts calls but queues nothing.
    pub tracking: bool,
    /// Queue length that triggers a flush.
    pub flush_at: usize,
    /// Interval after which queued events are flushed regardless of count.
    pub flush_interval_ms: u64,
    pub autocapture: AutocaptureConfig,
    pub logger: DiagnosticsConfig,
    /// Optional application context attached to every event.
    pub app: Option<AppInfo>,
    pub retry: RetryConfig,
    pub channels: ChannelConfig,
}

impl AnalyticsConfig {
    /// Resolves the effective write key: the configured value, then the
    /// [`WRITE_KEY_ENV`] environment variable, then the demo placeholder.
    /// The second element is true when the placeholder was used.
    pub fn resolve_write_key(&self) -> (String, bool) {
        if !self.write_key.is_empty() {
            return (self.write_key.clone(), false);
        }
        if let Ok(key) = std::env::var(WRITE_KEY_ENV) {
            if !key.is_empty() {
                return (key, false);
            }
        }
        (PLACEHOLDER_WRITE_KEY.to_string(), true)
    }
}

/// Per-category toggles for auto-captured wallet events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AutocaptureConfig {
    pub connect: bool,
    pub disconnect: bool,
    pub chain: bool,
    pub signature: bool,
    pub transaction: bool,
}

impl AutocaptureConfig {
    /// A configuration with every category disabled.
    pub fn disabled() -> Self {
        Self {
            connect: false,
            disconnect: false,
            chain: false,
            signature: false,
            transaction: false,
        }
    }
}

/// Severity levels recognized by the client's diagnostic logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Controls the client's own diagnostic output.
///
/// Messages at a level not listed in `levels` are suppressed; enabled
/// messages are forwarded to the `tracing` ecosystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub levels: Vec<LogLevel>,
}

/// Application context attached to every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// Bounds the delivery retry behavior for a failed batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Total attempts (including the first) before a batch is dropped.
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    /// The cool-down applied after the given (1-based) failed attempt:
    /// exponential from `base_backoff_ms`, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let millis = self
            .base_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

/// Defines capacities for the client's internal channels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChannelConfig {
    /// The buffer capacity for the command channel to the pipeline worker.
    /// Enqueueing never blocks; events arriving while the buffer is full
    /// are dropped with a warning.
    pub command_buffer: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            write_key: String::new(),
            endpoint: "https://ingest.onsight.dev".to_string(),
            tracking: true,
            flush_at: 10,
            flush_interval_ms: 15_000,
            autocapture: AutocaptureConfig::default(),
            logger: DiagnosticsConfig::default(),
            app: None,
            retry: RetryConfig::default(),
            channels: ChannelConfig::default(),
        }
    }
}

impl Default for AutocaptureConfig {
    fn default() -> Self {
        Self {
            connect: true,
            disconnect: true,
            chain: true,
            signature: true,
            transaction: true,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            levels: vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error],
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
        }
    }
}
