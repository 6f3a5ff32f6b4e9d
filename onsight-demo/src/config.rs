use anyhow::{Context, Result};
use onsight_analytics::config::AnalyticsConfig;
use onsight_logger::logging::LogConfig;
use serde::Deserialize;

/// The top-level configuration for the demo application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DemoConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub demo: DemoSpecificConfig,
}

/// Contains settings that are unique to the demo binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DemoSpecificConfig {
    /// Path of the sled database holding the device identity.
    pub db_path: String,
    /// Default wallet provider profile; the CLI flag takes precedence.
    pub provider: String,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for DemoSpecificConfig {
    fn default() -> Self {
        Self {
            db_path: "./onsight_demo.db".to_string(),
            provider: "reown".to_string(),
            log: LogConfig::default(),
        }
    }
}

/// Loads the demo configuration from a specified TOML file.
///
/// It uses the `config` crate to read the file and deserialize it into the
/// `DemoConfig` struct; `ONSIGHT__`-prefixed environment variables override
/// file values.
pub fn load_config(path: &str) -> Result<DemoConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("ONSIGHT").separator("__"));

    let settings: DemoConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
