use anyhow::Result;
use serde::Deserialize;
use std::fs::File;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    prelude::*,
    EnvFilter, Registry,
};

/// Defines the format for log messages.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

/// Defines the destination for log output.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "onsight_analytics=debug,info".
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Path to the log file, required if output is "file".
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            output: LogOutput::Stdout,
            file_path: None,
        }
    }
}

/// Installs the global `tracing` subscriber described by `config`.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.output {
        LogOutput::File => {
            let file_path = config.file_path.as_deref().ok_or_else(|| {
                anyhow::anyhow!("Log output is 'file' but 'file-path' is not specified")
            })?;
            BoxMakeWriter::new(File::create(file_path)?)
        }
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
    };

    let subscriber = Registry::default().with(filter);
    match config.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().with_writer(writer).json())
            .init(),
        LogFormat::Plain => subscriber
            .with(fmt::layer().with_writer(writer).compact())
            .init(),
    }

    Ok(())
}
