//! Demo applications for the Onsight analytics SDK.
//!
//! The original demos shipped one application per wallet provider, each
//! wiring the provider's connection SDK to the analytics client and exposing
//! the same handful of buttons. Here the providers are profiles of a single
//! binary: `onsight-demo run --provider reown --scenario tour` drives a
//! simulated wallet through connect, sign, send, and chain-switch while the
//! real analytics client captures and delivers the resulting events.
pub mod cli;
pub mod config;
pub mod providers;
pub mod scenario;
pub mod storage;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{load_config, DemoConfig};

/// The main entry point for running the demo application logic.
/// This function handles CLI parsing, configuration, and scenario startup.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let config = load_config_from_cli(&run_cmd)?;
    onsight_logger::logging::init(&config.demo.log)?;
    tracing::info!("Configuration loaded: {:#?}", &config);

    let provider_name = run_cmd
        .provider
        .clone()
        .unwrap_or_else(|| config.demo.provider.clone());
    let profile = providers::find(&provider_name)
        .ok_or_else(|| anyhow!("unknown provider '{}'", provider_name))?;
    tracing::info!(
        "Emulating the '{}' integration ({})",
        profile.name,
        profile.connector
    );

    scenario::run_scenario(&config, profile, &run_cmd).await
}

/// Loads the demo configuration based on the provided CLI command.
fn load_config_from_cli(run_cmd: &cli::RunCmd) -> Result<DemoConfig> {
    if let Some(config_path) = &run_cmd.config {
        println!("Loading configuration from '{}'", config_path);
        load_config(config_path)
    } else {
        println!("No config file provided, using default settings.");
        Ok(DemoConfig::default())
    }
}
