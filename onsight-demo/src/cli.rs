use clap::{Parser, Subcommand};

/// The main CLI structure for the Onsight demo.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Defines the available subcommands for the application.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a demo scenario against a simulated wallet.
    Run(RunCmd),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to the demo configuration TOML file.
    /// If not provided, default values will be used.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Wallet provider profile to emulate (reown, porto, privy, dynamic,
    /// metamask, web3-onboard, mobile). Overrides the configured provider.
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Scenario to run: tour, consent, autocapture, or custom-event.
    #[arg(short, long, default_value = "tour")]
    pub scenario: String,

    /// Event name for the custom-event scenario.
    #[arg(long, default_value = "button_clicked")]
    pub event_name: String,

    /// Event properties for the custom-event scenario, as a JSON object.
    #[arg(long, default_value = "{\"button\": \"cta\", \"page\": \"home\"}")]
    pub event_properties: String,
}
