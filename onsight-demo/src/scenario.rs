//! Scripted demo scenarios.
//!
//! Each scenario presses the buttons a user of the original demo UI would:
//! connect wallet, sign message, send transaction, switch chain, send a
//! custom analytics event, and toggle consent. The wallet is simulated; the
//! analytics path is the real client.

use anyhow::{bail, Context, Result};
use onsight_analytics::{
    client::{AnalyticsBuilder, AnalyticsClient},
    config::AnalyticsConfig,
    events::Properties,
    middleware::RecordingMiddleware,
    session::Identity,
    storage::DeviceStore,
    transport::Transport,
};
use onsight_wallet::{
    sim::SimWallet,
    watcher::{TransitionWatcher, WatcherConfig, WatcherHandle},
};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::{
    cli::RunCmd, config::DemoConfig, providers::ProviderProfile, storage::SledDeviceStore,
};

/// Demo account used by every scenario.
pub const DEMO_ADDRESS: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";

/// Everything a scenario needs: the analytics client, the simulated wallet
/// it observes, and the recent-event recorder used for the closing report.
pub struct DemoContext {
    pub client: AnalyticsClient,
    pub wallet: SimWallet,
    pub watcher: WatcherHandle,
    pub recorder: Arc<RecordingMiddleware>,
    pub profile: &'static ProviderProfile,
}

/// Wires the full demo stack and runs the selected scenario.
pub async fn run_scenario(
    config: &DemoConfig,
    profile: &'static ProviderProfile,
    cmd: &RunCmd,
) -> Result<()> {
    let store = Arc::new(SledDeviceStore::open(&config.demo.db_path)?);
    let mut ctx = build_context(config.analytics.clone(), profile, store, None).await?;

    let result = match cmd.scenario.as_str() {
        "tour" => tour(&mut ctx).await,
        "consent" => consent(&mut ctx).await,
        "autocapture" => autocapture(&mut ctx).await,
        "custom-event" => custom_event(&mut ctx, &cmd.event_name, &cmd.event_properties).await,
        other => bail!("unknown scenario '{other}'"),
    };
    result?;

    // Let the capture worker drain the transition stream before flushing.
    sleep(Duration::from_millis(200)).await;
    ctx.client.flush().await;

    report(&ctx);
    teardown(ctx).await;
    Ok(())
}

/// Builds a [`DemoContext`]: transition watcher, analytics client bound to
/// it, and a simulated wallet publishing into the watcher. Tests inject an
/// in-memory transport; the binary uses the configured HTTP endpoint.
pub async fn build_context(
    analytics: AnalyticsConfig,
    profile: &'static ProviderProfile,
    store: Arc<dyn DeviceStore>,
    transport: Option<Arc<dyn Transport>>,
) -> Result<DemoContext> {
    let (watcher_task, watcher) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher_task.run());

    let recorder = Arc::new(RecordingMiddleware::default());
    let mut builder = AnalyticsBuilder::new(analytics)
        .device_store(store)
        .middleware(recorder.clone())
        .on_ready(|_| tracing::info!("Analytics client ready"));
    if let Some(transport) = transport {
        builder = builder.transport(transport);
    }
    let client = builder
        .init()
        .await
        .context("failed to initialize the analytics client")?;
    client.bind_wallet(&watcher);

    let wallet = SimWallet::new(profile.connector, watcher.clone());
    Ok(DemoContext {
        client,
        wallet,
        watcher,
        recorder,
        profile,
    })
}

/// The original demo's buttons, pressed in order: connect, identify,
/// navigation, sign, send, switch chain, custom event, consent round trip.
pub async fn tour(ctx: &mut DemoContext) -> Result<()> {
    let profile = ctx.profile;

    tracing::info!("Connecting via {}...", profile.connector);
    ctx.wallet
        .connect(DEMO_ADDRESS, profile.default_chain)
        .await;

    ctx.client
        .identify(
            Identity::new(DEMO_ADDRESS).with_provider(profile.connector),
            Properties::new(),
        )
        .await;
    tracing::info!("Identified {}", DEMO_ADDRESS);

    if profile.mobile {
        ctx.client.screen("Wallet");
    } else {
        let mut properties = Properties::new();
        properties.insert(
            "source".to_string(),
            Value::String(profile.name.to_string()),
        );
        ctx.client.page("demo", "wallet-demo", properties);
    }

    let signature = ctx.wallet.sign_message("Hello from Onsight!").await?;
    tracing::info!("Signature received: {}...", &signature[..18]);

    let hash = ctx.wallet.send_transaction(DEMO_ADDRESS, 0).await?;
    tracing::info!("Transaction submitted: {}...", &hash[..18]);

    ctx.wallet.switch_chain(profile.alternate_chain).await?;
    tracing::info!(
        "Switched chain {} -> {}",
        profile.default_chain,
        profile.alternate_chain
    );

    custom_event(ctx, "button_clicked", r#"{"button": "cta", "page": "home"}"#).await?;

    // Consent round trip: the event tracked in between must not show up.
    ctx.client.opt_out_tracking();
    ctx.client.track("should-not-appear", Properties::new());
    ctx.client.opt_in_tracking();

    Ok(())
}

/// Demonstrates the consent toggle around explicit and captured events.
pub async fn consent(ctx: &mut DemoContext) -> Result<()> {
    ctx.wallet
        .connect(DEMO_ADDRESS, ctx.profile.default_chain)
        .await;
    ctx.client.track("before-opt-out", Properties::new());

    ctx.client.opt_out_tracking();
    tracing::info!(
        "Opted out (has_opted_out_tracking = {})",
        ctx.client.has_opted_out_tracking()
    );
    ctx.client.track("while-opted-out", Properties::new());
    ctx.wallet.sign_message("signed while opted out").await?;

    ctx.client.opt_in_tracking();
    tracing::info!(
        "Opted back in (has_opted_out_tracking = {})",
        ctx.client.has_opted_out_tracking()
    );
    ctx.client.track("after-opt-in", Properties::new());

    Ok(())
}

/// Exercises every auto-capture category, including the suppressed
/// duplicate connect.
pub async fn autocapture(ctx: &mut DemoContext) -> Result<()> {
    let profile = ctx.profile;

    ctx.wallet
        .connect(DEMO_ADDRESS, profile.default_chain)
        .await;
    // A reconnect to the same address is suppressed by the watcher.
    ctx.wallet
        .connect(DEMO_ADDRESS, profile.default_chain)
        .await;

    ctx.wallet.switch_chain(profile.alternate_chain).await?;
    ctx.wallet.sign_message("autocapture demo").await?;
    ctx.wallet.send_transaction(DEMO_ADDRESS, 0).await?;
    ctx.wallet.disconnect().await;

    Ok(())
}

/// Tracks a caller-supplied event. Properties are validated here, before
/// `track` is ever called; malformed input never reaches the client.
pub async fn custom_event(ctx: &mut DemoContext, name: &str, raw_properties: &str) -> Result<()> {
    let properties = parse_properties(raw_properties)?;
    ctx.client.track(name.to_string(), properties);
    tracing::info!("Tracked custom event '{}'", name);
    Ok(())
}

/// Parses custom-event properties, rejecting anything that is not a JSON
/// object.
pub fn parse_properties(raw: &str) -> Result<Properties> {
    let value: Value =
        serde_json::from_str(raw).context("event properties must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("event properties must be a JSON object"),
    }
}

/// Prints the recent event log, the demo counterpart of the original
/// floating event-logger panel.
fn report(ctx: &DemoContext) {
    let recent = ctx.recorder.recent();
    tracing::info!("{} events captured this run:", recent.len());
    for event in recent.iter().rev() {
        tracing::info!(
            "  {:?} '{}' (address: {})",
            event.kind,
            event.name,
            event.context.address.as_deref().unwrap_or("anonymous")
        );
    }
}

async fn teardown(ctx: DemoContext) {
    ctx.client.shutdown().await;
    ctx.watcher.stop().await;
}
