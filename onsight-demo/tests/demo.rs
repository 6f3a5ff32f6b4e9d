use onsight_analytics::{
    config::AnalyticsConfig,
    storage::{DeviceStore, MemoryDeviceStore},
    transport::MemoryTransport,
};
use onsight_demo::{
    providers,
    scenario::{build_context, parse_properties, tour},
    storage::SledDeviceStore,
};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn manual_config(write_key: &str) -> AnalyticsConfig {
    AnalyticsConfig {
        write_key: write_key.to_string(),
        flush_at: 1_000,
        flush_interval_ms: 600_000,
        ..AnalyticsConfig::default()
    }
}

#[tokio::test]
async fn sled_device_id_survives_reopen() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("device.db");
    let path = path.to_str().expect("non-utf8 temp path");

    let first_id;
    {
        let store = SledDeviceStore::open(path).expect("failed to open store");
        assert_eq!(store.load_device_id().await.unwrap(), None);
        store.store_device_id("device-123").await.unwrap();
        store
            .store_identity("device-123", "0xfeed")
            .await
            .unwrap();
        first_id = store.load_device_id().await.unwrap();
        assert_eq!(first_id.as_deref(), Some("device-123"));
    }

    let reopened = SledDeviceStore::open(path).expect("failed to reopen store");
    assert_eq!(reopened.load_device_id().await.unwrap(), first_id);
}

#[test]
fn custom_event_properties_are_validated_before_track() {
    assert!(parse_properties(r#"{"button": "cta"}"#).is_ok());
    assert!(parse_properties("not json").is_err());
    assert!(parse_properties(r#"["an", "array"]"#).is_err());
    assert!(parse_properties("42").is_err());
}

#[tokio::test]
async fn tour_scenario_delivers_the_expected_events() {
    let profile = providers::find("reown").expect("missing reown profile");
    let transport = Arc::new(MemoryTransport::new());
    let store = Arc::new(MemoryDeviceStore::new());

    let mut ctx = build_context(
        manual_config("wk-demo-tour"),
        profile,
        store,
        Some(transport.clone()),
    )
    .await
    .expect("failed to build demo context");

    tour(&mut ctx).await.expect("tour scenario failed");

    sleep(Duration::from_millis(300)).await;
    ctx.client.flush().await;

    let delivered: Vec<String> = transport
        .batches()
        .into_iter()
        .flatten()
        .map(|event| event.name)
        .collect();

    for expected in [
        "connect",
        "identify",
        "wallet-demo",
        "signature",
        "transaction",
        "chain-changed",
        "button_clicked",
    ] {
        assert!(
            delivered.iter().any(|name| name == expected),
            "missing '{expected}' in {delivered:?}"
        );
    }
    assert!(
        !delivered.iter().any(|name| name == "should-not-appear"),
        "opted-out event was delivered"
    );

    ctx.client.shutdown().await;
    ctx.watcher.stop().await;
}

#[tokio::test]
async fn mobile_profile_reports_screen_views() {
    let profile = providers::find("mobile").expect("missing mobile profile");
    let transport = Arc::new(MemoryTransport::new());
    let store = Arc::new(MemoryDeviceStore::new());

    let mut ctx = build_context(
        manual_config("wk-demo-mobile"),
        profile,
        store,
        Some(transport.clone()),
    )
    .await
    .expect("failed to build demo context");

    tour(&mut ctx).await.expect("tour scenario failed");

    sleep(Duration::from_millis(300)).await;
    ctx.client.flush().await;

    let delivered: Vec<_> = transport.batches().into_iter().flatten().collect();
    assert!(
        delivered
            .iter()
            .any(|event| event.kind == onsight_analytics::events::EventKind::Screen
                && event.name == "Wallet"),
        "expected a screen view named 'Wallet'"
    );

    ctx.client.shutdown().await;
    ctx.watcher.stop().await;
}
