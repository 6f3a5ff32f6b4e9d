use onsight_analytics::{
    client::{AnalyticsBuilder, AnalyticsClient, InitError},
    config::AnalyticsConfig,
    events::{Event, EventKind, Properties},
    middleware::{Middleware, RecordingMiddleware},
    session::Identity,
    storage::{DeviceStore, MemoryDeviceStore},
    transport::MemoryTransport,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// A config that never flushes on its own, so tests control delivery.
fn manual_config(write_key: &str) -> AnalyticsConfig {
    AnalyticsConfig {
        write_key: write_key.to_string(),
        flush_at: 1_000,
        flush_interval_ms: 600_000,
        ..AnalyticsConfig::default()
    }
}

fn props(key: &str, value: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert(key.to_string(), Value::String(value.to_string()));
    properties
}

async fn build(
    config: AnalyticsConfig,
    transport: Arc<MemoryTransport>,
) -> AnalyticsClient {
    AnalyticsBuilder::new(config)
        .transport(transport)
        .init()
        .await
        .expect("client init failed")
}

async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn names(batch: &[Event]) -> Vec<&str> {
    batch.iter().map(|event| event.name.as_str()).collect()
}

#[tokio::test]
async fn flush_at_threshold_sends_one_ordered_batch() {
    let transport = Arc::new(MemoryTransport::new());
    let config = AnalyticsConfig {
        write_key: "wk-threshold".to_string(),
        flush_at: 10,
        flush_interval_ms: 600_000,
        ..AnalyticsConfig::default()
    };
    let client = build(config, transport.clone()).await;

    for i in 0..9 {
        client.track(format!("event-{i}"), Properties::new());
    }
    sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.batch_count(), 0, "no flush before the threshold");

    client.track("event-9", Properties::new());
    wait_until(|| transport.batch_count() == 1, "threshold flush").await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    let expected: Vec<String> = (0..10).map(|i| format!("event-{i}")).collect();
    assert_eq!(names(&batches[0]), expected);

    client.shutdown().await;
}

#[tokio::test]
async fn interval_elapses_and_flushes_a_partial_queue() {
    let transport = Arc::new(MemoryTransport::new());
    let config = AnalyticsConfig {
        write_key: "wk-interval".to_string(),
        flush_at: 100,
        flush_interval_ms: 200,
        ..AnalyticsConfig::default()
    };
    let client = build(config, transport.clone()).await;

    client.track("a", Properties::new());
    client.track("b", Properties::new());
    client.track("c", Properties::new());

    wait_until(|| transport.batch_count() == 1, "interval flush").await;
    assert_eq!(names(&transport.batches()[0]), vec!["a", "b", "c"]);

    client.shutdown().await;
}

#[tokio::test]
async fn opted_out_tracks_transmit_nothing() {
    let transport = Arc::new(MemoryTransport::new());
    let client = build(manual_config("wk-optout"), transport.clone()).await;

    client.opt_out_tracking();
    assert!(client.has_opted_out_tracking());
    for i in 0..15 {
        client.track(format!("silenced-{i}"), Properties::new());
    }
    client.flush().await;
    assert_eq!(transport.event_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn consent_round_trip_resumes_queueing() {
    let transport = Arc::new(MemoryTransport::new());
    let client = build(manual_config("wk-roundtrip"), transport.clone()).await;

    client.opt_out_tracking();
    client.track("while-out", Properties::new());
    client.opt_in_tracking();
    assert!(!client.has_opted_out_tracking());

    client.track("while-in", Properties::new());
    client.flush().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(names(&batches[0]), vec!["while-in"]);

    client.shutdown().await;
}

#[tokio::test]
async fn identify_attributes_subsequent_events_only() {
    let transport = Arc::new(MemoryTransport::new());
    let client = build(manual_config("wk-identify"), transport.clone()).await;

    client.track("before", Properties::new());
    client
        .identify(
            Identity::new("0xabc").with_provider("MetaMask"),
            props("plan", "pro"),
        )
        .await;
    client.track("after", Properties::new());
    client.flush().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(names(batch), vec!["before", "identify", "after"]);

    assert_eq!(batch[0].context.address, None, "no retroactive attribution");
    assert_eq!(batch[1].kind, EventKind::Identify);
    assert_eq!(batch[1].context.address.as_deref(), Some("0xabc"));
    assert_eq!(batch[2].context.address.as_deref(), Some("0xabc"));
    assert_eq!(batch[2].context.provider_name.as_deref(), Some("MetaMask"));

    client.shutdown().await;
}

#[tokio::test]
async fn failed_flush_keeps_events_for_retry() {
    let transport = Arc::new(MemoryTransport::new());
    transport.fail_next(1);
    let config = AnalyticsConfig {
        write_key: "wk-retry".to_string(),
        flush_at: 3,
        flush_interval_ms: 100,
        retry: onsight_analytics::config::RetryConfig {
            max_attempts: 5,
            base_backoff_ms: 30,
            max_backoff_ms: 1_000,
        },
        ..AnalyticsConfig::default()
    };
    let client = build(config, transport.clone()).await;

    client.track("a", Properties::new());
    client.track("b", Properties::new());
    client.track("c", Properties::new());

    // First attempt fails; the batch must survive intact for the retry.
    wait_until(|| transport.batch_count() == 1, "retried delivery").await;
    assert_eq!(names(&transport.batches()[0]), vec!["a", "b", "c"]);

    client.shutdown().await;
}

#[tokio::test]
async fn retries_are_bounded_and_do_not_wedge_the_pipeline() {
    let transport = Arc::new(MemoryTransport::new());
    transport.fail_next(2);
    let config = AnalyticsConfig {
        write_key: "wk-bounded".to_string(),
        flush_at: 1,
        flush_interval_ms: 50,
        retry: onsight_analytics::config::RetryConfig {
            max_attempts: 2,
            base_backoff_ms: 10,
            max_backoff_ms: 100,
        },
        ..AnalyticsConfig::default()
    };
    let client = build(config, transport.clone()).await;

    client.track("doomed", Properties::new());
    // Both attempts fail and the batch is dropped; later events still flow.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(transport.batch_count(), 0);

    client.track("survivor", Properties::new());
    wait_until(|| transport.batch_count() == 1, "post-drop delivery").await;
    assert_eq!(names(&transport.batches()[0]), vec!["survivor"]);

    client.shutdown().await;
}

#[tokio::test]
async fn master_tracking_switch_disables_the_client() {
    let transport = Arc::new(MemoryTransport::new());
    let config = AnalyticsConfig {
        tracking: false,
        ..manual_config("wk-disabled")
    };
    let client = build(config, transport.clone()).await;

    client.track("ignored", Properties::new());
    client.flush().await;
    assert_eq!(transport.event_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn same_write_key_refuses_a_second_client() {
    let transport = Arc::new(MemoryTransport::new());
    let first = build(manual_config("wk-guard"), transport.clone()).await;

    let second = AnalyticsBuilder::new(manual_config("wk-guard"))
        .transport(transport.clone())
        .init()
        .await;
    assert!(matches!(second, Err(InitError::AlreadyInitialized(_))));

    first.shutdown().await;

    // After shutdown the key is released and init succeeds again.
    let third = build(manual_config("wk-guard"), transport).await;
    third.shutdown().await;
}

#[tokio::test]
async fn device_id_is_stable_across_clients_sharing_a_store() {
    let transport = Arc::new(MemoryTransport::new());
    let store = Arc::new(MemoryDeviceStore::new());

    let first = AnalyticsBuilder::new(manual_config("wk-device-a"))
        .transport(transport.clone())
        .device_store(store.clone())
        .init()
        .await
        .expect("first init failed");
    first.track("one", Properties::new());
    first.identify(Identity::new("0xfeed"), Properties::new()).await;
    first.flush().await;
    first.shutdown().await;

    assert_eq!(store.last_address().as_deref(), Some("0xfeed"));
    let stored = store
        .load_device_id()
        .await
        .expect("store read failed")
        .expect("device id missing");

    let second = AnalyticsBuilder::new(manual_config("wk-device-b"))
        .transport(transport.clone())
        .device_store(store.clone())
        .init()
        .await
        .expect("second init failed");
    second.track("two", Properties::new());
    second.flush().await;
    second.shutdown().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0][0].context.device_id, stored);
    assert_eq!(batches[1][0].context.device_id, stored);
}

struct DropByName {
    name: &'static str,
}

impl Middleware for DropByName {
    fn process(&self, event: Event) -> Option<Event> {
        if event.name == self.name {
            None
        } else {
            Some(event)
        }
    }
}

#[tokio::test]
async fn middleware_runs_in_order_and_may_drop() {
    let transport = Arc::new(MemoryTransport::new());
    let recorder = Arc::new(RecordingMiddleware::default());
    let client = AnalyticsBuilder::new(manual_config("wk-middleware"))
        .transport(transport.clone())
        .middleware(recorder.clone())
        .middleware(Arc::new(DropByName { name: "drop-me" }))
        .init()
        .await
        .expect("client init failed");

    client.track("keep-me", Properties::new());
    client.track("drop-me", Properties::new());
    client.flush().await;

    // The recorder runs before the dropper, so it sees both events.
    assert_eq!(recorder.len(), 2);
    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(names(&batches[0]), vec!["keep-me"]);

    client.shutdown().await;
}

#[tokio::test]
async fn recording_middleware_is_bounded_newest_first() {
    let transport = Arc::new(MemoryTransport::new());
    let recorder = Arc::new(RecordingMiddleware::new(5));
    let client = AnalyticsBuilder::new(manual_config("wk-recorder"))
        .transport(transport.clone())
        .middleware(recorder.clone())
        .init()
        .await
        .expect("client init failed");

    for i in 0..8 {
        client.track(format!("event-{i}"), Properties::new());
    }
    client.flush().await;

    let recent = recorder.recent();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].name, "event-7");
    assert_eq!(recent[4].name, "event-3");

    client.shutdown().await;
}

#[tokio::test]
async fn ready_callback_fires_once_initialized() {
    let transport = Arc::new(MemoryTransport::new());
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let client = AnalyticsBuilder::new(manual_config("wk-ready"))
        .transport(transport)
        .on_ready(move |_client| {
            ready_tx.send(()).ok();
        })
        .init()
        .await
        .expect("client init failed");

    ready_rx.await.expect("ready callback never fired");
    client.shutdown().await;
}
