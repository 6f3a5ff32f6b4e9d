//! # Analytics Client
//!
//! The `AnalyticsClient` is a clonable, thread-safe handle to the background
//! [`Pipeline`](crate::pipeline) worker. Every method is synchronous, O(1),
//! and infallible: calls enqueue a command on a bounded channel and return
//! immediately, so the calling thread is never blocked by delivery, and a
//! failure inside the analytics path can never interrupt the application.
//!
//! Construction goes through the [`AnalyticsBuilder`], which injects the
//! transport, device store, and middleware, spawns the worker, and hands the
//! application an explicitly managed lifetime: init at startup, `shutdown`
//! (with a final best-effort flush) on exit.

use crate::{
    autocapture::AutocaptureWorker,
    config::{AnalyticsConfig, AutocaptureConfig},
    diagnostics::Diagnostics,
    events::{EventKind, Properties},
    middleware::Middleware,
    pipeline::{Command, Pipeline, PipelineContext},
    session::{Identity, Session},
    storage::{DeviceStore, MemoryDeviceStore},
    transport::{HttpTransport, Transport},
};
use lazy_static::lazy_static;
use onsight_wallet::watcher::WatcherHandle;
use serde_json::Value;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

lazy_static! {
    static ref ACTIVE_WRITE_KEYS: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
}

/// Errors surfaced during client construction. Everything after a successful
/// `init` is reported through the diagnostic logger instead.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("an analytics client for write key '{0}' is already running")]
    AlreadyInitialized(String),
}

/// Holds a write key's slot in the process-wide registry. Constructing two
/// live clients with the same write key is refused; the slot is released
/// when the pipeline worker exits.
pub(crate) struct InitGuard {
    write_key: String,
}

impl InitGuard {
    fn acquire(write_key: &str) -> Result<Self, InitError> {
        let mut keys = ACTIVE_WRITE_KEYS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !keys.insert(write_key.to_string()) {
            return Err(InitError::AlreadyInitialized(write_key.to_string()));
        }
        Ok(Self {
            write_key: write_key.to_string(),
        })
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        let mut keys = ACTIVE_WRITE_KEYS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.remove(&self.write_key);
    }
}

/// A clonable handle for reporting analytics events.
#[derive(Clone)]
pub struct AnalyticsClient {
    command_tx: mpsc::Sender<Command>,
    consent_opted_out: Arc<AtomicBool>,
    config: Arc<AnalyticsConfig>,
    diag: Diagnostics,
}

impl AnalyticsClient {
    /// Enqueues a custom event. Silently dropped (with a debug log) while
    /// consent is opted out or tracking is disabled.
    pub fn track(&self, name: impl Into<String>, properties: Properties) {
        self.send_event(EventKind::Track, name.into(), properties);
    }

    /// Enqueues a page-view navigation event.
    pub fn page(&self, category: &str, name: impl Into<String>, mut properties: Properties) {
        properties.insert("category".to_string(), Value::String(category.to_string()));
        self.send_event(EventKind::Page, name.into(), properties);
    }

    /// Enqueues a screen-view navigation event (mobile naming).
    pub fn screen(&self, name: impl Into<String>) {
        self.send_event(EventKind::Screen, name.into(), Properties::new());
    }

    /// Associates subsequent events with `identity`.
    ///
    /// The identity takes effect for every event queued after this call,
    /// whether or not the returned future is awaited; already-queued events
    /// keep their original attribution. Completion of the future signals
    /// that the identity was persisted and the identify event dispatched to
    /// the queue, not merely that the command was accepted.
    pub async fn identify(&self, identity: Identity, traits: Properties) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = Command::Identify {
            identity,
            traits,
            timestamp: chrono::Utc::now(),
            ack: ack_tx,
        };
        if self.command_tx.try_send(command).is_err() {
            self.diag
                .warn("identify dropped: pipeline busy or shut down");
            return;
        }
        let _ = ack_rx.await;
    }

    /// Opts the session out of tracking. Subsequent `track`/`page`/`screen`
    /// calls and auto-captured events are no-ops until opted back in.
    pub fn opt_out_tracking(&self) {
        self.consent_opted_out.store(true, Ordering::Relaxed);
        self.diag.info("tracking consent: opted out");
    }

    /// Opts the session back into tracking.
    pub fn opt_in_tracking(&self) {
        self.consent_opted_out.store(false, Ordering::Relaxed);
        self.diag.info("tracking consent: opted in");
    }

    /// Reads the current consent flag.
    pub fn has_opted_out_tracking(&self) -> bool {
        self.consent_opted_out.load(Ordering::Relaxed)
    }

    /// Requests an immediate flush and waits until the attempt completes.
    /// Delivery failures are retried in the background as usual.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .command_tx
            .try_send(Command::Flush { ack: Some(ack_tx) })
            .is_err()
        {
            self.diag.warn("flush request dropped: pipeline busy or shut down");
            return;
        }
        let _ = ack_rx.await;
    }

    /// Gracefully stops the background worker: processes every command
    /// queued so far, makes a final best-effort flush, and releases the
    /// write key for re-initialization.
    pub async fn shutdown(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .command_tx
            .send(Command::Shutdown { ack: ack_tx })
            .await
            .is_err()
        {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Binds auto-capture to a wallet transition source. Returns the join
    /// handle of the spawned capture worker; it exits on its own when the
    /// watcher shuts down.
    pub fn bind_wallet(&self, watcher: &WatcherHandle) -> tokio::task::JoinHandle<()> {
        let worker = AutocaptureWorker::new(self.clone(), watcher.subscribe());
        tokio::spawn(worker.run())
    }

    pub(crate) fn autocapture_config(&self) -> AutocaptureConfig {
        self.config.autocapture.clone()
    }

    pub(crate) fn send_event(&self, kind: EventKind, name: String, properties: Properties) {
        if !self.config.tracking {
            self.diag.debug("tracking disabled; event dropped");
            return;
        }
        if self.has_opted_out_tracking() {
            self.diag.debug("consent opted out; event dropped");
            return;
        }
        let command = Command::Event {
            kind,
            name,
            properties,
            timestamp: chrono::Utc::now(),
        };
        if self.command_tx.try_send(command).is_err() {
            self.diag
                .warn("event dropped: command buffer full or pipeline shut down");
        }
    }
}

type ReadyCallback = Box<dyn FnOnce(&AnalyticsClient) + Send>;

/// Explicit, dependency-injected construction of an [`AnalyticsClient`].
pub struct AnalyticsBuilder {
    config: AnalyticsConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn DeviceStore>>,
    middleware: Vec<Arc<dyn Middleware>>,
    ready: Option<ReadyCallback>,
}

impl AnalyticsBuilder {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            middleware: Vec::new(),
            ready: None,
        }
    }

    /// Overrides the batch sink. Defaults to [`HttpTransport`] against the
    /// configured endpoint.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overrides the device identity store. Defaults to a volatile
    /// in-memory store.
    pub fn device_store(mut self, store: Arc<dyn DeviceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends a middleware to the interceptor list. Middleware run in
    /// registration order for every event.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Registers a callback invoked once the background worker is running.
    pub fn on_ready(mut self, ready: impl FnOnce(&AnalyticsClient) + Send + 'static) -> Self {
        self.ready = Some(Box::new(ready));
        self
    }

    /// Spawns the pipeline worker and returns the client handle.
    pub async fn init(mut self) -> Result<AnalyticsClient, InitError> {
        let config = Arc::new(self.config);
        let diag = Diagnostics::new(&config.logger);

        let (write_key, placeholder) = config.resolve_write_key();
        if placeholder {
            diag.warn(&format!(
                "no write key configured (set {}); using the demo placeholder, events will be rejected upstream",
                crate::config::WRITE_KEY_ENV
            ));
        }
        let guard = InitGuard::acquire(&write_key)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryDeviceStore::new()));
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new(config.endpoint.clone())));

        let device_id = match store.load_device_id().await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let id = Uuid::new_v4().to_string();
                if let Err(e) = store.store_device_id(&id).await {
                    diag.warn(&format!("failed to persist device id: {e:#}"));
                }
                id
            }
            Err(e) => {
                diag.warn(&format!(
                    "device store unavailable ({e:#}); using an ephemeral device id"
                ));
                Uuid::new_v4().to_string()
            }
        };

        let session = Session::new(device_id, config.app.clone());
        let consent_opted_out = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = mpsc::channel(config.channels.command_buffer.max(1));

        let pipeline = Pipeline::new(
            PipelineContext {
                config: config.clone(),
                write_key,
                transport,
                store,
                middleware: self.middleware,
                consent_opted_out: consent_opted_out.clone(),
                diag: diag.clone(),
            },
            session,
            command_rx,
            guard,
        );
        tokio::spawn(pipeline.run());

        let client = AnalyticsClient {
            command_tx,
            consent_opted_out,
            config,
            diag,
        };
        if let Some(ready) = self.ready.take() {
            ready(&client);
        }
        Ok(client)
    }
}
