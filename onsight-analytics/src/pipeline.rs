//! # Batching Pipeline
//!
//! The `Pipeline` is the background worker behind every `AnalyticsClient`
//! handle. It is the single owner of the event queue and the session state,
//! which makes the ordering guarantees trivial: commands are processed in
//! FIFO order, so an `identify` always takes effect before any event queued
//! after it, and queued events are never reordered.
//!
//! Delivery is single-flighted: while a batch is being retried no new batch
//! is formed, so the same event can never be transmitted twice.

use crate::{
    client::InitGuard,
    config::AnalyticsConfig,
    diagnostics::Diagnostics,
    events::{Event, EventKind, Properties},
    middleware::Middleware,
    session::{Identity, Session},
    storage::DeviceStore,
    transport::Transport,
};
use chrono::{DateTime, Utc};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// Commands accepted by the pipeline worker.
pub(crate) enum Command {
    Event {
        kind: EventKind,
        name: String,
        properties: Properties,
        timestamp: DateTime<Utc>,
    },
    Identify {
        identity: Identity,
        traits: Properties,
        timestamp: DateTime<Utc>,
        ack: oneshot::Sender<()>,
    },
    Flush {
        ack: Option<oneshot::Sender<()>>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

enum CommandOutcome {
    Continue,
    /// A flush attempt was made; the interval timer should restart.
    Flushed,
    Shutdown,
}

/// A batch taken off the queue whose delivery has not succeeded yet. Its
/// contents are frozen so retries always transmit the same events.
struct PendingBatch {
    events: Vec<Event>,
    attempts: u32,
}

/// Shared dependencies handed to the pipeline at construction.
pub(crate) struct PipelineContext {
    pub config: Arc<AnalyticsConfig>,
    pub write_key: String,
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn DeviceStore>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub consent_opted_out: Arc<AtomicBool>,
    pub diag: Diagnostics,
}

pub(crate) struct Pipeline {
    ctx: PipelineContext,
    session: Session,
    queue: VecDeque<Event>,
    pending: Option<PendingBatch>,
    cooldown_until: Option<Instant>,
    command_rx: mpsc::Receiver<Command>,
    /// Releases the per-write-key singleton guard when the worker exits.
    guard: Option<InitGuard>,
}

impl Pipeline {
    pub fn new(
        ctx: PipelineContext,
        session: Session,
        command_rx: mpsc::Receiver<Command>,
        guard: InitGuard,
    ) -> Self {
        Self {
            ctx,
            session,
            queue: VecDeque::new(),
            pending: None,
            cooldown_until: None,
            command_rx,
            guard: Some(guard),
        }
    }

    /// Runs the worker until shutdown. Should be spawned as a single
    /// long-running background task.
    pub async fn run(mut self) {
        let period = Duration::from_millis(self.ctx.config.flush_interval_ms.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_command = self.command_rx.recv() => match maybe_command {
                    Some(command) => match self.handle_command(command).await {
                        CommandOutcome::Continue => {}
                        CommandOutcome::Flushed => ticker.reset(),
                        CommandOutcome::Shutdown => break,
                    },
                    None => {
                        self.ctx.diag.debug("all client handles dropped; pipeline exiting");
                        self.final_flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.try_flush(false).await;
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::Event {
                kind,
                name,
                properties,
                timestamp,
            } => {
                self.enqueue(kind, name, properties, timestamp);
                if self.flush_due() && self.try_flush(false).await {
                    return CommandOutcome::Flushed;
                }
                CommandOutcome::Continue
            }
            Command::Identify {
                identity,
                traits,
                timestamp,
                ack,
            } => {
                let address = identity.address.clone();
                if let Err(e) = self
                    .ctx
                    .store
                    .store_identity(self.session.device_id(), &address)
                    .await
                {
                    self.ctx
                        .diag
                        .warn(&format!("failed to persist identity: {e:#}"));
                }
                self.session.apply_identity(identity);
                if !self.ctx.consent_opted_out.load(Ordering::Relaxed) {
                    self.enqueue(EventKind::Identify, "identify".to_string(), traits, timestamp);
                }
                let _ = ack.send(());
                if self.flush_due() && self.try_flush(false).await {
                    return CommandOutcome::Flushed;
                }
                CommandOutcome::Continue
            }
            Command::Flush { ack } => {
                let attempted = self.try_flush(true).await;
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                if attempted {
                    CommandOutcome::Flushed
                } else {
                    CommandOutcome::Continue
                }
            }
            Command::Shutdown { ack } => {
                self.final_flush().await;
                // Release the singleton guard before acking so the caller
                // can re-initialize immediately after `shutdown` resolves.
                self.guard.take();
                let _ = ack.send(());
                CommandOutcome::Shutdown
            }
        }
    }

    /// Runs the middleware chain and appends the surviving event to the
    /// queue. Attribution happens here: the event captures the session
    /// context as it is at this moment.
    fn enqueue(
        &mut self,
        kind: EventKind,
        name: String,
        properties: Properties,
        timestamp: DateTime<Utc>,
    ) {
        let mut event = Event {
            kind,
            name,
            properties,
            timestamp,
            context: self.session.context(),
        };

        for middleware in &self.ctx.middleware {
            match middleware.process(event) {
                Some(next) => event = next,
                None => {
                    self.ctx.diag.debug("event dropped by middleware");
                    return;
                }
            }
        }

        self.queue.push_back(event);
    }

    fn flush_due(&self) -> bool {
        self.pending.is_none() && self.queue.len() >= self.ctx.config.flush_at.max(1)
    }

    /// Attempts one delivery. Forms a new batch from the queue unless a
    /// failed one is still pending, in which case that batch is retried
    /// as-is. Returns whether an attempt was made.
    async fn try_flush(&mut self, force: bool) -> bool {
        if !force {
            if let Some(until) = self.cooldown_until {
                if Instant::now() < until {
                    return false;
                }
            }
        }

        if self.pending.is_none() {
            if self.queue.is_empty() {
                return false;
            }
            let events: Vec<Event> = self.queue.drain(..).collect();
            self.pending = Some(PendingBatch { events, attempts: 0 });
        }

        let (count, attempts, result) = match self.pending.as_mut() {
            Some(batch) => {
                batch.attempts += 1;
                let result = self
                    .ctx
                    .transport
                    .send_batch(&self.ctx.write_key, &batch.events)
                    .await;
                (batch.events.len(), batch.attempts, result)
            }
            None => return false,
        };

        match result {
            Ok(()) => {
                self.pending = None;
                self.cooldown_until = None;
                self.ctx.diag.debug(&format!("flushed {count} events"));
            }
            Err(e) => {
                let max_attempts = self.ctx.config.retry.max_attempts.max(1);
                if attempts >= max_attempts {
                    self.ctx.diag.error(&format!(
                        "dropping {count} events after {attempts} failed flush attempts: {e:#}"
                    ));
                    self.pending = None;
                    self.cooldown_until = None;
                } else {
                    let backoff = self.ctx.config.retry.backoff(attempts);
                    self.cooldown_until = Some(Instant::now() + backoff);
                    self.ctx.diag.warn(&format!(
                        "flush attempt {attempts}/{max_attempts} failed, next retry in {backoff:?}: {e:#}"
                    ));
                }
            }
        }

        true
    }

    /// Best-effort teardown flush: one attempt per remaining batch, no
    /// backoff. Anything still undelivered afterwards is dropped.
    async fn final_flush(&mut self) {
        loop {
            if !self.try_flush(true).await {
                break;
            }
            if let Some(batch) = self.pending.take() {
                self.ctx.diag.warn(&format!(
                    "dropping {} undelivered events at shutdown",
                    batch.events.len()
                ));
                break;
            }
        }
    }
}
