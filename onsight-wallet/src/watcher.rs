//! # Transition Watcher
//!
//! The `TransitionWatcher` is a background worker that converts raw wallet
//! updates into a stream of committed transitions.
//!
//! ## Purpose
//! Wallet libraries re-publish their reactive state freely: the same address
//! may be reported many times, and a chain id may arrive with or without a
//! connection. The watcher diffs every incoming snapshot against the last
//! committed one and notifies subscribers exactly once per real transition,
//! in the order the transitions occurred.

use crate::{
    events::{WalletTransition, WalletUpdate},
    state::WalletSnapshot,
};
use futures::future;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;

/// Buffer capacities for the watcher's channels.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// The buffer capacity for the command channel to the watcher.
    pub command_buffer: usize,
    /// The buffer capacity for individual subscriber channels.
    pub listener_buffer: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            command_buffer: 128,
            listener_buffer: 64,
        }
    }
}

/// Defines commands that can be sent to the watcher task.
#[derive(Debug)]
pub enum WatcherCommand {
    Subscribe(u64, mpsc::Sender<WalletTransition>),
    Unsubscribe(u64),
    Update(WalletUpdate),
    Shutdown,
}

/// A clonable handle for publishing wallet updates and creating subscriptions.
#[derive(Debug, Clone)]
pub struct WatcherHandle {
    command_tx: mpsc::Sender<WatcherCommand>,
    next_subscriber_id: Arc<AtomicU64>,
    listener_buffer: usize,
}

impl WatcherHandle {
    /// Publishes a raw wallet update to the watcher.
    pub async fn update(&self, update: WalletUpdate) {
        if self
            .command_tx
            .send(WatcherCommand::Update(update))
            .await
            .is_err()
        {
            tracing::warn!("Failed to publish wallet update: watcher may be down");
        }
    }

    /// Creates a new subscription to the committed transition stream.
    ///
    /// Registration is ordered before any update published through this
    /// handle afterwards, so a subscriber never misses a transition that
    /// follows its creation.
    pub fn subscribe(&self) -> TransitionListener {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.listener_buffer);

        if let Err(mpsc::error::TrySendError::Full(command)) =
            self.command_tx.try_send(WatcherCommand::Subscribe(id, tx))
        {
            let command_tx = self.command_tx.clone();
            tokio::spawn(async move {
                command_tx.send(command).await.ok();
            });
        }

        TransitionListener {
            rx,
            unsubscribe_info: Some((id, self.command_tx.clone())),
        }
    }

    /// Sends a shutdown signal to the watcher task.
    pub async fn stop(&self) {
        if self
            .command_tx
            .send(WatcherCommand::Shutdown)
            .await
            .is_err()
        {
            tracing::warn!("Failed to send shutdown to watcher: it may already be down");
        }
    }
}

/// A subscription to the committed transition stream.
///
/// It registers itself with the `TransitionWatcher` on creation and handles
/// automatic unsubscription when it is dropped, ensuring clean resource
/// management.
#[derive(Debug)]
pub struct TransitionListener {
    rx: mpsc::Receiver<WalletTransition>,
    /// Contains the subscriber id and command channel needed for
    /// unsubscribing. This is an `Option` to allow for manual unsubscription
    /// by taking the value.
    unsubscribe_info: Option<(u64, mpsc::Sender<WatcherCommand>)>,
}

impl TransitionListener {
    /// Receives the next committed transition. Returns `None` if the stream
    /// is closed.
    pub async fn next_transition(&mut self) -> Option<WalletTransition> {
        self.rx.recv().await
    }

    /// Manually unsubscribes the listener from the watcher.
    ///
    /// This method consumes the listener, preventing further use. After this
    /// is called, the automatic `Drop` implementation will not attempt to
    /// unsubscribe a second time.
    pub async fn unsubscribe(mut self) {
        if let Some((id, command_tx)) = self.unsubscribe_info.take() {
            tracing::debug!("Manual unsubscribe for transition listener {}", id);
            let _ = command_tx.send(WatcherCommand::Unsubscribe(id)).await;
        }
    }
}

impl Drop for TransitionListener {
    fn drop(&mut self) {
        // Only perform automatic unsubscription if it hasn't been done manually.
        if let Some((id, command_tx)) = self.unsubscribe_info.take() {
            tracing::debug!("Automatic unsubscribe (on drop) for transition listener {}", id);
            tokio::spawn(async move {
                command_tx.send(WatcherCommand::Unsubscribe(id)).await.ok();
            });
        }
    }
}

/// A background worker that turns wallet updates into committed transitions.
///
/// It owns the last committed [`WalletSnapshot`] and a map of active
/// subscribers; each incoming update is diffed against the committed state
/// and the resulting transitions are fanned out to every subscriber.
pub struct TransitionWatcher {
    state: WalletSnapshot,
    subscribers: HashMap<u64, mpsc::Sender<WalletTransition>>,
    command_rx: mpsc::Receiver<WatcherCommand>,
}

impl TransitionWatcher {
    /// Creates a new `TransitionWatcher` and its associated [`WatcherHandle`].
    ///
    /// The watcher does not start processing until [`run()`] is spawned.
    ///
    /// [`run()`]: TransitionWatcher::run
    pub fn new(config: WatcherConfig) -> (Self, WatcherHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let watcher = Self {
            state: WalletSnapshot::default(),
            subscribers: HashMap::new(),
            command_rx,
        };
        let handle = WatcherHandle {
            command_tx,
            next_subscriber_id: Arc::new(AtomicU64::new(0)),
            listener_buffer: config.listener_buffer,
        };
        (watcher, handle)
    }

    /// Runs the main event loop for the watcher.
    pub async fn run(mut self) {
        tracing::info!("Transition watcher started. Waiting for wallet updates...");
        while let Some(command) = self.command_rx.recv().await {
            if self.handle_command(command).await {
                break;
            }
        }
        tracing::info!("Transition watcher has shut down.");
    }

    /// Handles an incoming command. Returns `true` if the watcher should
    /// shut down.
    async fn handle_command(&mut self, command: WatcherCommand) -> bool {
        match command {
            WatcherCommand::Subscribe(id, tx) => {
                tracing::debug!("Registering transition listener {}", id);
                self.subscribers.insert(id, tx);
            }
            WatcherCommand::Unsubscribe(id) => {
                tracing::debug!("Unregistering transition listener {}", id);
                self.subscribers.remove(&id);
            }
            WatcherCommand::Update(update) => self.handle_update(update).await,
            WatcherCommand::Shutdown => {
                tracing::info!("Received shutdown command. Exiting.");
                return true;
            }
        }
        false
    }

    /// Diffs an update against the committed state and notifies subscribers.
    async fn handle_update(&mut self, update: WalletUpdate) {
        let transitions = match update {
            WalletUpdate::Snapshot(next) => {
                let transitions = diff_snapshots(&self.state, &next);
                self.state = next;
                transitions
            }
            WalletUpdate::SignatureCompleted { address, signature } => {
                vec![WalletTransition::SignatureCompleted { address, signature }]
            }
            WalletUpdate::TransactionSubmitted {
                address,
                hash,
                chain_id,
                to,
                value_wei,
            } => vec![WalletTransition::TransactionSubmitted {
                address,
                hash,
                chain_id,
                to,
                value_wei,
            }],
        };

        for transition in transitions {
            self.notify(transition).await;
        }
    }

    /// Fans a transition out to all subscribers, pruning any that are gone.
    async fn notify(&mut self, transition: WalletTransition) {
        let sends = self.subscribers.iter().map(|(id, tx)| {
            let transition = transition.clone();
            async move {
                if tx.send(transition).await.is_err() {
                    tracing::warn!("Transition listener {} disconnected. It will be removed.", id);
                    return Some(*id);
                }
                None
            }
        });

        let results = future::join_all(sends).await;
        for id_to_remove in results.into_iter().flatten() {
            self.subscribers.remove(&id_to_remove);
        }
    }
}

/// Computes the committed transitions between two snapshots.
///
/// Duplicate snapshots produce nothing; an address replacement produces a
/// `Disconnected` for the old address followed by a `Connected` for the new
/// one; a chain id reported without a connection produces nothing.
fn diff_snapshots(prev: &WalletSnapshot, next: &WalletSnapshot) -> Vec<WalletTransition> {
    let mut transitions = Vec::new();

    match (&prev.address, &next.address) {
        (None, Some(address)) => transitions.push(WalletTransition::Connected {
            address: address.clone(),
            chain_id: next.chain_id,
            connector: next.connector.clone(),
        }),
        (Some(address), None) => transitions.push(WalletTransition::Disconnected {
            address: address.clone(),
        }),
        (Some(old), Some(new)) if old != new => {
            transitions.push(WalletTransition::Disconnected {
                address: old.clone(),
            });
            transitions.push(WalletTransition::Connected {
                address: new.clone(),
                chain_id: next.chain_id,
                connector: next.connector.clone(),
            });
        }
        _ => {}
    }

    // A chain change is only a transition of its own while the connection
    // itself is unchanged; otherwise the new chain id rides on `Connected`.
    if prev.address.is_some() && prev.address == next.address {
        if let Some(chain_id) = next.chain_id {
            if prev.chain_id != next.chain_id {
                transitions.push(WalletTransition::ChainChanged {
                    chain_id,
                    previous: prev.chain_id,
                });
            }
        }
    }

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(address: &str, chain_id: u64) -> WalletSnapshot {
        WalletSnapshot::connected(address, chain_id, "TestConnector")
    }

    #[test]
    fn connect_from_empty_fires_once() {
        let transitions = diff_snapshots(&WalletSnapshot::default(), &connected("0xabc", 1));
        assert_eq!(transitions.len(), 1);
        assert!(matches!(
            &transitions[0],
            WalletTransition::Connected { address, chain_id: Some(1), .. } if address == "0xabc"
        ));
    }

    #[test]
    fn identical_snapshot_is_suppressed() {
        let snapshot = connected("0xabc", 1);
        assert!(diff_snapshots(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn chain_change_while_connected() {
        let transitions = diff_snapshots(&connected("0xabc", 1), &connected("0xabc", 42161));
        assert_eq!(transitions.len(), 1);
        assert!(matches!(
            transitions[0],
            WalletTransition::ChainChanged {
                chain_id: 42161,
                previous: Some(1)
            }
        ));
    }

    #[test]
    fn chain_without_connection_is_ignored() {
        let next = WalletSnapshot {
            chain_id: Some(5),
            ..WalletSnapshot::default()
        };
        assert!(diff_snapshots(&WalletSnapshot::default(), &next).is_empty());
    }

    #[test]
    fn address_replacement_disconnects_then_connects() {
        let transitions = diff_snapshots(&connected("0xaaa", 1), &connected("0xbbb", 1));
        assert_eq!(transitions.len(), 2);
        assert!(matches!(
            &transitions[0],
            WalletTransition::Disconnected { address } if address == "0xaaa"
        ));
        assert!(matches!(
            &transitions[1],
            WalletTransition::Connected { address, .. } if address == "0xbbb"
        ));
    }
}
