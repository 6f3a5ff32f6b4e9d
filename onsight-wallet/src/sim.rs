//! A simulated wallet driver.
//!
//! `SimWallet` stands in for the external wallet SDKs the demo applications
//! would normally wire up. It owns a [`WalletSnapshot`] and publishes every
//! state change and mutation result through a [`WatcherHandle`], which is
//! all a real integration would do as well. Key management and chain RPC
//! are out of scope; signatures and transaction hashes are random bytes.

use crate::{
    events::WalletUpdate,
    state::WalletSnapshot,
    watcher::WatcherHandle,
};
use rand::RngCore;
use thiserror::Error;

/// Errors surfaced by wallet operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,
}

/// A simulated wallet bound to a transition watcher.
pub struct SimWallet {
    connector: String,
    snapshot: WalletSnapshot,
    watcher: WatcherHandle,
}

impl SimWallet {
    pub fn new(connector: impl Into<String>, watcher: WatcherHandle) -> Self {
        Self {
            connector: connector.into(),
            snapshot: WalletSnapshot::default(),
            watcher,
        }
    }

    /// The current wallet state.
    pub fn snapshot(&self) -> &WalletSnapshot {
        &self.snapshot
    }

    /// Connects the wallet to `address` on `chain_id` and publishes the new
    /// snapshot. Re-connecting to the same address publishes an identical
    /// snapshot, which the watcher suppresses.
    pub async fn connect(&mut self, address: impl Into<String>, chain_id: u64) {
        self.snapshot = WalletSnapshot::connected(address, chain_id, self.connector.clone());
        self.publish_snapshot().await;
    }

    /// Disconnects the wallet and publishes the empty snapshot.
    pub async fn disconnect(&mut self) {
        self.snapshot = WalletSnapshot::disconnected();
        self.publish_snapshot().await;
    }

    /// Switches the active chain.
    pub async fn switch_chain(&mut self, chain_id: u64) -> Result<(), WalletError> {
        if !self.snapshot.is_connected() {
            return Err(WalletError::NotConnected);
        }
        self.snapshot.chain_id = Some(chain_id);
        self.publish_snapshot().await;
        Ok(())
    }

    /// Signs a message with the connected account, returning the signature
    /// as a hex string.
    pub async fn sign_message(&mut self, message: &str) -> Result<String, WalletError> {
        let address = self.connected_address()?;
        tracing::debug!("Signing {} byte message for {}", message.len(), address);

        let signature = random_hex(65);
        self.watcher
            .update(WalletUpdate::SignatureCompleted {
                address,
                signature: signature.clone(),
            })
            .await;
        Ok(signature)
    }

    /// Submits a value transfer to `to`, returning the transaction hash as a
    /// hex string.
    pub async fn send_transaction(
        &mut self,
        to: impl Into<String>,
        value_wei: u128,
    ) -> Result<String, WalletError> {
        let address = self.connected_address()?;
        let chain_id = self.snapshot.chain_id.unwrap_or_default();

        let hash = random_hex(32);
        self.watcher
            .update(WalletUpdate::TransactionSubmitted {
                address,
                hash: hash.clone(),
                chain_id,
                to: to.into(),
                value_wei,
            })
            .await;
        Ok(hash)
    }

    fn connected_address(&self) -> Result<String, WalletError> {
        self.snapshot
            .address
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    async fn publish_snapshot(&self) {
        self.watcher
            .update(WalletUpdate::Snapshot(self.snapshot.clone()))
            .await;
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}
