//! # Auto-Capture
//!
//! The `AutocaptureWorker` subscribes to a wallet transition source and
//! synthesizes one analytics event per committed transition, without any
//! caller involvement. Each of the five categories (connect, disconnect,
//! chain, signature, transaction) is independently toggleable through
//! [`AutocaptureConfig`](crate::config::AutocaptureConfig).
//!
//! The worker observes the wallet through the transition stream only and
//! reports events through the regular client handle, so consent gating and
//! queue ordering apply exactly as they do for explicit calls. A dead
//! analytics pipeline can never disturb a wallet operation.

use crate::{
    client::AnalyticsClient,
    config::AutocaptureConfig,
    events::{EventKind, Properties},
};
use onsight_wallet::{events::WalletTransition, watcher::TransitionListener};
use serde_json::Value;

pub struct AutocaptureWorker {
    client: AnalyticsClient,
    config: AutocaptureConfig,
    listener: TransitionListener,
}

impl AutocaptureWorker {
    pub fn new(client: AnalyticsClient, listener: TransitionListener) -> Self {
        let config = client.autocapture_config();
        Self {
            client,
            config,
            listener,
        }
    }

    /// Consumes transitions until the watcher shuts down.
    pub async fn run(mut self) {
        while let Some(transition) = self.listener.next_transition().await {
            self.capture(transition);
        }
        tracing::debug!("wallet transition stream closed; auto-capture stopped");
    }

    fn capture(&self, transition: WalletTransition) {
        match transition {
            WalletTransition::Connected {
                address,
                chain_id,
                connector,
            } if self.config.connect => {
                let mut properties = Properties::new();
                properties.insert("address".to_string(), Value::String(address));
                if let Some(chain_id) = chain_id {
                    properties.insert("chain-id".to_string(), Value::from(chain_id));
                }
                if let Some(connector) = connector {
                    properties.insert("connector".to_string(), Value::String(connector));
                }
                self.client
                    .send_event(EventKind::Connect, "connect".to_string(), properties);
            }
            WalletTransition::Disconnected { address } if self.config.disconnect => {
                let mut properties = Properties::new();
                properties.insert("address".to_string(), Value::String(address));
                self.client
                    .send_event(EventKind::Disconnect, "disconnect".to_string(), properties);
            }
            WalletTransition::ChainChanged { chain_id, previous } if self.config.chain => {
                let mut properties = Properties::new();
                properties.insert("chain-id".to_string(), Value::from(chain_id));
                if let Some(previous) = previous {
                    properties.insert("previous-chain-id".to_string(), Value::from(previous));
                }
                self.client.send_event(
                    EventKind::Chain,
                    "chain-changed".to_string(),
                    properties,
                );
            }
            WalletTransition::SignatureCompleted { address, signature }
                if self.config.signature =>
            {
                let mut properties = Properties::new();
                properties.insert("address".to_string(), Value::String(address));
                properties.insert("signature".to_string(), Value::String(signature));
                self.client
                    .send_event(EventKind::Signature, "signature".to_string(), properties);
            }
            WalletTransition::TransactionSubmitted {
                address,
                hash,
                chain_id,
                to,
                value_wei,
            } if self.config.transaction => {
                let mut properties = Properties::new();
                properties.insert("address".to_string(), Value::String(address));
                properties.insert("hash".to_string(), Value::String(hash));
                properties.insert("chain-id".to_string(), Value::from(chain_id));
                properties.insert("to".to_string(), Value::String(to));
                properties.insert("value-wei".to_string(), Value::String(value_wei.to_string()));
                self.client.send_event(
                    EventKind::Transaction,
                    "transaction".to_string(),
                    properties,
                );
            }
            other => {
                tracing::trace!("auto-capture disabled for {} transition", other.category());
            }
        }
    }
}
