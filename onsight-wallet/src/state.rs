#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point-in-time mirror of the wallet library's reactive state.
///
/// `None` for `address` means no wallet is connected. The `connector` is the
/// human-readable name of the wallet provider that produced the connection
/// (e.g. "MetaMask", "WalletConnect").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct WalletSnapshot {
    pub address: Option<String>,
    pub chain_id: Option<u64>,
    pub connector: Option<String>,
}

impl WalletSnapshot {
    /// A snapshot representing an active connection.
    pub fn connected(
        address: impl Into<String>,
        chain_id: u64,
        connector: impl Into<String>,
    ) -> Self {
        Self {
            address: Some(address.into()),
            chain_id: Some(chain_id),
            connector: Some(connector.into()),
        }
    }

    /// A snapshot representing the disconnected state.
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}
