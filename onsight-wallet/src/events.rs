use crate::state::WalletSnapshot;

/// A raw notification published by a wallet source.
///
/// Snapshots may repeat the current state; the [`TransitionWatcher`] is
/// responsible for suppressing duplicates. Mutation results (`Signature*`,
/// `Transaction*`) are only published for operations that succeeded.
///
/// [`TransitionWatcher`]: crate::watcher::TransitionWatcher
#[derive(Debug, Clone)]
pub enum WalletUpdate {
    Snapshot(WalletSnapshot),
    SignatureCompleted {
        address: String,
        signature: String,
    },
    TransactionSubmitted {
        address: String,
        hash: String,
        chain_id: u64,
        to: String,
        value_wei: u128,
    },
}

/// A committed wallet-state transition.
///
/// Exactly one transition is delivered to every subscriber per state change,
/// in the order the changes occurred.
#[derive(Debug, Clone)]
pub enum WalletTransition {
    Connected {
        address: String,
        chain_id: Option<u64>,
        connector: Option<String>,
    },
    Disconnected {
        address: String,
    },
    ChainChanged {
        chain_id: u64,
        previous: Option<u64>,
    },
    SignatureCompleted {
        address: String,
        signature: String,
    },
    TransactionSubmitted {
        address: String,
        hash: String,
        chain_id: u64,
        to: String,
        value_wei: u128,
    },
}

impl WalletTransition {
    /// The auto-capture category this transition belongs to.
    pub fn category(&self) -> &'static str {
        match self {
            WalletTransition::Connected { .. } => "connect",
            WalletTransition::Disconnected { .. } => "disconnect",
            WalletTransition::ChainChanged { .. } => "chain",
            WalletTransition::SignatureCompleted { .. } => "signature",
            WalletTransition::TransactionSubmitted { .. } => "transaction",
        }
    }
}
