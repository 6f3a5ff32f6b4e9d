//! A library for observing wallet-connection state from Rust applications.
//!
//! This crate mirrors the reactive surface of a wallet-connection library
//! (current address, chain id, connector) and turns raw state updates into a
//! deduplicated stream of committed transitions. It never controls the
//! wallet; it only watches it.
//!
//! # Key Components
//!
//! *   [`watcher::TransitionWatcher`]: the background worker that diffs
//!     incoming snapshots and notifies subscribers exactly once per
//!     committed transition, in order.
//! *   [`watcher::WatcherHandle`]: a clonable handle used to publish wallet
//!     updates and create subscriptions.
//! *   [`sim::SimWallet`]: a simulated wallet driver used by demos and
//!     integration tests in place of a real wallet SDK.
/// Raw wallet updates and the committed transitions derived from them.
pub mod events;
/// A simulated wallet driver for demos and tests.
pub mod sim;
/// The reactive wallet state mirror.
pub mod state;
/// The transition-detection worker and its subscription interface.
pub mod watcher;
