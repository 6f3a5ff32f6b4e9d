//! A core Rust library for collecting wallet and product analytics events.
//!
//! This crate provides the building blocks for embedding an analytics
//! collection client into an application. It abstracts away event batching,
//! background delivery with bounded retry, consent handling, and identity
//! attribution behind a small, non-blocking API.
//!
//! # Key Components
//!
//! *   [`client::AnalyticsClient`]: a clonable handle exposing `track`,
//!     `page`, `screen`, `identify`, the consent toggle, and graceful
//!     shutdown. Every call is synchronous and O(1); all I/O happens on a
//!     background worker.
//! *   [`client::AnalyticsBuilder`]: explicit, dependency-injected
//!     construction with an application-managed lifetime.
//! *   [`autocapture`]: binds a client to a wallet transition source so that
//!     connect/disconnect/chain/signature/transaction events are captured
//!     without caller involvement.
//! *   [`middleware`]: an interceptor list the client invokes in order for
//!     every event before it is queued.
/// Auto-capture of wallet-state transitions.
pub mod autocapture;
pub mod client;
/// Defines configuration structures for the collection client.
pub mod config;
mod diagnostics;
/// The event model: kinds, properties, and session context.
pub mod events;
pub mod middleware;
/// The internal batching and delivery worker (`Pipeline`).
mod pipeline;
/// Session identity types.
pub mod session;
/// A trait and default implementation for persistent device identity.
pub mod storage;
/// Pluggable batch sinks: HTTP ingestion and an in-memory recorder.
pub mod transport;
