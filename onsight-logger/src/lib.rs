//! Shared `tracing` bootstrap for Onsight binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is the binary's job, and this crate is where that happens.
pub mod logging;
