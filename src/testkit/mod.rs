//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`]: Mock [`Transport`](crate::session::Transport)
//!   implementations: `ScriptedTransport`, `ChannelTransport`, `ChannelFactory`.
//! - [`domain`]: Builders for trades, orders, candles, positions and feed
//!   envelopes.
//! - [`config`]: Canonical test configurations (session, reconnection).

pub mod config;
pub mod domain;
pub mod transport;
