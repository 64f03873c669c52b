//! Edgestream - bounded market-data caches and WebSocket session plumbing for
//! streaming exchange feeds.
//!
//! The crate keeps what a real-time feed delivers in memory that never grows
//! past a configured size, and matches asynchronous "watch" requests to the
//! frames that answer them.
//!
//! # Modules
//!
//! - [`cache`] - Bounded sequences plus update, time-keyed, identity and side
//!   caches with per-key progress accounting
//! - [`book`] - Price-level order books (plain, counted and per-order) with
//!   nonce-gated snapshot/delta synchronization
//! - [`session`] - Pending requests, the connection session with keepalive and
//!   backoff, and a hub sharing sessions per URL
//! - [`feed`] - Reference feed: wire format, message handler and `watch_*` API
//! - [`config`] - TOML configuration with environment overrides
//! - [`domain`] - Stream payloads (trades, candles, orders, positions)
//! - [`error`] - Error types for the crate
//! - [`cli`] - The `edgestream` binary's commands
//!
//! # Example
//!
//! ```
//! use edgestream::cache::UpdateCache;
//! use edgestream::domain::Trade;
//!
//! let trades: UpdateCache<Trade> = UpdateCache::new(Some(1000));
//! assert!(trades.is_empty());
//! ```

pub mod book;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod session;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
