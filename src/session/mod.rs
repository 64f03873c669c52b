//! Connection sessions and request correlation.
//!
//! - [`Pending`] - single-assignment completion handle, raceable
//! - [`Session`] - one duplex connection: frame driver, keepalive, routing of
//!   inbound messages to waiting requests by message hash
//! - [`SessionHub`] - sessions by URL and the watch/subscribe protocol
//! - [`Transport`] / [`WsTransport`] - the wire underneath a session
//! - [`Handler`] - venue-specific decoding and routing
//! - [`Backoff`] - reconnect pacing with a circuit breaker

mod backoff;
mod client;
mod frame;
mod handler;
mod hub;
mod pending;
mod transport;
mod websocket;

pub use backoff::Backoff;
pub use client::{Session, SessionEvent, SessionState};
pub use frame::Frame;
pub use handler::{ChannelHandler, Handler};
pub use hub::SessionHub;
pub use pending::{Pending, PendingState};
pub use transport::{SharedTransportFactory, Transport, TransportFactory};
pub use websocket::WsTransport;
