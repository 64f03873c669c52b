//! Reference feed: a small JSON envelope protocol wired to the caches and
//! books.
//!
//! It stands in for a venue adapter. [`FeedHandler`] decides which cache a
//! message lands in and which watch it answers; [`Feed`] is the caller-facing
//! watch API.

pub mod envelope;
mod handler;
mod watch;

pub use handler::FeedHandler;
pub use watch::Feed;
