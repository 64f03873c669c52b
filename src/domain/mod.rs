//! Exchange-agnostic stream payloads and the traits caches key them by.
//!
//! - [`item`] - Cache item contract (`Symbolic`, `Identified`, `Sided`,
//!   `TimeKeyed`, `Merge`), also implemented for raw `serde_json::Value`
//! - [`trade`] - Public trades
//! - [`order`] - Private order updates
//! - [`ohlcv`] - Candles
//! - [`position`] - Derivatives positions

pub mod item;
pub mod ohlcv;
pub mod order;
pub mod position;
pub mod trade;

pub use item::{Identified, Merge, Sided, Symbolic, TimeKeyed};
pub use ohlcv::Ohlcv;
pub use order::{Order, OrderStatus};
pub use position::{Position, PositionSide};
pub use trade::{Trade, TradeSide};

use chrono::{DateTime, SecondsFormat};

/// Format a millisecond UNIX timestamp as ISO-8601 (`2024-01-01T00:00:00.000Z`).
#[must_use]
pub fn iso8601(timestamp_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_millis() {
        assert_eq!(
            iso8601(1_700_000_000_123).as_deref(),
            Some("2023-11-14T22:13:20.123Z")
        );
        assert_eq!(iso8601(0).as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }
}
