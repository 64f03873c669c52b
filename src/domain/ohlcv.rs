//! Candles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{Merge, TimeKeyed};

/// One OHLCV bar. On the wire it is the tuple `[t, o, h, l, c, v]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OhlcvRow", into = "OhlcvRow")]
pub struct Ohlcv {
    /// Open time in milliseconds since the epoch.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Serialize, Deserialize)]
struct OhlcvRow(i64, Decimal, Decimal, Decimal, Decimal, Decimal);

impl From<OhlcvRow> for Ohlcv {
    fn from(row: OhlcvRow) -> Self {
        let OhlcvRow(timestamp, open, high, low, close, volume) = row;
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<Ohlcv> for OhlcvRow {
    fn from(bar: Ohlcv) -> Self {
        Self(bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume)
    }
}

impl TimeKeyed for Ohlcv {
    fn time_key(&self) -> i64 {
        self.timestamp
    }
}

impl Merge for Ohlcv {
    fn merge(&mut self, update: Self) {
        *self = update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tuple_wire_format() {
        let bar: Ohlcv = serde_json::from_str(r#"[60000, "1.5", 2, 1, "1.75", 12]"#).unwrap();
        assert_eq!(bar.timestamp, 60_000);
        assert_eq!(bar.open, dec!(1.5));
        assert_eq!(bar.close, dec!(1.75));
        assert_eq!(bar.time_key(), 60_000);
    }
}
