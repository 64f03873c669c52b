//! Wire format of the reference feed.
//!
//! Every inbound message is an object tagged by `"channel"`:
//!
//! ```json
//! {"channel": "trades", "symbol": "BTC/USDT", "data": [...]}
//! {"channel": "ohlcv", "symbol": "BTC/USDT", "timeframe": "1m", "data": [[t, o, h, l, c, v]]}
//! {"channel": "orders", "data": [...]}
//! {"channel": "positions", "data": [...]}
//! {"channel": "book", "type": "snapshot", "symbol": "BTC/USDT", "nonce": 7, "bids": [...], "asks": [...]}
//! {"channel": "book", "type": "delta", "symbol": "BTC/USDT", "nonce": 8, "prev_nonce": 7, "bids": [...], "asks": [...]}
//! {"channel": "pong"}
//! {"channel": "error", "hash": "trades:BTC/USDT", "message": "unknown symbol"}
//! ```
//!
//! Outbound messages are `{"op": "subscribe", ...}` and `{"op": "ping"}`.

use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Trades,
    Ohlcv,
    Orders,
    Positions,
    Book,
    Pong,
    Error,
}

impl Channel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Ohlcv => "ohlcv",
            Self::Orders => "orders",
            Self::Positions => "positions",
            Self::Book => "book",
            Self::Pong => "pong",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookMessageKind {
    Snapshot,
    Delta,
}

/// One inbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub channel: Channel,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<BookMessageKind>,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub prev_nonce: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub bids: Option<Value>,
    #[serde(default)]
    pub asks: Option<Value>,
    /// Hash an `error` message refers to.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn trades_hash(symbol: &str) -> String {
    format!("trades:{symbol}")
}

pub fn ohlcv_hash(symbol: &str, timeframe: &str) -> String {
    format!("ohlcv:{symbol}:{timeframe}")
}

/// `orders` for every symbol, `orders:<symbol>` for one.
pub fn orders_hash(symbol: Option<&str>) -> String {
    scoped("orders", symbol)
}

/// `positions` for every symbol, `positions:<symbol>` for one.
pub fn positions_hash(symbol: Option<&str>) -> String {
    scoped("positions", symbol)
}

pub fn book_hash(symbol: &str) -> String {
    format!("book:{symbol}")
}

fn scoped(channel: &str, symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) => format!("{channel}:{symbol}"),
        None => channel.to_string(),
    }
}

/// Subscription request for `channel`, optionally scoped to a symbol and
/// timeframe.
#[must_use]
pub fn subscribe_message(channel: Channel, symbol: Option<&str>, timeframe: Option<&str>) -> Value {
    let mut message = json!({"op": "subscribe", "channel": channel.as_str()});
    if let Some(symbol) = symbol {
        message["symbol"] = json!(symbol);
    }
    if let Some(timeframe) = timeframe {
        message["timeframe"] = json!(timeframe);
    }
    message
}

#[must_use]
pub fn ping_message() -> Value {
    json!({"op": "ping"})
}
