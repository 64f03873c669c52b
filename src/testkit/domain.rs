//! Builders for stream payloads and reference-feed envelopes.

use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::domain::{Ohlcv, Order, OrderStatus, Position, PositionSide, Trade, TradeSide};

pub fn trade(symbol: &str, id: &str, price: Decimal, amount: Decimal) -> Trade {
    Trade {
        id: Some(id.to_string()),
        symbol: symbol.to_string(),
        timestamp: 1_700_000_000_000,
        price,
        amount,
        side: Some(TradeSide::Buy),
    }
}

pub fn order(symbol: &str, id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        symbol: symbol.to_string(),
        status,
        side: TradeSide::Buy,
        price: Some(Decimal::ONE),
        amount: Decimal::ONE,
        filled: Decimal::ZERO,
        timestamp: Some(1_700_000_000_000),
    }
}

pub fn candle(timestamp: i64, close: Decimal) -> Ohlcv {
    Ohlcv {
        timestamp,
        open: close,
        high: close,
        low: close,
        close,
        volume: Decimal::ONE,
    }
}

pub fn position(symbol: &str, side: PositionSide, contracts: Decimal) -> Position {
    Position {
        symbol: symbol.to_string(),
        side,
        contracts,
        entry_price: None,
        unrealized_pnl: None,
        timestamp: None,
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `trades` envelope carrying `trades`.
pub fn trades_message(symbol: &str, trades: &[Trade]) -> Value {
    json!({"channel": "trades", "symbol": symbol, "data": trades})
}

/// `ohlcv` envelope carrying `candles`.
pub fn ohlcv_message(symbol: &str, timeframe: &str, candles: &[Ohlcv]) -> Value {
    json!({"channel": "ohlcv", "symbol": symbol, "timeframe": timeframe, "data": candles})
}

/// `orders` envelope carrying `orders`.
pub fn orders_message(orders: &[Order]) -> Value {
    json!({"channel": "orders", "data": orders})
}

/// `positions` envelope carrying `positions`.
pub fn positions_message(positions: &[Position]) -> Value {
    json!({"channel": "positions", "data": positions})
}

/// Book snapshot with `[price, size]` string levels.
pub fn book_snapshot(symbol: &str, nonce: u64, bids: &[(&str, &str)], asks: &[(&str, &str)]) -> Value {
    json!({
        "channel": "book",
        "type": "snapshot",
        "symbol": symbol,
        "nonce": nonce,
        "timestamp": 1_700_000_000_000_i64,
        "bids": levels(bids),
        "asks": levels(asks),
    })
}

/// Book delta chained to `prev_nonce`.
pub fn book_delta(
    symbol: &str,
    nonce: u64,
    prev_nonce: u64,
    bids: &[(&str, &str)],
    asks: &[(&str, &str)],
) -> Value {
    json!({
        "channel": "book",
        "type": "delta",
        "symbol": symbol,
        "nonce": nonce,
        "prev_nonce": prev_nonce,
        "bids": levels(bids),
        "asks": levels(asks),
    })
}

fn levels(levels: &[(&str, &str)]) -> Value {
    levels
        .iter()
        .map(|(price, size)| json!([price, size]))
        .collect()
}
