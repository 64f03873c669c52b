//! Public trade prints.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{Identified, Merge, Symbolic, TimeKeyed};

/// Aggressor side of a trade, also reused as the side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade id, when the venue publishes one.
    #[serde(default)]
    pub id: Option<String>,
    pub symbol: String,
    /// Execution time in milliseconds since the epoch.
    pub timestamp: i64,
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub side: Option<TradeSide>,
}

impl Trade {
    /// Notional value (`price * amount`).
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.price * self.amount
    }

    #[must_use]
    pub fn datetime(&self) -> Option<String> {
        super::iso8601(self.timestamp)
    }
}

impl Symbolic for Trade {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Identified for Trade {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.id.as_deref().unwrap_or_default())
    }
}

impl TimeKeyed for Trade {
    fn time_key(&self) -> i64 {
        self.timestamp
    }
}

impl Merge for Trade {
    fn merge(&mut self, update: Self) {
        *self = update;
    }
}
