//! Private order updates.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{Identified, Merge, Symbolic};
use super::trade::TradeSide;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// True once the order can no longer trade.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// Latest known state of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub status: OrderStatus,
    pub side: TradeSide,
    /// Limit price; absent for market orders and on some partial updates.
    #[serde(default)]
    pub price: Option<Decimal>,
    pub amount: Decimal,
    #[serde(default)]
    pub filled: Decimal,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Order {
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.amount - self.filled).max(Decimal::ZERO)
    }
}

impl Symbolic for Order {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Identified for Order {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }
}

impl Merge for Order {
    /// Venues often omit the price and timestamp on fill updates; keep the
    /// previously seen values in that case.
    fn merge(&mut self, update: Self) {
        let price = update.price.or(self.price);
        let timestamp = update.timestamp.or(self.timestamp);
        *self = Self {
            price,
            timestamp,
            ..update
        };
    }
}
