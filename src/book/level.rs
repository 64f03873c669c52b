use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the book a ladder holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy interest, best (highest) price first.
    Bid,
    /// Sell interest, best (lowest) price first.
    Ask,
}

impl Side {
    /// Order two prices so that the better one for this side comes first.
    #[must_use]
    pub fn compare(self, a: Decimal, b: Decimal) -> Ordering {
        match self {
            Self::Bid => b.cmp(&a),
            Self::Ask => a.cmp(&b),
        }
    }
}

/// One resting level as held by a book side.
pub trait Level {
    fn price(&self) -> Decimal;
    fn size(&self) -> Decimal;

    /// Whether storing this level deletes the price instead of setting it.
    fn is_removal(&self) -> bool {
        self.size().is_zero()
    }
}

/// Aggregated size at a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

impl Level for PriceLevel {
    fn price(&self) -> Decimal {
        self.price
    }

    fn size(&self) -> Decimal {
        self.size
    }
}

/// Aggregated size at a price plus the number of orders behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedLevel {
    pub price: Decimal,
    pub size: Decimal,
    pub count: u64,
}

impl CountedLevel {
    #[must_use]
    pub const fn new(price: Decimal, size: Decimal, count: u64) -> Self {
        Self { price, size, count }
    }
}

impl Level for CountedLevel {
    fn price(&self) -> Decimal {
        self.price
    }

    fn size(&self) -> Decimal {
        self.size
    }

    fn is_removal(&self) -> bool {
        self.size.is_zero() || self.count == 0
    }
}

/// A single resting order in an order-by-order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLevel {
    pub price: Decimal,
    pub size: Decimal,
    pub order_id: String,
}

impl Level for OrderLevel {
    fn price(&self) -> Decimal {
        self.price
    }

    fn size(&self) -> Decimal {
        self.size
    }
}

/// Update for one order. A missing price means "unchanged".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDelta {
    pub price: Option<Decimal>,
    pub size: Decimal,
    pub order_id: String,
}

impl OrderDelta {
    #[must_use]
    pub fn new(price: Option<Decimal>, size: Decimal, order_id: impl Into<String>) -> Self {
        Self {
            price,
            size,
            order_id: order_id.into(),
        }
    }
}
