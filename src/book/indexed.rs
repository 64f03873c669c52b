use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;

use super::ladder::BookSide;
use super::level::{OrderDelta, OrderLevel, Side};

/// Order-by-order book side.
///
/// Several orders may rest at one price; they keep arrival order within the
/// price. An `order_id -> price` index finds an order without scanning.
#[derive(Debug, Clone)]
pub struct IndexedLadder {
    side: Side,
    depth: Option<usize>,
    levels: Vec<OrderLevel>,
    prices: HashMap<String, Decimal>,
}

impl IndexedLadder {
    #[must_use]
    pub fn with_depth(side: Side, depth: Option<usize>) -> Self {
        Self {
            side,
            depth,
            levels: Vec::new(),
            prices: HashMap::new(),
        }
    }

    /// Upsert or remove one order.
    ///
    /// A zero size removes the order if known. Without a price the order's
    /// previous price is kept; an unknown order without a price is ignored.
    pub fn store(&mut self, price: Option<Decimal>, size: Decimal, order_id: &str) {
        let previous = self.prices.get(order_id).copied();

        if size.is_zero() {
            if let Some(old) = previous {
                self.remove_at(old, order_id);
                self.prices.remove(order_id);
            }
            return;
        }

        let Some(price) = price.or(previous) else {
            return;
        };

        if previous == Some(price) {
            if let Some(pos) = self.find(price, order_id) {
                self.levels[pos].size = size;
                return;
            }
        }
        if let Some(old) = previous {
            self.remove_at(old, order_id);
        }

        let side = self.side;
        let pos = self
            .levels
            .partition_point(|l| side.compare(l.price, price) != Ordering::Greater);
        self.levels.insert(
            pos,
            OrderLevel {
                price,
                size,
                order_id: order_id.to_owned(),
            },
        );
        self.prices.insert(order_id.to_owned(), price);
    }

    /// Resting order by id.
    #[must_use]
    pub fn order(&self, order_id: &str) -> Option<&OrderLevel> {
        let price = *self.prices.get(order_id)?;
        self.find(price, order_id).map(|pos| &self.levels[pos])
    }

    fn find(&self, price: Decimal, order_id: &str) -> Option<usize> {
        let side = self.side;
        let start = self
            .levels
            .partition_point(|l| side.compare(l.price, price) == Ordering::Less);
        self.levels[start..]
            .iter()
            .take_while(|l| l.price == price)
            .position(|l| l.order_id == order_id)
            .map(|offset| start + offset)
    }

    fn remove_at(&mut self, price: Decimal, order_id: &str) {
        if let Some(pos) = self.find(price, order_id) {
            self.levels.remove(pos);
        }
    }
}

impl BookSide for IndexedLadder {
    type Delta = OrderDelta;
    type Level = OrderLevel;

    fn new(side: Side, depth: Option<usize>) -> Self {
        Self::with_depth(side, depth)
    }

    fn side(&self) -> Side {
        self.side
    }

    fn store_delta(&mut self, delta: OrderDelta) {
        self.store(delta.price, delta.size, &delta.order_id);
    }

    fn levels(&self) -> &[OrderLevel] {
        &self.levels
    }

    fn limit(&mut self) {
        let Some(depth) = self.depth else {
            return;
        };
        if self.levels.len() <= depth {
            return;
        }
        for dropped in self.levels.drain(depth..) {
            self.prices.remove(&dropped.order_id);
        }
    }

    fn clear(&mut self) {
        self.levels.clear();
        self.prices.clear();
    }
}
