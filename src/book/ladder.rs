use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::level::{CountedLevel, Level, PriceLevel, Side};

/// One side of a book: levels kept sorted best price first.
pub trait BookSide {
    /// What the exchange sends for this side.
    type Delta;
    /// What the side keeps.
    type Level: Level;

    fn new(side: Side, depth: Option<usize>) -> Self;

    fn side(&self) -> Side;

    /// Apply one update.
    fn store_delta(&mut self, delta: Self::Delta);

    /// Levels, best first.
    fn levels(&self) -> &[Self::Level];

    /// Drop everything beyond the configured depth.
    fn limit(&mut self);

    fn clear(&mut self);

    /// Apply updates in order.
    fn store_all<I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = Self::Delta>,
    {
        for delta in deltas {
            self.store_delta(delta);
        }
    }

    fn best(&self) -> Option<&Self::Level> {
        self.levels().first()
    }

    fn len(&self) -> usize {
        self.levels().len()
    }

    fn is_empty(&self) -> bool {
        self.levels().is_empty()
    }
}

/// Price-aggregated book side, one entry per price.
///
/// Plain ([`PriceLevel`]) and counted ([`CountedLevel`]) books differ only in
/// the level they store; a level with zero size (or zero count) removes the
/// price.
#[derive(Debug, Clone)]
pub struct Ladder<L> {
    side: Side,
    depth: Option<usize>,
    levels: Vec<L>,
}

impl<L: Level> Ladder<L> {
    #[must_use]
    pub const fn with_depth(side: Side, depth: Option<usize>) -> Self {
        Self {
            side,
            depth,
            levels: Vec::new(),
        }
    }

    #[must_use]
    pub const fn depth(&self) -> Option<usize> {
        self.depth
    }

    /// Insert, replace or remove the level at `level.price()`.
    pub fn store_level(&mut self, level: L) {
        let price = level.price();
        let side = self.side;
        let pos = self
            .levels
            .partition_point(|l| side.compare(l.price(), price) == Ordering::Less);
        let exists = self.levels.get(pos).is_some_and(|l| l.price() == price);

        match (exists, level.is_removal()) {
            (true, true) => {
                self.levels.remove(pos);
            }
            (true, false) => self.levels[pos] = level,
            (false, false) => self.levels.insert(pos, level),
            (false, true) => {}
        }
    }

    /// Level resting at exactly `price`.
    #[must_use]
    pub fn get(&self, price: Decimal) -> Option<&L> {
        let side = self.side;
        let pos = self
            .levels
            .partition_point(|l| side.compare(l.price(), price) == Ordering::Less);
        self.levels.get(pos).filter(|l| l.price() == price)
    }
}

impl Ladder<PriceLevel> {
    pub fn store(&mut self, price: Decimal, size: Decimal) {
        self.store_level(PriceLevel::new(price, size));
    }
}

impl Ladder<CountedLevel> {
    pub fn store(&mut self, price: Decimal, size: Decimal, count: u64) {
        self.store_level(CountedLevel::new(price, size, count));
    }
}

impl<L: Level> BookSide for Ladder<L> {
    type Delta = L;
    type Level = L;

    fn new(side: Side, depth: Option<usize>) -> Self {
        Self::with_depth(side, depth)
    }

    fn side(&self) -> Side {
        self.side
    }

    fn store_delta(&mut self, delta: L) {
        self.store_level(delta);
    }

    fn levels(&self) -> &[L] {
        &self.levels
    }

    fn limit(&mut self) {
        if let Some(depth) = self.depth {
            self.levels.truncate(depth);
        }
    }

    fn clear(&mut self) {
        self.levels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices<L: Level>(ladder: &Ladder<L>) -> Vec<Decimal> {
        ladder.levels().iter().map(Level::price).collect()
    }

    #[test]
    fn test_zero_size_on_empty_side_is_noop() {
        let mut asks = Ladder::<PriceLevel>::new(Side::Ask, None);
        asks.store(dec!(101), dec!(0));
        assert!(asks.is_empty());
    }

    #[test]
    fn test_zero_size_removes_existing_level() {
        let mut asks = Ladder::<PriceLevel>::new(Side::Ask, None);
        asks.store(dec!(101), dec!(5));
        assert_eq!(asks.len(), 1);
        asks.store(dec!(101), dec!(0));
        assert!(asks.get(dec!(101)).is_none());
        assert!(asks.is_empty());
    }

    #[test]
    fn test_bids_sorted_descending() {
        let mut bids = Ladder::<PriceLevel>::new(Side::Bid, None);
        for p in [dec!(100), dec!(102), dec!(99), dec!(101)] {
            bids.store(p, dec!(1));
        }
        assert_eq!(prices(&bids), vec![dec!(102), dec!(101), dec!(100), dec!(99)]);
        assert_eq!(bids.best().unwrap().price, dec!(102));
    }

    #[test]
    fn test_asks_sorted_ascending_and_replace_in_place() {
        let mut asks = Ladder::<PriceLevel>::new(Side::Ask, None);
        asks.store_all([
            PriceLevel::new(dec!(101), dec!(1)),
            PriceLevel::new(dec!(100), dec!(2)),
            PriceLevel::new(dec!(101), dec!(7)),
        ]);
        assert_eq!(prices(&asks), vec![dec!(100), dec!(101)]);
        assert_eq!(asks.get(dec!(101)).unwrap().size, dec!(7));
    }

    #[test]
    fn test_equal_prices_with_different_scale_match() {
        let mut asks = Ladder::<PriceLevel>::new(Side::Ask, None);
        asks.store(dec!(101.50), dec!(1));
        asks.store(dec!(101.5), dec!(0));
        assert!(asks.is_empty());
    }

    #[test]
    fn test_limit_truncates_from_best() {
        let mut bids = Ladder::<PriceLevel>::new(Side::Bid, Some(2));
        for p in [dec!(1), dec!(2), dec!(3), dec!(4)] {
            bids.store(p, dec!(1));
        }
        assert_eq!(bids.len(), 4);
        bids.limit();
        assert_eq!(prices(&bids), vec![dec!(4), dec!(3)]);
    }

    #[test]
    fn test_counted_zero_count_removes() {
        let mut bids = Ladder::<CountedLevel>::new(Side::Bid, None);
        bids.store(dec!(50), dec!(3), 2);
        bids.store(dec!(49), dec!(1), 1);
        bids.store(dec!(50), dec!(3), 0);
        assert_eq!(prices(&bids), vec![dec!(49)]);

        bids.store(dec!(49), dec!(4), 3);
        assert_eq!(bids.best().unwrap().count, 3);
    }
}
