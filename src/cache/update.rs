use std::ops::Deref;

use super::bounded::BoundedSequence;
use super::progress::ArrivalCounter;
use crate::domain::Symbolic;

/// Bounded cache of symbol-tagged updates with new-arrival accounting.
///
/// Used for trade prints and any other append-only stream. Evictions do not
/// touch the counters: they count arrivals, not current membership.
#[derive(Debug, Clone)]
pub struct UpdateCache<T> {
    items: BoundedSequence<T>,
    progress: ArrivalCounter,
}

impl<T: Symbolic> UpdateCache<T> {
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: BoundedSequence::new(capacity),
            progress: ArrivalCounter::default(),
        }
    }

    pub fn append(&mut self, item: T) {
        self.progress.record(item.symbol());
        self.items.append(item);
    }

    /// Number of new arrivals to report for `symbol` (all symbols when
    /// `None`), capped at `limit`. Arms a lazy reset for that key.
    ///
    /// Call exactly once per watch resolution.
    pub fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        self.progress.get_limit(symbol, limit)
    }

    /// Drop all items and reset every counter.
    pub fn clear(&mut self) {
        self.items.clear();
        self.progress.reset();
    }
}

impl<T> Deref for UpdateCache<T> {
    type Target = BoundedSequence<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}
