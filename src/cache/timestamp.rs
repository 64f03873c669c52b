use std::collections::HashSet;
use std::ops::Deref;

use super::bounded::BoundedSequence;
use super::progress::clamp;
use crate::domain::{Merge, TimeKeyed};

/// Bounded cache of time-keyed rows (candles), one row per key.
///
/// A row whose key is already cached is merged in place and keeps its
/// position, so a candle that is still forming updates without reordering.
#[derive(Debug, Clone)]
pub struct TimeKeyedCache<T> {
    items: BoundedSequence<T>,
    keys: HashSet<i64>,
    touched: HashSet<i64>,
    clear_touched: bool,
}

impl<T: TimeKeyed + Merge> TimeKeyedCache<T> {
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: BoundedSequence::new(capacity),
            keys: HashSet::new(),
            touched: HashSet::new(),
            clear_touched: false,
        }
    }

    pub fn append(&mut self, item: T) {
        let key = item.time_key();

        let existing = if self.keys.contains(&key) {
            self.items.iter_mut().rev().find(|x| x.time_key() == key)
        } else {
            None
        };
        match existing {
            Some(stored) => stored.merge(item),
            None => {
                if let Some(evicted) = self.items.append(item) {
                    self.keys.remove(&evicted.time_key());
                }
                self.keys.insert(key);
            }
        }

        if self.clear_touched {
            self.touched.clear();
            self.clear_touched = false;
        }
        self.touched.insert(key);
    }

    /// Distinct keys touched since the last call, capped at `limit`.
    ///
    /// Like the update caches, a read only arms the reset; reading again
    /// before the next append returns the same count. The cache holds a single
    /// series, so `_symbol` is accepted for a uniform watch signature and
    /// ignored.
    pub fn get_limit(&mut self, _symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        let value = (!self.touched.is_empty()).then_some(self.touched.len());
        self.clear_touched = true;
        clamp(value, limit)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
        self.touched.clear();
        self.clear_touched = false;
    }
}

impl<T> Deref for TimeKeyedCache<T> {
    type Target = BoundedSequence<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_repeated_key_merges_in_place() {
        let mut cache = TimeKeyedCache::new(Some(10));
        cache.append(json!([100, 1, 2, 3]));
        cache.append(json!([200, 5, 6, 7]));
        cache.append(json!([200, 10, 11, 12]));

        assert_eq!(
            cache.to_vec(),
            vec![json!([100, 1, 2, 3]), json!([200, 10, 11, 12])]
        );
        assert_eq!(cache.get_limit(None, None), Some(2));
    }

    #[test]
    fn test_merge_does_not_move_row() {
        let mut cache = TimeKeyedCache::new(None);
        cache.append(json!([100, 1]));
        cache.append(json!([200, 2]));
        cache.append(json!([100, 3]));
        let keys: Vec<_> = cache.iter().map(TimeKeyed::time_key).collect();
        assert_eq!(keys, vec![100, 200]);
        assert_eq!(cache[0], json!([100, 3]));
    }

    #[test]
    fn test_eviction_forgets_key() {
        let mut cache = TimeKeyedCache::new(Some(2));
        for t in [100, 200, 300] {
            cache.append(json!([t, 0]));
        }
        cache.append(json!([100, 9]));
        let keys: Vec<_> = cache.iter().map(TimeKeyed::time_key).collect();
        assert_eq!(keys, vec![300, 100]);
    }

    #[test]
    fn test_get_limit_counts_keys_since_read() {
        let mut cache: TimeKeyedCache<Value> = TimeKeyedCache::new(None);
        assert_eq!(cache.get_limit(Some("ignored"), Some(5)), Some(5));

        cache.append(json!([100, 1]));
        cache.append(json!([100, 2]));
        assert_eq!(cache.get_limit(None, None), Some(1));
        assert_eq!(cache.get_limit(None, None), Some(1));

        cache.append(json!([100, 3]));
        cache.append(json!([200, 1]));
        cache.append(json!([300, 1]));
        assert_eq!(cache.get_limit(None, Some(2)), Some(2));
    }
}
