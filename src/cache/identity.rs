use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use super::bounded::BoundedSequence;
use super::progress::TouchedKeys;
use crate::domain::{Identified, Merge, Sided, Symbolic};

/// Picks the per-symbol identity a [`KeyedCache`] deduplicates on.
pub trait KeyOf<T> {
    fn key(item: &T) -> Cow<'_, str>;
}

/// Deduplicate on `(symbol, id)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ById;

/// Deduplicate on `(symbol, side)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BySide;

impl<T: Identified> KeyOf<T> for ById {
    fn key(item: &T) -> Cow<'_, str> {
        item.id()
    }
}

impl<T: Sided> KeyOf<T> for BySide {
    fn key(item: &T) -> Cow<'_, str> {
        Cow::Borrowed(item.side())
    }
}

/// Orders (and anything else with an id) ordered by most recent update.
pub type IdentityCache<T> = KeyedCache<T, ById>;

/// Positions, one entry per symbol and side.
pub type SideCache<T> = KeyedCache<T, BySide>;

/// Bounded cache holding one entry per `(symbol, key)`.
///
/// An update for a pair already present is merged into the stored item, which
/// then moves to the tail; the length does not change. New pairs are appended,
/// evicting the least recently updated entry on overflow.
///
/// Progress counts distinct keys touched since the last read, so an order
/// updated five times between two reads is one new update.
pub struct KeyedCache<T, K> {
    items: BoundedSequence<T>,
    index: HashMap<String, HashSet<String>>,
    progress: TouchedKeys,
    key: PhantomData<K>,
}

impl<T, K> KeyedCache<T, K>
where
    T: Symbolic + Merge,
    K: KeyOf<T>,
{
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: BoundedSequence::new(capacity),
            index: HashMap::new(),
            progress: TouchedKeys::default(),
            key: PhantomData,
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn append(&mut self, mut item: T) {
        let symbol = item.symbol().to_owned();
        let key = K::key(&item).into_owned();

        if self.contains(&symbol, &key) {
            let stored = self
                .items
                .position(|x| x.symbol() == symbol && K::key(x) == key.as_str())
                .and_then(|pos| self.items.remove(pos));
            if let Some(mut stored) = stored {
                stored.merge(item);
                item = stored;
            }
        } else {
            self.index
                .entry(symbol.clone())
                .or_default()
                .insert(key.clone());
        }

        if let Some(evicted) = self.items.append(item) {
            self.forget(&evicted);
        }
        self.progress.record(&symbol, &key);
    }

    /// See [`UpdateCache::get_limit`](super::UpdateCache::get_limit).
    pub fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        self.progress.get_limit(symbol, limit)
    }

    #[must_use]
    pub fn contains(&self, symbol: &str, key: &str) -> bool {
        self.index
            .get(symbol)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Stored entry for `(symbol, key)`.
    #[must_use]
    pub fn find(&self, symbol: &str, key: &str) -> Option<&T> {
        if !self.contains(symbol, key) {
            return None;
        }
        self.items
            .iter()
            .rev()
            .find(|x| x.symbol() == symbol && K::key(x) == key)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
        self.progress.reset();
    }

    fn forget(&mut self, evicted: &T) {
        let symbol = evicted.symbol();
        if let Some(keys) = self.index.get_mut(symbol) {
            keys.remove(K::key(evicted).as_ref());
            if keys.is_empty() {
                self.index.remove(symbol);
            }
        }
    }
}

impl<T, K> Deref for KeyedCache<T, K> {
    type Target = BoundedSequence<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T: fmt::Debug, K> fmt::Debug for KeyedCache<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("items", &self.items)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn order(symbol: &str, id: &str, status: &str) -> Value {
        json!({"symbol": symbol, "id": id, "status": status})
    }

    fn ids(cache: &IdentityCache<Value>) -> Vec<String> {
        cache.iter().map(|o| o.id().into_owned()).collect()
    }

    #[test]
    fn test_capacity_one_keeps_latest_id() {
        let mut cache = IdentityCache::new(Some(1));
        for i in 1..=10 {
            cache.append(order("BTC/USDT", &i.to_string(), "open"));
        }
        assert_eq!(ids(&cache), vec!["10"]);
        assert!(!cache.contains("BTC/USDT", "9"));
    }

    #[test]
    fn test_update_merges_and_moves_to_tail() {
        let mut cache = IdentityCache::new(Some(5));
        cache.append(order("BTC/USDT", "a", "open"));
        cache.append(order("BTC/USDT", "b", "open"));
        cache.append(json!({"symbol": "BTC/USDT", "id": "a", "filled": 1}));

        assert_eq!(cache.len(), 2);
        assert_eq!(ids(&cache), vec!["b", "a"]);
        let a = cache.last().unwrap();
        assert_eq!(a["status"], "open");
        assert_eq!(a["filled"], 1);
    }

    #[test]
    fn test_overflow_evicts_least_recently_updated() {
        let mut cache = IdentityCache::new(Some(2));
        cache.append(order("BTC/USDT", "a", "open"));
        cache.append(order("BTC/USDT", "b", "open"));
        cache.append(order("BTC/USDT", "a", "closed"));
        cache.append(order("BTC/USDT", "c", "open"));

        assert_eq!(ids(&cache), vec!["a", "c"]);
        assert!(cache.find("BTC/USDT", "b").is_none());
        assert_eq!(cache.find("BTC/USDT", "a").unwrap()["status"], "closed");
    }

    #[test]
    fn test_same_id_under_two_symbols_is_two_entries() {
        let mut cache = IdentityCache::new(None);
        cache.append(order("BTC/USDT", "1", "open"));
        cache.append(order("ETH/USDT", "1", "open"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_limit(None, None), Some(2));
    }

    #[test]
    fn test_duplicate_update_counts_once() {
        let mut cache = IdentityCache::new(None);
        cache.append(order("BTC/USDT", "1", "open"));
        cache.append(order("BTC/USDT", "1", "closed"));
        cache.append(order("ETH/USDT", "2", "open"));

        assert_eq!(cache.get_limit(Some("BTC/USDT"), None), Some(1));
        assert_eq!(cache.get_limit(Some("ETH/USDT"), None), Some(1));
        assert_eq!(cache.get_limit(None, None), Some(2));
    }

    #[test]
    fn test_side_cache_one_entry_per_side() {
        let mut cache: SideCache<Value> = SideCache::unbounded();
        cache.append(json!({"symbol": "BTC/USDT", "side": "long", "contracts": 1}));
        cache.append(json!({"symbol": "BTC/USDT", "side": "short", "contracts": 2}));
        cache.append(json!({"symbol": "BTC/USDT", "side": "long", "contracts": 3}));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.last().unwrap()["contracts"], 3);
        assert_eq!(cache.get_limit(Some("BTC/USDT"), None), Some(2));
    }

    #[test]
    fn test_clear() {
        let mut cache = IdentityCache::new(Some(3));
        cache.append(order("BTC/USDT", "1", "open"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains("BTC/USDT", "1"));
        cache.append(order("BTC/USDT", "1", "open"));
        assert_eq!(cache.len(), 1);
    }
}
