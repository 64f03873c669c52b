//! "How many updates are new" bookkeeping shared by the symbol-aware caches.
//!
//! A read arms a clear flag instead of resetting the counter on the spot; the
//! reset happens on the next append for that key, before it is counted. A
//! read between two appends therefore never causes the following append to be
//! undercounted. The per-symbol and global counters are armed and cleared
//! independently, so a consumer watching one symbol and another watching all
//! symbols do not disturb each other.

use std::collections::{HashMap, HashSet};

/// `min(value, limit)`, passing the caller's limit through when nothing has
/// been recorded for the requested key yet.
pub(crate) fn clamp(value: Option<usize>, limit: Option<usize>) -> Option<usize> {
    match (value, limit) {
        (None, limit) => limit,
        (Some(value), Some(limit)) => Some(value.min(limit)),
        (Some(value), None) => Some(value),
    }
}

/// Raw arrival counts per symbol and overall.
#[derive(Debug, Default, Clone)]
pub(crate) struct ArrivalCounter {
    by_symbol: HashMap<String, usize>,
    clear_symbols: HashSet<String>,
    total: usize,
    clear_total: bool,
}

impl ArrivalCounter {
    pub(crate) fn record(&mut self, symbol: &str) {
        if self.clear_total {
            self.clear_total = false;
            self.total = 0;
        }
        let count = self.by_symbol.entry(symbol.to_owned()).or_default();
        if self.clear_symbols.remove(symbol) {
            *count = 0;
        }
        *count += 1;
        self.total += 1;
    }

    pub(crate) fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        let value = match symbol {
            None => {
                self.clear_total = true;
                Some(self.total)
            }
            Some(symbol) => {
                self.clear_symbols.insert(symbol.to_owned());
                self.by_symbol.get(symbol).copied()
            }
        };
        clamp(value, limit)
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Distinct keys (order ids, position sides) touched per symbol and overall.
///
/// The global set holds `(symbol, key)` pairs, so equal keys under different
/// symbols are counted separately.
#[derive(Debug, Default, Clone)]
pub(crate) struct TouchedKeys {
    by_symbol: HashMap<String, HashSet<String>>,
    clear_symbols: HashSet<String>,
    all: HashSet<(String, String)>,
    clear_all: bool,
}

impl TouchedKeys {
    pub(crate) fn record(&mut self, symbol: &str, key: &str) {
        if self.clear_all {
            self.clear_all = false;
            self.all.clear();
        }
        let keys = self.by_symbol.entry(symbol.to_owned()).or_default();
        if self.clear_symbols.remove(symbol) {
            keys.clear();
        }
        if !keys.contains(key) {
            keys.insert(key.to_owned());
        }
        self.all.insert((symbol.to_owned(), key.to_owned()));
    }

    pub(crate) fn get_limit(&mut self, symbol: Option<&str>, limit: Option<usize>) -> Option<usize> {
        let value = match symbol {
            None => {
                self.clear_all = true;
                Some(self.all.len())
            }
            Some(symbol) => {
                self.clear_symbols.insert(symbol.to_owned());
                self.by_symbol.get(symbol).map(HashSet::len)
            }
        };
        clamp(value, limit)
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
