//! Attributes the caches deduplicate and account by.
//!
//! Typed payloads implement these directly. `serde_json::Value` implements
//! them too so adapters can cache undecoded exchange objects: objects are
//! keyed by their `"symbol"`, `"id"` and `"side"` fields, arrays by element 0.

use std::borrow::Cow;

use serde_json::Value;

/// Item that belongs to one market.
pub trait Symbolic {
    fn symbol(&self) -> &str;
}

/// Item with an exchange-assigned identity, unique within its symbol.
pub trait Identified {
    fn id(&self) -> Cow<'_, str>;
}

/// Item unique per `(symbol, side)`, e.g. a hedged-mode position.
pub trait Sided {
    fn side(&self) -> &str;
}

/// Item keyed by a leading timestamp, e.g. a candle's open time.
pub trait TimeKeyed {
    fn time_key(&self) -> i64;
}

/// In-place update path used when a cache sees an item it already holds.
pub trait Merge {
    /// Fold `update` into `self`. Afterwards `self` reflects the newest state.
    fn merge(&mut self, update: Self);
}

impl Symbolic for Value {
    fn symbol(&self) -> &str {
        self.get("symbol").and_then(Value::as_str).unwrap_or_default()
    }
}

impl Identified for Value {
    fn id(&self) -> Cow<'_, str> {
        match self.get("id") {
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(Value::Null) | None => Cow::Borrowed(""),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

impl Sided for Value {
    fn side(&self) -> &str {
        self.get("side").and_then(Value::as_str).unwrap_or_default()
    }
}

impl TimeKeyed for Value {
    fn time_key(&self) -> i64 {
        let key = match self {
            Value::Array(items) => items.first(),
            Value::Object(map) => map.get("timestamp"),
            _ => None,
        };
        key.and_then(|k| k.as_i64().or_else(|| k.as_f64().map(|f| f as i64)))
            .unwrap_or_default()
    }
}

impl Merge for Value {
    fn merge(&mut self, update: Self) {
        match (self, update) {
            (Value::Object(current), Value::Object(update)) => {
                for (key, value) in update {
                    current.insert(key, value);
                }
            }
            (current, update) => *current = update,
        }
    }
}
