//! Integration tests for the bounded caches and their progress accounting.

use edgestream::cache::{BoundedSequence, IdentityCache, SideCache, TimeKeyedCache, UpdateCache};
use edgestream::domain::{OrderStatus, PositionSide, Trade};
use edgestream::testkit::domain::{candle, order, position, trade};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn print(symbol: &str, id: u32) -> Trade {
    trade(symbol, &id.to_string(), dec!(100), dec!(1))
}

fn ids(trades: &[Trade]) -> Vec<String> {
    trades.iter().filter_map(|t| t.id.clone()).collect()
}

#[test]
fn bounded_sequence_never_exceeds_capacity() {
    let mut seq = BoundedSequence::new(Some(3));
    for n in 0..10 {
        seq.append(n);
        assert!(seq.len() <= 3);
    }
    assert_eq!(seq.to_vec(), vec![7, 8, 9]);
    assert_eq!(seq.first(), Some(&7));
    assert_eq!(seq[2], 9);
}

#[test]
fn trades_window_reports_only_new_arrivals() {
    let mut cache = UpdateCache::new(Some(100));
    cache.append(print("BTC/USDT", 1));
    cache.append(print("BTC/USDT", 2));

    let limit = cache.get_limit(Some("BTC/USDT"), None);
    assert_eq!(limit, Some(2));
    let window: Vec<Trade> = cache.tail(limit).cloned().collect();
    assert_eq!(ids(&window), vec!["1", "2"]);

    cache.append(print("BTC/USDT", 3));
    let limit = cache.get_limit(Some("BTC/USDT"), None);
    let window: Vec<Trade> = cache.tail(limit).cloned().collect();
    assert_eq!(ids(&window), vec!["3"]);
}

#[test]
fn arrivals_are_counted_through_eviction() {
    let mut cache = UpdateCache::new(Some(2));
    for n in 0..5 {
        cache.append(print("ETH/USDT", n));
    }
    assert_eq!(cache.len(), 2);
    // Five arrived, two are still held; the caller's slice clamps to what exists.
    assert_eq!(cache.get_limit(Some("ETH/USDT"), None), Some(5));
    assert_eq!(cache.tail(Some(5)).count(), 2);
}

#[test]
fn symbol_and_global_counters_are_independent() {
    let mut cache = UpdateCache::new(None);
    cache.append(print("BTC/USDT", 1));
    cache.append(print("ETH/USDT", 2));

    assert_eq!(cache.get_limit(Some("BTC/USDT"), None), Some(1));
    cache.append(print("BTC/USDT", 3));

    // The global reader has seen nothing yet.
    assert_eq!(cache.get_limit(None, None), Some(3));
    // The BTC reader sees only the print after its last read.
    assert_eq!(cache.get_limit(Some("BTC/USDT"), None), Some(1));
}

#[test]
fn caller_limit_caps_the_window() {
    let mut cache = UpdateCache::new(None);
    for n in 0..10 {
        cache.append(print("BTC/USDT", n));
    }
    assert_eq!(cache.get_limit(Some("BTC/USDT"), Some(4)), Some(4));
    assert_eq!(cache.get_limit(Some("SOL/USDT"), Some(4)), Some(4));
    assert_eq!(cache.get_limit(Some("SOL/USDT"), None), None);
}

#[test]
fn candles_merge_on_timestamp() {
    let mut cache = TimeKeyedCache::new(Some(10));
    cache.append(candle(60_000, dec!(1)));
    cache.append(candle(120_000, dec!(2)));
    cache.append(candle(120_000, dec!(3)));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.last().map(|c| c.close), Some(dec!(3)));
    assert_eq!(cache.get_limit(None, None), Some(2));

    cache.append(candle(120_000, dec!(4)));
    assert_eq!(cache.get_limit(None, None), Some(1));
    assert_eq!(cache.len(), 2);
}

#[test]
fn raw_rows_are_keyed_by_their_first_column() {
    let mut cache: TimeKeyedCache<Value> = TimeKeyedCache::new(Some(2));
    cache.append(json!([100, 1, 1, 1, 1, 1]));
    cache.append(json!([200, 2, 2, 2, 2, 2]));
    cache.append(json!([300, 3, 3, 3, 3, 3]));
    cache.append(json!([300, 4, 4, 4, 4, 4]));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache[0], json!([200, 2, 2, 2, 2, 2]));
    assert_eq!(cache[1], json!([300, 4, 4, 4, 4, 4]));
}

#[test]
fn orders_deduplicate_by_id_and_move_to_tail() {
    let mut cache = IdentityCache::new(Some(10));
    cache.append(order("BTC/USDT", "a", OrderStatus::Open));
    cache.append(order("BTC/USDT", "b", OrderStatus::Open));
    cache.append(order("BTC/USDT", "a", OrderStatus::Closed));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.last().map(|o| o.id.as_str()), Some("a"));
    assert_eq!(
        cache.find("BTC/USDT", "a").map(|o| o.status),
        Some(OrderStatus::Closed)
    );
    // Two distinct orders changed, however many updates they took.
    assert_eq!(cache.get_limit(Some("BTC/USDT"), None), Some(2));
}

#[test]
fn evicted_orders_are_forgotten() {
    let mut cache = IdentityCache::new(Some(2));
    cache.append(order("BTC/USDT", "a", OrderStatus::Open));
    cache.append(order("BTC/USDT", "b", OrderStatus::Open));
    cache.append(order("BTC/USDT", "c", OrderStatus::Open));

    assert!(!cache.contains("BTC/USDT", "a"));
    cache.append(order("BTC/USDT", "a", OrderStatus::Canceled));
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains("BTC/USDT", "b"));
}

#[test]
fn positions_keep_one_entry_per_side() {
    let mut cache = SideCache::unbounded();
    cache.append(position("BTC/USDT", PositionSide::Long, dec!(1)));
    cache.append(position("BTC/USDT", PositionSide::Short, dec!(2)));
    cache.append(position("BTC/USDT", PositionSide::Long, dec!(3)));
    cache.append(position("ETH/USDT", PositionSide::Long, dec!(4)));

    assert_eq!(cache.len(), 3);
    assert_eq!(
        cache.find("BTC/USDT", "long").map(|p| p.contracts),
        Some(dec!(3))
    );
    assert_eq!(cache.get_limit(None, None), Some(3));

    cache.append(position("ETH/USDT", PositionSide::Long, dec!(5)));
    assert_eq!(cache.get_limit(None, None), Some(1));
}

#[test]
fn repeated_read_without_appends_returns_same_count() {
    let mut trades = UpdateCache::new(Some(10));
    trades.append(print("BTC/USDT", 1));
    trades.append(print("BTC/USDT", 2));

    let mut orders = IdentityCache::new(Some(10));
    orders.append(order("BTC/USDT", "a", OrderStatus::Open));
    orders.append(order("BTC/USDT", "b", OrderStatus::Open));

    let mut candles = TimeKeyedCache::new(Some(10));
    candles.append(candle(60_000, dec!(1)));
    candles.append(candle(120_000, dec!(2)));

    let mut positions = SideCache::unbounded();
    positions.append(position("BTC/USDT", PositionSide::Long, dec!(1)));
    positions.append(position("BTC/USDT", PositionSide::Short, dec!(1)));

    let reads = |read: &mut dyn FnMut() -> Option<usize>| [read(), read()];
    assert_eq!(reads(&mut || trades.get_limit(Some("BTC/USDT"), None)), [Some(2); 2]);
    assert_eq!(reads(&mut || orders.get_limit(Some("BTC/USDT"), None)), [Some(2); 2]);
    assert_eq!(reads(&mut || candles.get_limit(Some("BTC/USDT"), None)), [Some(2); 2]);
    assert_eq!(reads(&mut || positions.get_limit(Some("BTC/USDT"), None)), [Some(2); 2]);

    // The armed reset applies on the next append.
    candles.append(candle(180_000, dec!(3)));
    assert_eq!(candles.get_limit(None, None), Some(1));
    trades.append(print("BTC/USDT", 3));
    assert_eq!(trades.get_limit(Some("BTC/USDT"), None), Some(1));
}

#[test]
fn clear_resets_items_and_progress() {
    let mut cache = IdentityCache::new(None);
    cache.append(order("BTC/USDT", "a", OrderStatus::Open));
    cache.clear();

    assert!(cache.is_empty());
    assert!(!cache.contains("BTC/USDT", "a"));
    assert_eq!(cache.get_limit(Some("BTC/USDT"), None), None);
}
