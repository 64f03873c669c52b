//! Integration tests for order books: ordering, removal, depth and nonce gating.

use edgestream::book::delta::parse_side;
use edgestream::book::{
    BookDelta, BookSide, BookSnapshot, CountedLevel, CountedOrderBook, IndexedOrderBook,
    OrderBook, OrderDelta, PriceLevel,
};
use edgestream::error::Error;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn lv(price: Decimal, size: Decimal) -> PriceLevel {
    PriceLevel::new(price, size)
}

fn prices<S: BookSide>(side: &S) -> Vec<Decimal> {
    use edgestream::book::Level;
    side.levels().iter().map(Level::price).collect()
}

fn delta(nonce: u64, prev: u64, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> BookDelta<PriceLevel> {
    BookDelta {
        nonce: Some(nonce),
        prev_nonce: Some(prev),
        timestamp: None,
        bids,
        asks,
    }
}

fn synced_book() -> OrderBook {
    let mut book = OrderBook::new("BTC/USDT", None);
    book.sync(
        BookSnapshot::new(
            vec![lv(dec!(100), dec!(1)), lv(dec!(99), dec!(2))],
            vec![lv(dec!(101), dec!(1)), lv(dec!(102), dec!(3))],
        )
        .with_nonce(10)
        .with_timestamp(1_700_000_000_000),
    )
    .unwrap();
    book
}

#[test]
fn sides_stay_sorted_best_first() {
    let mut book = OrderBook::new("BTC/USDT", None);
    for price in [dec!(98), dec!(100), dec!(99)] {
        book.bids_mut().store(price, dec!(1));
        book.asks_mut().store(price + dec!(5), dec!(1));
    }

    assert_eq!(prices(book.bids()), vec![dec!(100), dec!(99), dec!(98)]);
    assert_eq!(prices(book.asks()), vec![dec!(103), dec!(104), dec!(105)]);
    assert_eq!(book.spread(), Some(dec!(3)));
}

#[test]
fn zero_size_removes_level_and_unknown_removal_is_ignored() {
    let mut book = synced_book();
    book.bids_mut().store(dec!(100), dec!(0));
    book.bids_mut().store(dec!(50), dec!(0));

    assert_eq!(prices(book.bids()), vec![dec!(99)]);
    assert_eq!(book.best_bid().map(|l| l.size), Some(dec!(2)));
}

#[test]
fn delta_chain_applies_and_gap_desyncs() {
    let mut book = synced_book();

    let changed = book
        .apply(delta(11, 10, vec![lv(dec!(100), dec!(5))], vec![lv(dec!(101), dec!(0))]))
        .unwrap();
    assert!(changed);
    assert_eq!(book.nonce(), Some(11));
    assert_eq!(book.best_bid().map(|l| l.size), Some(dec!(5)));
    assert_eq!(book.best_ask().map(|l| l.price), Some(dec!(102)));

    // Replays of an already applied nonce are skipped.
    assert!(!book.apply(delta(11, 10, vec![], vec![])).unwrap());

    let err = book.apply(delta(14, 13, vec![], vec![])).unwrap_err();
    assert!(matches!(err, Error::Desync { ref symbol, .. } if symbol == "BTC/USDT"));
    assert_eq!(book.nonce(), Some(11));
}

#[test]
fn deltas_before_snapshot_are_buffered_and_replayed() {
    let mut book = OrderBook::new("ETH/USDT", None);
    assert!(!book.apply(delta(5, 4, vec![lv(dec!(10), dec!(1))], vec![])).unwrap());
    assert!(!book.apply(delta(6, 5, vec![lv(dec!(11), dec!(1))], vec![])).unwrap());
    assert_eq!(book.cache().len(), 2);
    assert!(book.bids().is_empty());

    book.sync(BookSnapshot::new(vec![lv(dec!(9), dec!(1))], vec![]).with_nonce(5))
        .unwrap();

    // The delta up to nonce 5 is already in the snapshot; only 6 replays.
    assert!(book.cache().is_empty());
    assert_eq!(book.nonce(), Some(6));
    assert_eq!(prices(book.bids()), vec![dec!(11), dec!(9)]);
}

#[test]
fn update_ignores_stale_snapshots() {
    let mut book = synced_book();
    let stale = BookSnapshot::new(vec![lv(dec!(1), dec!(1))], vec![]).with_nonce(9);
    assert!(!book.update(stale));
    assert_eq!(book.best_bid().map(|l| l.price), Some(dec!(100)));

    let fresh = BookSnapshot::new(vec![lv(dec!(1), dec!(1))], vec![]).with_nonce(12);
    assert!(book.update(fresh));
    assert_eq!(book.best_bid().map(|l| l.price), Some(dec!(1)));
    assert!(book.asks().is_empty());
}

#[test]
fn limit_truncates_to_depth() {
    let mut book = OrderBook::new("BTC/USDT", Some(2));
    for n in 1..=5u32 {
        book.bids_mut().store(Decimal::from(n), dec!(1));
    }
    assert_eq!(book.bids().len(), 5);
    book.limit();
    assert_eq!(prices(book.bids()), vec![dec!(5), dec!(4)]);
}

#[test]
fn view_reports_pairs_and_datetime() {
    let book = synced_book();
    let view = book.view(Some(1));

    assert_eq!(view.symbol, "BTC/USDT");
    assert_eq!(view.nonce, Some(10));
    assert_eq!(view.bids, vec![[dec!(100), dec!(1)]]);
    assert_eq!(view.asks, vec![[dec!(101), dec!(1)]]);
    assert_eq!(view.datetime.as_deref(), Some("2023-11-14T22:13:20.000Z"));
    assert_eq!(book.mid_price(), Some(dec!(100.5)));
}

#[test]
fn clear_forgets_everything() {
    let mut book = synced_book();
    book.clear();
    assert!(!book.is_synced());
    assert_eq!(book.nonce(), None);
    assert!(book.bids().is_empty() && book.asks().is_empty());
}

#[test]
fn counted_level_with_zero_count_is_removed() {
    let mut book = CountedOrderBook::new("BTC/USDT", None);
    book.bids_mut().store(dec!(100), dec!(2), 3);
    book.bids_mut().store(dec!(99), dec!(1), 1);
    book.bids_mut().store(dec!(100), dec!(2), 0);

    assert_eq!(
        book.bids().levels(),
        &[CountedLevel::new(dec!(99), dec!(1), 1)]
    );
}

#[test]
fn indexed_book_tracks_orders_by_id() {
    let mut book = IndexedOrderBook::new("BTC/USDT", None);
    book.bids_mut().store(Some(dec!(100)), dec!(1), "a");
    book.bids_mut().store(Some(dec!(100)), dec!(2), "b");
    book.bids_mut().store(Some(dec!(101)), dec!(1), "c");

    let ids: Vec<&str> = book
        .bids()
        .levels()
        .iter()
        .map(|l| l.order_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);

    // Size-only update keeps the order's price.
    book.bids_mut().store(None, dec!(7), "a");
    assert_eq!(book.bids().order("a").map(|l| (l.price, l.size)), Some((dec!(100), dec!(7))));

    // Moving an order re-sorts it.
    book.bids_mut().store(Some(dec!(102)), dec!(7), "a");
    assert_eq!(book.best_bid().map(|l| l.order_id.as_str()), Some("a"));

    book.bids_mut().store(None, dec!(0), "a");
    assert!(book.bids().order("a").is_none());
    assert_eq!(book.bids().len(), 2);
}

#[test]
fn indexed_deltas_apply_through_the_book() {
    let mut book = IndexedOrderBook::new("BTC/USDT", Some(1));
    book.sync(BookSnapshot::new(
        vec![
            OrderDelta::new(Some(dec!(10)), dec!(1), "x"),
            OrderDelta::new(Some(dec!(9)), dec!(1), "y"),
        ],
        vec![],
    ))
    .unwrap();
    book.limit();

    assert_eq!(book.bids().len(), 1);
    assert!(book.bids().order("y").is_none());
}

#[test]
fn wire_levels_parse_strings_and_numbers() {
    let raw = json!([["100.5", "1"], [99, 2.5], ["1e2", "0"]]);
    let levels: Vec<PriceLevel> = parse_side(Some(&raw)).unwrap();
    assert_eq!(
        levels,
        vec![
            lv(dec!(100.5), dec!(1)),
            lv(dec!(99), dec!(2.5)),
            lv(dec!(100), dec!(0)),
        ]
    );

    let bad = json!([["abc", "1"]]);
    assert!(matches!(
        parse_side::<PriceLevel>(Some(&bad)),
        Err(Error::Parse(_))
    ));
}
