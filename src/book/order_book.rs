use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::Serialize;

use super::indexed::IndexedLadder;
use super::ladder::{BookSide, Ladder};
use super::level::{CountedLevel, Level, PriceLevel, Side};
use crate::domain::iso8601;
use crate::error::{Error, Result};

/// Price-aggregated book.
pub type OrderBook = Book<Ladder<PriceLevel>>;
/// Price-aggregated book with per-level order counts.
pub type CountedOrderBook = Book<Ladder<CountedLevel>>;
/// Order-by-order book.
pub type IndexedOrderBook = Book<IndexedLadder>;

/// Deltas held while waiting for a snapshot, unless overridden.
pub const DEFAULT_BUFFER_LIMIT: usize = 1000;

/// Full state of both sides at a point in time.
#[derive(Debug, Clone)]
pub struct BookSnapshot<D> {
    pub nonce: Option<u64>,
    pub timestamp: Option<i64>,
    pub bids: Vec<D>,
    pub asks: Vec<D>,
}

impl<D> BookSnapshot<D> {
    #[must_use]
    pub fn new(bids: Vec<D>, asks: Vec<D>) -> Self {
        Self {
            nonce: None,
            timestamp: None,
            bids,
            asks,
        }
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Incremental change to both sides.
///
/// `prev_nonce`, when the venue sends it, must equal the book's current nonce.
#[derive(Debug, Clone)]
pub struct BookDelta<D> {
    pub nonce: Option<u64>,
    pub prev_nonce: Option<u64>,
    pub timestamp: Option<i64>,
    pub bids: Vec<D>,
    pub asks: Vec<D>,
}

/// Two-sided book for one symbol.
///
/// Deltas that arrive before the first snapshot are kept in [`Book::cache`]
/// and replayed by [`Book::sync`]. The buffer holds at most
/// [`Book::buffer_limit`] deltas; the oldest is dropped to make room.
#[derive(Debug, Clone)]
pub struct Book<S: BookSide> {
    symbol: String,
    nonce: Option<u64>,
    timestamp: Option<i64>,
    synced: bool,
    bids: S,
    asks: S,
    cache: VecDeque<BookDelta<S::Delta>>,
    buffer_limit: usize,
}

impl<S: BookSide> Book<S> {
    #[must_use]
    pub fn new(symbol: impl Into<String>, depth: Option<usize>) -> Self {
        Self {
            symbol: symbol.into(),
            nonce: None,
            timestamp: None,
            synced: false,
            bids: S::new(Side::Bid, depth),
            asks: S::new(Side::Ask, depth),
            cache: VecDeque::new(),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
        }
    }

    /// Cap the pre-snapshot buffer at `limit` deltas (at least one).
    #[must_use]
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit.max(1);
        self
    }

    #[must_use]
    pub const fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub const fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    #[must_use]
    pub fn datetime(&self) -> Option<String> {
        self.timestamp.and_then(iso8601)
    }

    /// Whether a snapshot has been applied since creation or the last clear.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    #[must_use]
    pub const fn bids(&self) -> &S {
        &self.bids
    }

    #[must_use]
    pub const fn asks(&self) -> &S {
        &self.asks
    }

    pub fn bids_mut(&mut self) -> &mut S {
        &mut self.bids
    }

    pub fn asks_mut(&mut self) -> &mut S {
        &mut self.asks
    }

    /// Deltas buffered while waiting for a snapshot.
    #[must_use]
    pub const fn cache(&self) -> &VecDeque<BookDelta<S::Delta>> {
        &self.cache
    }

    /// Replace the whole book with `snapshot`. Buffered deltas are kept.
    pub fn reset(&mut self, snapshot: BookSnapshot<S::Delta>) {
        self.bids.clear();
        self.asks.clear();
        self.bids.store_all(snapshot.bids);
        self.asks.store_all(snapshot.asks);
        self.nonce = snapshot.nonce;
        self.timestamp = snapshot.timestamp;
        self.synced = true;
    }

    /// Apply `snapshot` unless it is not newer than the current state.
    ///
    /// Returns whether the snapshot was applied.
    pub fn update(&mut self, snapshot: BookSnapshot<S::Delta>) -> bool {
        if let (Some(current), Some(incoming)) = (self.nonce, snapshot.nonce) {
            if incoming <= current {
                return false;
            }
        }
        self.reset(snapshot);
        true
    }

    /// Reset to `snapshot`, then replay buffered deltas newer than it.
    pub fn sync(&mut self, snapshot: BookSnapshot<S::Delta>) -> Result<()> {
        self.reset(snapshot);
        let buffered = std::mem::take(&mut self.cache);
        for delta in buffered {
            self.apply(delta)?;
        }
        Ok(())
    }

    /// Apply one delta.
    ///
    /// Before the first snapshot the delta is buffered. A delta whose nonce is
    /// not newer than the book is skipped. Returns whether levels changed.
    ///
    /// # Errors
    ///
    /// [`Error::Desync`] when `prev_nonce` does not match the book's nonce.
    /// The book is left as it was; callers are expected to [`clear`] it and
    /// resubscribe.
    ///
    /// [`clear`]: Book::clear
    pub fn apply(&mut self, delta: BookDelta<S::Delta>) -> Result<bool> {
        if !self.synced {
            if self.cache.len() >= self.buffer_limit {
                self.cache.pop_front();
            }
            self.cache.push_back(delta);
            return Ok(false);
        }
        if let (Some(current), Some(incoming)) = (self.nonce, delta.nonce) {
            if incoming <= current {
                return Ok(false);
            }
        }
        if let (Some(current), Some(prev)) = (self.nonce, delta.prev_nonce) {
            if prev != current {
                return Err(Error::Desync {
                    symbol: self.symbol.clone(),
                    reason: format!("expected prev nonce {current}, got {prev}"),
                });
            }
        }

        self.bids.store_all(delta.bids);
        self.asks.store_all(delta.asks);
        if delta.nonce.is_some() {
            self.nonce = delta.nonce;
        }
        if delta.timestamp.is_some() {
            self.timestamp = delta.timestamp;
        }
        Ok(true)
    }

    /// Truncate both sides to the configured depth.
    pub fn limit(&mut self) {
        self.bids.limit();
        self.asks.limit();
    }

    /// Drop all levels, buffered deltas and the nonce.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.cache.clear();
        self.nonce = None;
        self.timestamp = None;
        self.synced = false;
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&S::Level> {
        self.bids.best()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&S::Level> {
        self.asks.best()
    }

    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price() - self.best_bid()?.price())
    }

    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        let total = self.best_ask()?.price() + self.best_bid()?.price();
        Some(total / Decimal::TWO)
    }

    /// Owned `(price, size)` view, best first, at most `depth` levels a side.
    #[must_use]
    pub fn view(&self, depth: Option<usize>) -> BookView {
        let take = |side: &S| -> Vec<[Decimal; 2]> {
            side.levels()
                .iter()
                .take(depth.unwrap_or(usize::MAX))
                .map(|l| [l.price(), l.size()])
                .collect()
        };
        BookView {
            symbol: self.symbol.clone(),
            nonce: self.nonce,
            timestamp: self.timestamp,
            datetime: self.datetime(),
            bids: take(&self.bids),
            asks: take(&self.asks),
        }
    }
}

/// Detached copy of a book, handed to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookView {
    pub symbol: String,
    pub nonce: Option<u64>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub bids: Vec<[Decimal; 2]>,
    pub asks: Vec<[Decimal; 2]>,
}
