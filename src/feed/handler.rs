//! Caches behind the reference feed and the session handler that fills them.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::envelope::{
    book_hash, ohlcv_hash, orders_hash, ping_message, positions_hash, trades_hash,
    BookMessageKind, Channel, Envelope,
};
use crate::book::delta::{parse_side, FromLevel};
use crate::book::{
    Book, BookDelta, BookSide, BookSnapshot, BookView, CountedOrderBook, IndexedOrderBook,
    OrderBook,
};
use crate::cache::{IdentityCache, SideCache, TimeKeyedCache, UpdateCache};
use crate::config::{BookKind, FeedConfig};
use crate::domain::{Ohlcv, Order, Position, Symbolic, Trade};
use crate::error::{Error, Result};
use crate::session::{Frame, Handler, Session};

/// Book of the flavour chosen in [`FeedConfig::book_kind`].
#[derive(Debug, Clone)]
enum AnyBook {
    Plain(OrderBook),
    Counted(CountedOrderBook),
    Indexed(IndexedOrderBook),
}

impl AnyBook {
    fn new(config: &FeedConfig, symbol: &str) -> Self {
        let depth = config.book_depth;
        let buffer = config.book_buffer_limit;
        match config.book_kind {
            BookKind::Plain => Self::Plain(Book::new(symbol, depth).with_buffer_limit(buffer)),
            BookKind::Counted => Self::Counted(Book::new(symbol, depth).with_buffer_limit(buffer)),
            BookKind::Indexed => Self::Indexed(Book::new(symbol, depth).with_buffer_limit(buffer)),
        }
    }

    /// Returns whether the book now holds a state worth reporting.
    fn apply(&mut self, envelope: &Envelope) -> Result<bool> {
        match self {
            Self::Plain(book) => apply_book(book, envelope),
            Self::Counted(book) => apply_book(book, envelope),
            Self::Indexed(book) => apply_book(book, envelope),
        }
    }

    fn view(&self, depth: Option<usize>) -> BookView {
        match self {
            Self::Plain(book) => book.view(depth),
            Self::Counted(book) => book.view(depth),
            Self::Indexed(book) => book.view(depth),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Plain(book) => book.clear(),
            Self::Counted(book) => book.clear(),
            Self::Indexed(book) => book.clear(),
        }
    }
}

fn apply_book<S>(book: &mut Book<S>, envelope: &Envelope) -> Result<bool>
where
    S: BookSide,
    S::Delta: FromLevel,
{
    let bids = parse_side(envelope.bids.as_ref())?;
    let asks = parse_side(envelope.asks.as_ref())?;

    let changed = match envelope.kind.unwrap_or(BookMessageKind::Delta) {
        BookMessageKind::Snapshot => {
            let snapshot = BookSnapshot {
                nonce: envelope.nonce,
                timestamp: envelope.timestamp,
                bids,
                asks,
            };
            book.sync(snapshot)?;
            true
        }
        BookMessageKind::Delta => book.apply(BookDelta {
            nonce: envelope.nonce,
            prev_nonce: envelope.prev_nonce,
            timestamp: envelope.timestamp,
            bids,
            asks,
        })?,
    };
    book.limit();
    Ok(changed)
}

#[derive(Default)]
struct Caches {
    trades: HashMap<String, UpdateCache<Trade>>,
    ohlcv: HashMap<(String, String), TimeKeyedCache<Ohlcv>>,
    orders: Option<IdentityCache<Order>>,
    positions: Option<SideCache<Position>>,
    books: HashMap<String, AnyBook>,
}

/// Session handler for the reference feed.
///
/// Decodes envelopes, appends them to per-stream caches and resolves the
/// matching watch hashes. Watch calls read windows back out through the
/// `*_window` methods.
pub struct FeedHandler {
    config: FeedConfig,
    caches: Mutex<Caches>,
}

impl FeedHandler {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            caches: Mutex::new(Caches::default()),
        }
    }

    /// New trades for `symbol` since the last call, at most `limit`.
    pub fn trades_window(&self, symbol: &str, limit: Option<usize>) -> Vec<Trade> {
        let mut caches = self.caches.lock();
        let Some(cache) = caches.trades.get_mut(symbol) else {
            return Vec::new();
        };
        let limit = cache.get_limit(Some(symbol), limit);
        cache.tail(limit).cloned().collect()
    }

    /// New candles for `symbol`/`timeframe` since the last call.
    pub fn ohlcv_window(&self, symbol: &str, timeframe: &str, limit: Option<usize>) -> Vec<Ohlcv> {
        let mut caches = self.caches.lock();
        let key = (symbol.to_owned(), timeframe.to_owned());
        let Some(cache) = caches.ohlcv.get_mut(&key) else {
            return Vec::new();
        };
        let limit = cache.get_limit(Some(symbol), limit);
        cache.tail(limit).cloned().collect()
    }

    /// Updated orders since the last call, for one symbol or all.
    pub fn orders_window(&self, symbol: Option<&str>, limit: Option<usize>) -> Vec<Order> {
        let mut caches = self.caches.lock();
        let Some(cache) = caches.orders.as_mut() else {
            return Vec::new();
        };
        let limit = cache.get_limit(symbol, limit);
        newest_for(cache.iter(), symbol, limit)
    }

    /// Updated positions since the last call, for one symbol or all.
    pub fn positions_window(&self, symbol: Option<&str>, limit: Option<usize>) -> Vec<Position> {
        let mut caches = self.caches.lock();
        let Some(cache) = caches.positions.as_mut() else {
            return Vec::new();
        };
        let limit = cache.get_limit(symbol, limit);
        newest_for(cache.iter(), symbol, limit)
    }

    /// Current book for `symbol`, `depth` levels a side.
    pub fn book_view(&self, symbol: &str, depth: Option<usize>) -> Option<BookView> {
        self.caches.lock().books.get(symbol).map(|book| book.view(depth))
    }

    fn on_trades(&self, session: &Session, envelope: Envelope) -> Result<()> {
        let trades: Vec<Trade> = decode(envelope.data)?;
        let limit = Some(self.config.trades_limit);
        let mut touched = BTreeSet::new();
        {
            let mut caches = self.caches.lock();
            for trade in trades {
                touched.insert(trade.symbol.clone());
                caches
                    .trades
                    .entry(trade.symbol.clone())
                    .or_insert_with(|| UpdateCache::new(limit))
                    .append(trade);
            }
        }
        for symbol in touched {
            session.resolve(Value::String(symbol.clone()), &trades_hash(&symbol));
        }
        Ok(())
    }

    fn on_ohlcv(&self, session: &Session, envelope: Envelope) -> Result<()> {
        let (Some(symbol), Some(timeframe)) = (envelope.symbol, envelope.timeframe) else {
            return Err(Error::Parse("ohlcv message without symbol or timeframe".into()));
        };
        let candles: Vec<Ohlcv> = decode(envelope.data)?;
        let limit = Some(self.config.ohlcv_limit);
        {
            let mut caches = self.caches.lock();
            let cache = caches
                .ohlcv
                .entry((symbol.clone(), timeframe.clone()))
                .or_insert_with(|| TimeKeyedCache::new(limit));
            for candle in candles {
                cache.append(candle);
            }
        }
        session.resolve(Value::String(symbol.clone()), &ohlcv_hash(&symbol, &timeframe));
        Ok(())
    }

    fn on_orders(&self, session: &Session, envelope: Envelope) -> Result<()> {
        let orders: Vec<Order> = decode(envelope.data)?;
        let limit = Some(self.config.orders_limit);
        let touched = {
            let mut caches = self.caches.lock();
            let cache = caches.orders.get_or_insert_with(|| IdentityCache::new(limit));
            append_all(cache, orders, |cache, order| cache.append(order))
        };
        resolve_scoped(session, touched, orders_hash);
        Ok(())
    }

    fn on_positions(&self, session: &Session, envelope: Envelope) -> Result<()> {
        let positions: Vec<Position> = decode(envelope.data)?;
        let touched = {
            let mut caches = self.caches.lock();
            let cache = caches.positions.get_or_insert_with(SideCache::unbounded);
            append_all(cache, positions, |cache, position| cache.append(position))
        };
        resolve_scoped(session, touched, positions_hash);
        Ok(())
    }

    fn on_book(&self, session: &Session, envelope: Envelope) -> Result<()> {
        let Some(symbol) = envelope.symbol.clone() else {
            return Err(Error::Parse("book message without symbol".into()));
        };
        let hash = book_hash(&symbol);

        let outcome = {
            let mut caches = self.caches.lock();
            let book = caches
                .books
                .entry(symbol.clone())
                .or_insert_with(|| AnyBook::new(&self.config, &symbol));
            let outcome = book.apply(&envelope);
            if matches!(outcome, Err(Error::Desync { .. })) {
                book.clear();
            }
            outcome
        };

        match outcome {
            Ok(true) => {
                session.resolve(Value::String(symbol), &hash);
            }
            Ok(false) => trace!(symbol = %symbol, "Book update buffered or stale"),
            Err(error @ Error::Desync { .. }) => {
                warn!(symbol = %symbol, error = %error, "Order book out of sync, cleared");
                // The next watch must ask for a fresh snapshot.
                session.unsubscribe(&hash);
                session.reject_waiting(error, &hash);
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    fn on_exchange_error(session: &Session, envelope: Envelope) {
        let message = envelope
            .message
            .unwrap_or_else(|| "unspecified exchange error".to_string());
        warn!(hash = ?envelope.hash, message = %message, "Exchange reported an error");
        session.reject(Error::Exchange(message), envelope.hash.as_deref());
    }

    fn clear_books(&self) {
        let mut caches = self.caches.lock();
        for book in caches.books.values_mut() {
            book.clear();
        }
    }
}

impl Handler for FeedHandler {
    fn handle_message(&self, session: &Session, message: Value) -> Result<()> {
        let envelope: Envelope = match serde_json::from_value(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Ignoring unrecognised message");
                return Ok(());
            }
        };
        trace!(channel = envelope.channel.as_str(), "Received message");

        match envelope.channel {
            Channel::Trades => self.on_trades(session, envelope),
            Channel::Ohlcv => self.on_ohlcv(session, envelope),
            Channel::Orders => self.on_orders(session, envelope),
            Channel::Positions => self.on_positions(session, envelope),
            Channel::Book => self.on_book(session, envelope),
            Channel::Error => {
                Self::on_exchange_error(session, envelope);
                Ok(())
            }
            Channel::Pong => Ok(()),
        }
    }

    fn ping(&self) -> Option<Frame> {
        Frame::json(&ping_message()).ok()
    }

    fn is_pong(&self, message: &Value) -> bool {
        message.get("channel").and_then(Value::as_str) == Some("pong")
    }

    fn on_connected(&self, session: &Session) {
        debug!(url = %session.url(), "Feed connected");
    }

    fn on_error(&self, _session: &Session, error: &Error) {
        info!(error = %error, "Feed connection failed, dropping order books");
        self.clear_books();
    }

    fn on_close(&self, _session: &Session, error: &Error) {
        info!(reason = %error, "Feed connection closed, dropping order books");
        self.clear_books();
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<Vec<T>> {
    Ok(serde_json::from_value(data)?)
}

fn append_all<C, T: Symbolic>(
    cache: &mut C,
    items: Vec<T>,
    mut append: impl FnMut(&mut C, T),
) -> BTreeSet<String> {
    let mut touched = BTreeSet::new();
    for item in items {
        touched.insert(item.symbol().to_owned());
        append(cache, item);
    }
    touched
}

/// Resolve the all-symbols hash and each touched symbol's hash.
fn resolve_scoped(
    session: &Session,
    touched: BTreeSet<String>,
    hash: fn(Option<&str>) -> String,
) {
    if touched.is_empty() {
        return;
    }
    session.resolve(Value::Null, &hash(None));
    for symbol in touched {
        session.resolve(Value::String(symbol.clone()), &hash(Some(&symbol)));
    }
}

/// The newest `limit` items, optionally restricted to `symbol`, oldest first.
fn newest_for<'a, T>(
    items: impl DoubleEndedIterator<Item = &'a T>,
    symbol: Option<&str>,
    limit: Option<usize>,
) -> Vec<T>
where
    T: Symbolic + Clone + 'a,
{
    let mut newest: Vec<T> = items
        .rev()
        .filter(|item| symbol.map_or(true, |s| item.symbol() == s))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    newest.reverse();
    newest
}
