use std::sync::Arc;

use crate::book::BookView;
use crate::config::Config;
use crate::domain::{Ohlcv, Order, Position, Trade};
use crate::error::{Error, Result};
use crate::session::{SessionHub, SharedTransportFactory, Transport, WsTransport};

use super::envelope::{
    book_hash, ohlcv_hash, orders_hash, positions_hash, subscribe_message, trades_hash, Channel,
};
use super::handler::FeedHandler;

/// Watch API of the reference feed.
///
/// Each `watch_*` call subscribes once per connection, waits for the next
/// update of its stream and returns what arrived since the previous call
/// for the same stream (capped at `limit`).
pub struct Feed {
    url: String,
    hub: SessionHub,
    handler: Arc<FeedHandler>,
}

impl Feed {
    /// Feed over real WebSocket connections.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let factory: SharedTransportFactory =
            Arc::new(|| Box::new(WsTransport::new()) as Box<dyn Transport>);
        Self::with_factory(config, factory)
    }

    /// Feed over transports from `factory`.
    #[must_use]
    pub fn with_factory(config: &Config, factory: SharedTransportFactory) -> Self {
        let handler = Arc::new(FeedHandler::new(config.feed.clone()));
        let hub = SessionHub::new(
            config.session.clone(),
            config.reconnection.clone(),
            factory,
            handler.clone(),
        );
        Self {
            url: config.feed.ws_url.clone(),
            hub,
            handler,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn handler(&self) -> &FeedHandler {
        &self.handler
    }

    #[must_use]
    pub const fn hub(&self) -> &SessionHub {
        &self.hub
    }

    pub async fn watch_trades(&self, symbol: &str, limit: Option<usize>) -> Result<Vec<Trade>> {
        let hash = trades_hash(symbol);
        let message = subscribe_message(Channel::Trades, Some(symbol), None);
        self.hub
            .watch(&self.url, &hash, Some(&message), Some(&hash))
            .await?;
        Ok(self.handler.trades_window(symbol, limit))
    }

    pub async fn watch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Ohlcv>> {
        let hash = ohlcv_hash(symbol, timeframe);
        let message = subscribe_message(Channel::Ohlcv, Some(symbol), Some(timeframe));
        self.hub
            .watch(&self.url, &hash, Some(&message), Some(&hash))
            .await?;
        Ok(self.handler.ohlcv_window(symbol, timeframe, limit))
    }

    /// Order updates for `symbol`, or for every symbol when `None`.
    pub async fn watch_orders(
        &self,
        symbol: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>> {
        let hash = orders_hash(symbol);
        let subscribe_hash = orders_hash(None);
        let message = subscribe_message(Channel::Orders, None, None);
        self.hub
            .watch(&self.url, &hash, Some(&message), Some(&subscribe_hash))
            .await?;
        Ok(self.handler.orders_window(symbol, limit))
    }

    /// Position updates for any of `symbols` (every symbol when empty).
    pub async fn watch_positions(
        &self,
        symbols: &[&str],
        limit: Option<usize>,
    ) -> Result<Vec<Position>> {
        let subscribe_hash = positions_hash(None);
        let message = subscribe_message(Channel::Positions, None, None);
        if symbols.is_empty() {
            self.hub
                .watch(&self.url, &subscribe_hash, Some(&message), Some(&subscribe_hash))
                .await?;
            return Ok(self.handler.positions_window(None, limit));
        }

        let hashes: Vec<String> = symbols.iter().map(|s| positions_hash(Some(s))).collect();
        let hash_refs: Vec<&str> = hashes.iter().map(String::as_str).collect();
        let resolved = self
            .hub
            .watch_multiple(&self.url, &hash_refs, Some(&message), &[&subscribe_hash])
            .await?;
        let symbol = resolved
            .as_str()
            .ok_or_else(|| Error::Parse("position update without symbol".into()))?;
        Ok(self.handler.positions_window(Some(symbol), limit))
    }

    /// Book for `symbol` after its next update, `depth` levels a side.
    pub async fn watch_order_book(&self, symbol: &str, depth: Option<usize>) -> Result<BookView> {
        let hash = book_hash(symbol);
        let message = subscribe_message(Channel::Book, Some(symbol), None);
        self.hub
            .watch(&self.url, &hash, Some(&message), Some(&hash))
            .await?;
        self.handler
            .book_view(symbol, depth)
            .ok_or_else(|| Error::Desync {
                symbol: symbol.to_string(),
                reason: "book dropped before it could be read".to_string(),
            })
    }

    /// Close every connection.
    pub async fn close(&self) {
        self.hub.close().await;
    }
}
