use serde::Deserialize;

use crate::book::DEFAULT_BUFFER_LIMIT;

/// Which book flavour the reference feed maintains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookKind {
    /// `[price, size]` levels.
    #[default]
    Plain,
    /// `[price, size, count]` levels.
    Counted,
    /// `[price, size, order_id]` entries.
    Indexed,
}

/// Reference feed settings: where to connect and how much to keep.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint. Overridden by `EDGESTREAM_WS_URL`.
    #[serde(default)]
    pub ws_url: String,
    #[serde(default = "default_limit")]
    pub trades_limit: usize,
    #[serde(default = "default_limit")]
    pub ohlcv_limit: usize,
    #[serde(default = "default_limit")]
    pub orders_limit: usize,
    /// Levels kept per side after each update. Unlimited when absent.
    #[serde(default)]
    pub book_depth: Option<usize>,
    #[serde(default)]
    pub book_kind: BookKind,
    /// Deltas buffered per book while it waits for a snapshot.
    #[serde(default = "default_book_buffer_limit")]
    pub book_buffer_limit: usize,
}

fn default_limit() -> usize {
    1000
}

fn default_book_buffer_limit() -> usize {
    DEFAULT_BUFFER_LIMIT
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: String::new(),
            trades_limit: default_limit(),
            ohlcv_limit: default_limit(),
            orders_limit: default_limit(),
            book_depth: None,
            book_kind: BookKind::default(),
            book_buffer_limit: default_book_buffer_limit(),
        }
    }
}
