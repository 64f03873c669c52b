//! Price-level order books.
//!
//! Each book keeps bids best (highest) first and asks best (lowest) first,
//! applies point updates with a binary search, and removes a level as soon as
//! its size drops to zero. Three flavours are provided:
//!
//! - [`OrderBook`]: `(price, size)` per price.
//! - [`CountedOrderBook`]: adds the number of orders at the price; a zero
//!   count also removes the level.
//! - [`IndexedOrderBook`]: one entry per order id, several per price.
//!
//! # Examples
//!
//! ```
//! use edgestream::book::{BookSnapshot, OrderBook, PriceLevel};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new("BTC/USDT", Some(10));
//! book.reset(BookSnapshot::new(
//!     vec![PriceLevel::new(dec!(99), dec!(1))],
//!     vec![PriceLevel::new(dec!(101), dec!(2))],
//! ));
//! book.asks_mut().store(dec!(100.5), dec!(1));
//!
//! assert_eq!(book.best_ask().unwrap().price, dec!(100.5));
//! assert_eq!(book.mid_price(), Some(dec!(99.75)));
//! ```

pub mod delta;
mod indexed;
mod ladder;
mod level;
mod order_book;

pub use delta::FromLevel;
pub use indexed::IndexedLadder;
pub use ladder::{BookSide, Ladder};
pub use level::{CountedLevel, Level, OrderDelta, OrderLevel, PriceLevel, Side};
pub use order_book::{
    Book, BookDelta, BookSnapshot, BookView, CountedOrderBook, IndexedOrderBook, OrderBook,
    DEFAULT_BUFFER_LIMIT,
};
