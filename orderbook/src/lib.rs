//! Single-instrument order book with price-time priority matching.
//!
//! Core features:
//! - Resting buys and sells indexed by price, then arrival time
//! - Matching passes that pair the best buy with the best sell while they
//!   cross at two-decimal precision, executing at the sell order's price
//! - Partial fills; filled orders leave the book
//! - A journal that makes every match step durable as one record and
//!   rebuilds the book on restart

pub mod book;
pub mod crossing;
pub mod engine;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod price_levels;
pub mod types;

pub use book::OrderBook;
pub use engine::MatchingEngine;
pub use error::BookError;
pub use journal::{FileJournal, Journal, JournalError, JournalRecord, MemoryJournal};
pub use ledger::TradeLedger;
pub use price_levels::PriceLevels;
pub use types::{Fill, Order, OrderId, Price, PriceTotal, Side, Trade};
