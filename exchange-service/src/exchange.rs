//! Exchange service core: the single matching engine behind an async mutex.
//!
//! # Concurrency Model
//! - One `MatchingEngine` for the one traded instrument
//! - `Mutex<MatchingEngine>` serializes submissions, queries and passes, so a
//!   pass never sees a half-applied submission and never overlaps another pass
//! - Passes themselves are only started by the trigger worker (`trigger.rs`)
//! - Calls that append to the journal run on the blocking pool, since a file
//!   journal syncs every record to disk

use orderbook::{
    BookError, FileJournal, Journal, JournalError, MatchingEngine, MemoryJournal, Order, OrderId,
    PriceTotal, Side, Trade,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::types::BookStats;

/// Journal handle as the service owns it: a file, or memory when none is configured.
pub type EngineJournal = Box<dyn Journal + Send>;

pub struct Exchange {
    engine: Arc<Mutex<MatchingEngine<EngineJournal>>>,
}

impl Exchange {
    pub fn new(engine: MatchingEngine<EngineJournal>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Opens the journal (if any) and rebuilds the book from it.
    pub fn open(journal: Option<&Path>) -> Result<Self, BookError> {
        let journal: EngineJournal = match journal {
            Some(path) => {
                info!(path = %path.display(), "opening journal");
                Box::new(FileJournal::open(path)?)
            }
            None => {
                warn!("no journal configured, the book will not survive a restart");
                Box::new(MemoryJournal::new())
            }
        };

        Ok(Self::new(MatchingEngine::recover(journal)?))
    }

    /// Validates and rests a new order. Matching is the trigger's job.
    pub async fn submit_order(&self, side: Side, price: Decimal, qty: i64) -> Result<OrderId, BookError> {
        self.with_engine_blocking(move |engine| engine.submit(side, price, qty))
            .await
    }

    /// Runs one matching pass. Only the trigger worker calls this.
    pub async fn run_matching_pass(&self) -> Result<Vec<Trade>, BookError> {
        self.with_engine_blocking(|engine| engine.run_matching_pass())
            .await
    }

    // The lock is held until the blocking call returns, even if the caller
    // stops waiting.
    async fn with_engine_blocking<T, F>(&self, f: F) -> Result<T, BookError>
    where
        F: FnOnce(&mut MatchingEngine<EngineJournal>) -> Result<T, BookError> + Send + 'static,
        T: Send + 'static,
    {
        let mut engine = self.engine.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut *engine))
            .await
            .map_err(|e| {
                BookError::StoreFailure(JournalError::Unavailable(format!(
                    "engine task failed: {e}"
                )))
            })?
    }

    /// Resting buys (best first) followed by resting sells (best first).
    pub async fn open_orders(&self) -> Vec<Order> {
        self.engine.lock().await.open_orders()
    }

    /// Completed volume per execution price, highest price first.
    pub async fn completed_by_price(&self) -> Vec<PriceTotal> {
        self.engine.lock().await.completed_by_price()
    }

    pub async fn stats(&self) -> BookStats {
        let engine = self.engine.lock().await;
        let book = engine.book();
        BookStats {
            resting_orders: book.len(),
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            trades: engine.ledger().len(),
        }
    }
}
