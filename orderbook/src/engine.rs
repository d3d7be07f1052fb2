//! Matching engine core
//!
//! Owns the book, the trade ledger and the journal handle. A pass repeatedly
//! pairs the best buy with the best sell while they cross; each pairing is
//! journalled as one record before it touches memory.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::book::OrderBook;
use crate::crossing;
use crate::error::{BookError, Result};
use crate::journal::{Journal, JournalRecord};
use crate::ledger::TradeLedger;
use crate::types::{Fill, Order, OrderId, PriceTotal, Side, Trade};

pub struct MatchingEngine<J: Journal> {
    book: OrderBook,
    ledger: TradeLedger,
    journal: J,
}

impl<J: Journal> MatchingEngine<J> {
    /// Empty engine writing to `journal`. Existing records are not replayed.
    pub fn new(journal: J) -> Self {
        Self {
            book: OrderBook::new(),
            ledger: TradeLedger::new(),
            journal,
        }
    }

    /// Rebuilds the book and the ledger from every intact journal record.
    pub fn recover(mut journal: J) -> Result<Self> {
        let records = journal.replay()?;
        let replayed = records.len();
        let mut engine = Self::new(journal);

        for record in records {
            match record {
                JournalRecord::OrderAccepted(order) => engine.book.insert(order)?,
                JournalRecord::Fill(fill) => {
                    engine.apply_fill(&fill)?;
                }
            }
        }

        info!(
            records = replayed,
            resting = engine.book.len(),
            trades = engine.ledger.len(),
            "order book recovered"
        );
        Ok(engine)
    }

    /// Validates, journals and rests a new order. No matching happens here.
    pub fn submit(&mut self, side: Side, price: Decimal, qty: i64) -> Result<OrderId> {
        let order = self.book.prepare(side, price, qty)?;
        self.journal
            .append(&JournalRecord::OrderAccepted(order.clone()))?;

        let id = order.id;
        info!(order_id = %id, %side, price = %order.price, qty = order.remaining_qty, "order accepted");
        self.book.insert(order)?;
        Ok(id)
    }

    /// Executes every match currently possible and returns the trades in
    /// execution order.
    ///
    /// If a step cannot be journalled it is dropped, the pass stops and the
    /// error is returned; steps committed before it stay committed.
    pub fn run_matching_pass(&mut self) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();

        while let Some(fill) = self.next_fill() {
            if let Err(e) = self.journal.append(&JournalRecord::Fill(fill)) {
                warn!(committed = trades.len(), error = %e, "match step not persisted, pass aborted");
                return Err(e.into());
            }
            trades.push(self.apply_fill(&fill)?);
        }

        if !trades.is_empty() {
            info!(
                trades = trades.len(),
                qty = trades.iter().map(|t| u128::from(t.qty)).sum::<u128>(),
                "matching pass complete"
            );
        }
        Ok(trades)
    }

    /// Best buy against best sell, if they cross.
    ///
    /// Sells are price-ascending and rounding is monotone, so once the best
    /// pair does not cross no other pair can.
    fn next_fill(&self) -> Option<Fill> {
        let buyer = self.book.best_buy()?;
        let seller = self.book.best_sell()?;
        if !crossing::can_match(buyer.price, seller.price) {
            return None;
        }

        Some(Fill {
            buy: buyer.id,
            sell: seller.id,
            price: seller.price, // sell side sets the execution price
            qty: buyer.remaining_qty.min(seller.remaining_qty),
        })
    }

    // Both orders are checked before either is touched.
    fn apply_fill(&mut self, fill: &Fill) -> Result<Trade> {
        let buy_left = self.remaining_after(fill.buy, Side::Buy, fill.qty)?;
        let sell_left = self.remaining_after(fill.sell, Side::Sell, fill.qty)?;

        self.book.reduce_remaining(fill.buy, buy_left)?;
        self.book.reduce_remaining(fill.sell, sell_left)?;
        if buy_left == 0 {
            self.book.remove(fill.buy)?;
        }
        if sell_left == 0 {
            self.book.remove(fill.sell)?;
        }

        let trade = fill.trade();
        self.ledger.append(trade);
        debug!(
            buy = %fill.buy,
            sell = %fill.sell,
            price = %fill.price,
            qty = fill.qty,
            buy_left,
            sell_left,
            "fill"
        );
        Ok(trade)
    }

    fn remaining_after(&self, id: OrderId, side: Side, qty: u64) -> Result<u64> {
        let order = self.book.get(id).ok_or(BookError::NotFound(id))?;
        if order.side != side {
            return Err(BookError::InvalidArgument(format!(
                "order {id} is a {} order, expected {side}",
                order.side
            )));
        }
        order.remaining_qty.checked_sub(qty).ok_or_else(|| {
            BookError::InvalidArgument(format!(
                "fill of {qty} exceeds remaining {} on order {id}",
                order.remaining_qty
            ))
        })
    }

    /// Resting buys then resting sells, each in priority order.
    pub fn open_orders(&self) -> Vec<Order> {
        self.book.list_open()
    }

    /// Completed volume per execution price, highest first.
    pub fn completed_by_price(&self) -> Vec<PriceTotal> {
        self.ledger.list_aggregated_by_price()
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    pub fn into_journal(self) -> J {
        self.journal
    }
}
