use std::collections::BTreeMap;

use crate::types::{Price, PriceTotal, Trade};

/// Append-only record of completed trades.
#[derive(Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
    // running volume per execution price; u128 so any number of u64 fills fits
    volume: BTreeMap<Price, u128>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, trade: Trade) {
        *self.volume.entry(trade.price).or_insert(0) += u128::from(trade.qty);
        self.trades.push(trade);
    }

    /// Completed volume grouped by execution price, highest price first.
    pub fn list_aggregated_by_price(&self) -> Vec<PriceTotal> {
        self.volume
            .iter()
            .rev()
            .map(|(price, qty)| PriceTotal {
                price: *price,
                qty: *qty,
            })
            .collect()
    }

    /// Trades in execution order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn total_qty(&self) -> u128 {
        self.volume.values().sum()
    }
}
