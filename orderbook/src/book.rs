//! Resting order store: two price-time indices plus an id index.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{BookError, Result};
use crate::price_levels::PriceLevels;
use crate::types::{Order, OrderId, Price, Side};

/// Every resting buy and sell for the single traded instrument.
///
/// Not thread-safe; the service keeps it behind one async mutex.
pub struct OrderBook {
    /// Buy orders, highest price first
    pub bids: PriceLevels,
    /// Sell orders, lowest price first
    pub asks: PriceLevels,
    index: HashMap<OrderId, (Side, Price)>,
    next_id: u64,
    last_ts: u64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
            index: HashMap::new(),
            next_id: 1,
            last_ts: 0,
        }
    }

    /// Validates a submission and stamps it with an id and creation time
    /// without storing it.
    pub fn prepare(&mut self, side: Side, price: Decimal, qty: i64) -> Result<Order> {
        if qty <= 0 {
            return Err(BookError::InvalidArgument(format!(
                "quantity must be positive, got {qty}"
            )));
        }
        let price = Price::new(price)?;

        let id = OrderId(self.next_id);
        self.next_id += 1;

        Ok(Order {
            id,
            side,
            price,
            remaining_qty: qty as u64,
            created_at: self.next_timestamp(),
        })
    }

    /// Stores a prepared or replayed order at the back of its price level.
    pub fn insert(&mut self, order: Order) -> Result<()> {
        if order.remaining_qty == 0 {
            return Err(BookError::InvalidArgument(format!(
                "order {} has no remaining quantity",
                order.id
            )));
        }
        if self.index.contains_key(&order.id) {
            return Err(BookError::InvalidArgument(format!(
                "order {} is already resting",
                order.id
            )));
        }

        self.next_id = self.next_id.max(order.id.0 + 1);
        self.last_ts = self.last_ts.max(order.created_at);
        self.index.insert(order.id, (order.side, order.price));
        self.side_mut(order.side).push(order);
        Ok(())
    }

    /// Validates and stores a new order with its full quantity remaining.
    pub fn submit(&mut self, side: Side, price: Decimal, qty: i64) -> Result<OrderId> {
        let order = self.prepare(side, price, qty)?;
        let id = order.id;
        self.insert(order)?;
        Ok(id)
    }

    /// Open buys, price descending then oldest first.
    pub fn list_open_buys(&self) -> Vec<Order> {
        Self::open(&self.bids)
    }

    /// Open sells, price ascending then oldest first.
    pub fn list_open_sells(&self) -> Vec<Order> {
        Self::open(&self.asks)
    }

    /// Buys followed by sells, each in priority order.
    pub fn list_open(&self) -> Vec<Order> {
        let mut orders = self.list_open_buys();
        orders.extend(self.list_open_sells());
        orders
    }

    fn open(levels: &PriceLevels) -> Vec<Order> {
        levels
            .iter_best_first()
            .filter(|o| o.remaining_qty > 0)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(&id)?;
        self.side_ref(*side).get(*price, id)
    }

    /// Sets the remaining quantity of a resting order. Quantities only go down.
    pub fn reduce_remaining(&mut self, id: OrderId, new_qty: u64) -> Result<()> {
        let (side, price) = *self.index.get(&id).ok_or(BookError::NotFound(id))?;
        let order = self
            .side_mut(side)
            .get_mut(price, id)
            .ok_or(BookError::NotFound(id))?;

        if new_qty > order.remaining_qty {
            return Err(BookError::InvalidArgument(format!(
                "order {id}: remaining quantity cannot grow from {} to {new_qty}",
                order.remaining_qty
            )));
        }
        order.remaining_qty = new_qty;
        Ok(())
    }

    /// Deletes a resting order. Removing the same id twice is an error.
    pub fn remove(&mut self, id: OrderId) -> Result<Order> {
        let (side, price) = self.index.remove(&id).ok_or(BookError::NotFound(id))?;
        self.side_mut(side)
            .remove(price, id)
            .ok_or(BookError::NotFound(id))
    }

    /// Oldest order at the highest buy price.
    pub fn best_buy(&self) -> Option<&Order> {
        self.bids.peek_best()
    }

    /// Oldest order at the lowest sell price.
    pub fn best_sell(&self) -> Option<&Order> {
        self.asks.peek_best()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn side_ref(&self, side: Side) -> &PriceLevels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut PriceLevels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    // Wall clock in ns, bumped so two orders never share a timestamp.
    fn next_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        self.last_ts = now.max(self.last_ts + 1);
        self.last_ts
    }
}
