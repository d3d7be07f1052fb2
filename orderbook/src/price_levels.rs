use crate::types::{Order, OrderId, Price, Side};
use std::collections::{BTreeMap, VecDeque};

// One side of the book: price levels in a BTreeMap, FIFO queue per level.
// side determines which end of the map is the best
// - Sell: lowest price is best (front of map)
// - Buy: highest price is best (back of map)
pub struct PriceLevels {
    side: Side,
    /// price mapped to the orders resting at it, oldest first
    levels: BTreeMap<Price, VecDeque<Order>>,
}

impl PriceLevels {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Appends to the back of its price level, creating the level if needed.
    /// Callers push in `created_at` order so each queue stays FIFO.
    pub fn push(&mut self, order: Order) {
        self.levels.entry(order.price).or_default().push_back(order);
    }

    /// Best price for the side without removing anything.
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Sell => self.levels.first_key_value().map(|(px, _)| *px),
            Side::Buy => self.levels.last_key_value().map(|(px, _)| *px),
        }
    }

    /// Oldest order at the best price.
    pub fn peek_best(&self) -> Option<&Order> {
        let px = self.best_price()?;
        self.levels.get(&px)?.front()
    }

    pub fn get(&self, price: Price, id: OrderId) -> Option<&Order> {
        self.levels.get(&price)?.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, price: Price, id: OrderId) -> Option<&mut Order> {
        self.levels.get_mut(&price)?.iter_mut().find(|o| o.id == id)
    }

    /// Removes one order from its level, dropping the level if it empties.
    pub fn remove(&mut self, price: Price, id: OrderId) -> Option<Order> {
        let q = self.levels.get_mut(&price)?;
        let pos = q.iter().position(|o| o.id == id)?;
        let order = q.remove(pos);
        if q.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// Every resting order in priority order: best price first, oldest first
    /// within a price.
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = &Order> + '_> {
        let levels = self.levels.values();
        match self.side {
            Side::Sell => Box::new(levels.flatten()),
            Side::Buy => Box::new(levels.rev().flatten()),
        }
    }

    pub fn total_qty(&self) -> u128 {
        self.levels
            .values()
            .flat_map(|q| q.iter())
            .map(|o| u128::from(o.remaining_qty))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
