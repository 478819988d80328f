use crate::models::Order;
use rust_decimal::Decimal;

/// Demo order book. Orders are kept in insertion order; sorting happens on
/// read so equal-price orders never swap places between refreshes.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: Vec<Order>,
    asks: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bid(&mut self, order: Order) {
        self.bids.push(order);
    }

    pub fn add_ask(&mut self, order: Order) {
        self.asks.push(order);
    }

    /// Highest bid price (best price a buyer will pay)
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(Order::price).max()
    }

    /// Lowest ask price (best price a seller will accept)
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(Order::price).min()
    }

    /// Spread between best ask and best bid. `None` means there is no
    /// market on one of the sides, not an error.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// Asks, cheapest first.
    pub fn sorted_asks(&self) -> Vec<Order> {
        let mut asks = self.asks.clone();
        // sort_by is stable: ties keep insertion order
        asks.sort_by(|a, b| a.price().cmp(&b.price()));
        asks
    }

    /// Bids, highest first.
    pub fn sorted_bids(&self) -> Vec<Order> {
        let mut bids = self.bids.clone();
        bids.sort_by(|a, b| b.price().cmp(&a.price()));
        bids
    }
}
