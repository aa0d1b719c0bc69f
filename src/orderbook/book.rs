//! Core order book implementation
//!
//! Uses BTreeMap for efficient sorted price level management.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::Side;
use crate::events::BookSnapshot;

/// Price-level ledger for a single asset.
///
/// Mirrors whatever the feed reports: crossed books are kept as-is and
/// prices are not range-checked here.
#[derive(Debug, Clone)]
pub struct OrderBook {
    asset_id: String,
    /// Bids sorted by price descending (highest first)
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Asks sorted by price ascending (lowest first)
    asks: BTreeMap<Decimal, Decimal>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(asset_id: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Upsert a level, or remove it when `size` is zero
    pub fn apply(&mut self, price: Decimal, side: Side, size: Decimal) {
        match side {
            Side::Bid => {
                if size.is_zero() {
                    self.bids.remove(&Reverse(price));
                } else {
                    self.bids.insert(Reverse(price), size);
                }
            }
            Side::Ask => {
                if size.is_zero() {
                    self.asks.remove(&price);
                } else {
                    self.asks.insert(price, size);
                }
            }
        }
    }

    /// Replace both sides with the levels of a full snapshot
    pub fn load_snapshot(&mut self, snapshot: &BookSnapshot) {
        self.bids.clear();
        self.asks.clear();

        for level in &snapshot.bids {
            self.apply(level.price, Side::Bid, level.size);
        }
        for level in &snapshot.asks {
            self.apply(level.price, Side::Ask, level.size);
        }
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first_key_value().map(|(Reverse(p), _)| *p)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first_key_value().map(|(p, _)| *p)
    }

    /// Resting size at `price`, if the level exists
    pub fn size_at(&self, side: Side, price: Decimal) -> Option<Decimal> {
        match side {
            Side::Bid => self.bids.get(&Reverse(price)).copied(),
            Side::Ask => self.asks.get(&price).copied(),
        }
    }

    /// Number of levels on one side
    pub fn levels(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.len(),
            Side::Ask => self.asks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
