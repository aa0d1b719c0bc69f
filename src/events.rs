//! Typed events exchanged between components
//!
//! Every component consumes and produces these records through the
//! [`EventBus`](crate::bus::EventBus); no component calls another directly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orderbook::Side;

/// Logical role of an asset within a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Yes,
    No,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Yes, Role::No];
}

/// Direction of a quote or simulated order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bid,
    Ask,
}

/// The active binary market: exactly one YES asset and one NO asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub slug: String,
    pub yes_asset_id: String,
    pub no_asset_id: String,
}

impl Market {
    /// Role of `asset_id` in this market, if it belongs to it
    pub fn role_of(&self, asset_id: &str) -> Option<Role> {
        if asset_id == self.yes_asset_id {
            Some(Role::Yes)
        } else if asset_id == self.no_asset_id {
            Some(Role::No)
        } else {
            None
        }
    }

    pub fn asset(&self, role: Role) -> &str {
        match role {
            Role::Yes => &self.yes_asset_id,
            Role::No => &self.no_asset_id,
        }
    }
}

/// A single price level of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
}

impl Level {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Full order book snapshot for one asset.
///
/// Feed convention: `bids` ascend and `asks` descend, so the best level
/// of either side is the *last* element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub asset_id: String,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.last()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.last()
    }
}

/// One order book delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub asset_id: String,
    pub price: Decimal,
    pub size: Decimal,
    /// `Bid` for wire side BUY, `Ask` for SELL
    pub side: Side,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
}

/// Deltas delivered together; arbitrage is evaluated once per batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeBatch {
    pub timestamp: Option<DateTime<Utc>>,
    pub changes: Vec<PriceChange>,
}

/// Desired quote for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub asset_id: String,
    pub role: Role,
    pub direction: Direction,
    pub price: Decimal,
}

/// Confirmed simulated fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub asset_id: String,
    pub role: Role,
    pub direction: Direction,
    pub price: Decimal,
    pub size: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArbitrageKind {
    /// Buying one unit of each asset costs less than the $1.00 payout
    BuyBoth,
    /// Selling one unit of each asset yields more than the $1.00 liability
    SellBoth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageSignal {
    pub kind: ArbitrageKind,
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub combined: Decimal,
    pub profit: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Informational inventory summary derived when a market expires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    pub slug: String,
    pub yes_qty: Decimal,
    pub no_qty: Decimal,
    pub yes_invested: Decimal,
    pub no_invested: Decimal,
    pub total_invested: Decimal,
    /// Payout assuming the larger-held role wins
    pub theoretical_payout: Decimal,
}

/// Every event that flows through the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    #[serde(rename = "market.discovered")]
    MarketDiscovered(Market),
    #[serde(rename = "market.bookSnapshot")]
    BookSnapshot(BookSnapshot),
    #[serde(rename = "market.priceChangeBatch")]
    PriceChangeBatch(PriceChangeBatch),
    #[serde(rename = "market.expired")]
    MarketExpired { slug: String },
    #[serde(rename = "quote.issued")]
    QuoteIssued(Quote),
    #[serde(rename = "order.filled")]
    OrderFilled(Fill),
    #[serde(rename = "arbitrage.detected")]
    ArbitrageDetected(ArbitrageSignal),
    #[serde(rename = "pnl.summary")]
    PnlSummary(PnlSummary),
}

impl Event {
    /// Stable name used for logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MarketDiscovered(_) => "market.discovered",
            Event::BookSnapshot(_) => "market.bookSnapshot",
            Event::PriceChangeBatch(_) => "market.priceChangeBatch",
            Event::MarketExpired { .. } => "market.expired",
            Event::QuoteIssued(_) => "quote.issued",
            Event::OrderFilled(_) => "order.filled",
            Event::ArbitrageDetected(_) => "arbitrage.detected",
            Event::PnlSummary(_) => "pnl.summary",
        }
    }

    /// Whether this event is produced by the engine rather than the feed
    pub fn is_produced(&self) -> bool {
        matches!(
            self,
            Event::QuoteIssued(_)
                | Event::OrderFilled(_)
                | Event::ArbitrageDetected(_)
                | Event::PnlSummary(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market() -> Market {
        Market {
            slug: "btc-updown-15m".to_string(),
            yes_asset_id: "yes-token".to_string(),
            no_asset_id: "no-token".to_string(),
        }
    }

    #[test]
    fn test_role_of() {
        let market = market();
        assert_eq!(market.role_of("yes-token"), Some(Role::Yes));
        assert_eq!(market.role_of("no-token"), Some(Role::No));
        assert_eq!(market.role_of("other"), None);
        assert_eq!(market.asset(Role::No), "no-token");
    }

    #[test]
    fn test_snapshot_best_is_last_element() {
        let snapshot = BookSnapshot {
            asset_id: "yes-token".to_string(),
            bids: vec![Level::new(dec!(0.38), dec!(10)), Level::new(dec!(0.40), dec!(100))],
            asks: vec![Level::new(dec!(0.47), dec!(20)), Level::new(dec!(0.45), dec!(50))],
        };
        assert_eq!(snapshot.best_bid().map(|l| l.price), Some(dec!(0.40)));
        assert_eq!(snapshot.best_ask().map(|l| l.price), Some(dec!(0.45)));
    }

    #[test]
    fn test_event_wire_names() {
        let event = Event::MarketExpired {
            slug: "btc-updown-15m".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "market.expired");
        assert_eq!(event.kind(), "market.expired");
        assert!(!event.is_produced());
    }
}
