//! Inventory-aware quote generation
//!
//! Buy-only paper maker: every snapshot of an active-market asset yields a
//! BID quote at the inventory-skewed reservation price.

use tracing::{debug, info, trace, warn, Span};

use super::inventory::Inventory;
use super::pricing::{self, QuoteParams};
use crate::bus::EventBus;
use crate::events::{BookSnapshot, Direction, Event, Fill, Market, Quote, Role};

pub struct QuoteEngine {
    bus: EventBus,
    span: Span,
    params: QuoteParams,
    market: Option<Market>,
    inventory: Inventory,
}

impl QuoteEngine {
    pub fn new(bus: EventBus, span: Span, params: QuoteParams) -> Self {
        Self {
            bus,
            span,
            params,
            market: None,
            inventory: Inventory::new(),
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn handle(&mut self, event: &Event) {
        let span = self.span.clone();
        let _enter = span.enter();
        match event {
            Event::MarketDiscovered(market) => {
                self.market = Some(market.clone());
                self.inventory.reset();
            }
            Event::BookSnapshot(snapshot) => self.on_snapshot(snapshot),
            Event::OrderFilled(fill) => self.on_fill(fill),
            Event::MarketExpired { slug } => self.on_expired(slug),
            _ => {}
        }
    }

    fn on_snapshot(&mut self, snapshot: &BookSnapshot) {
        let Some(market) = self.market.as_ref() else {
            return;
        };
        let Some(role) = market.role_of(&snapshot.asset_id) else {
            trace!(asset_id = %snapshot.asset_id, "Snapshot for unknown asset ignored");
            return;
        };
        let (Some(best_bid), Some(best_ask)) = (snapshot.best_bid(), snapshot.best_ask()) else {
            trace!(asset_id = %snapshot.asset_id, "One-sided snapshot, no quote");
            return;
        };

        let Some(breakdown) = pricing::compute(
            best_bid,
            best_ask,
            self.inventory.position(Role::Yes).quantity,
            self.inventory.position(Role::No).quantity,
            role,
            self.params,
        ) else {
            warn!(asset_id = %snapshot.asset_id, "Quote computation overflowed, no quote");
            return;
        };

        debug!(
            role = ?role,
            micro_price = %breakdown.micro_price,
            imbalance_pct = %breakdown.imbalance_pct,
            reservation = %breakdown.reservation_price,
            bid = %breakdown.bid,
            "Quote computed"
        );

        self.bus.publish(Event::QuoteIssued(Quote {
            asset_id: snapshot.asset_id.clone(),
            role,
            direction: Direction::Bid,
            price: breakdown.bid,
        }));
    }

    fn on_fill(&mut self, fill: &Fill) {
        let active = self
            .market
            .as_ref()
            .is_some_and(|market| market.role_of(&fill.asset_id) == Some(fill.role));
        if !active {
            debug!(asset_id = %fill.asset_id, "Fill outside the active market ignored");
            return;
        }
        // Only buys are quoted, so only buys move inventory
        if fill.direction != Direction::Bid {
            trace!(role = ?fill.role, "Non-bid fill leaves inventory unchanged");
            return;
        }
        if let Err(e) = self.inventory.record_buy(fill.role, fill.size, fill.price) {
            warn!(role = ?fill.role, error = %e, "Fill not recorded");
            return;
        }
        let position = self.inventory.position(fill.role);
        debug!(
            role = ?fill.role,
            quantity = %position.quantity,
            avg_cost = %position.avg_cost,
            "Inventory updated"
        );
    }

    fn on_expired(&mut self, slug: &str) {
        let summary = self.inventory.summary(slug);
        info!(
            slug = %slug,
            yes_qty = %summary.yes_qty,
            no_qty = %summary.no_qty,
            total_invested = %summary.total_invested,
            theoretical_payout = %summary.theoretical_payout,
            "Market expired, inventory settled"
        );
        self.bus.publish(Event::PnlSummary(summary));
        self.inventory.reset();
        self.market = None;
    }
}
