//! Cross-book arbitrage detection
//!
//! Holds the two order books of the active market and compares their
//! combined best prices against the guaranteed $1.00 settlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, trace, Span};

use super::OrderBook;
use crate::bus::EventBus;
use crate::events::{
    ArbitrageKind, ArbitrageSignal, BookSnapshot, Event, Market, PriceChangeBatch, Role,
};

/// Books of the active market
#[derive(Debug)]
struct MarketBooks {
    market: Market,
    yes: OrderBook,
    no: OrderBook,
}

impl MarketBooks {
    fn new(market: Market) -> Self {
        Self {
            yes: OrderBook::new(&market.yes_asset_id),
            no: OrderBook::new(&market.no_asset_id),
            market,
        }
    }

    fn book_mut(&mut self, asset_id: &str) -> Option<&mut OrderBook> {
        match self.market.role_of(asset_id)? {
            Role::Yes => Some(&mut self.yes),
            Role::No => Some(&mut self.no),
        }
    }
}

/// Maintains both books of a binary pair and emits arbitrage signals
#[derive(Debug)]
pub struct ArbitrageAnalyzer {
    bus: EventBus,
    span: Span,
    books: Option<MarketBooks>,
}

impl ArbitrageAnalyzer {
    pub fn new(bus: EventBus, span: Span) -> Self {
        Self {
            bus,
            span,
            books: None,
        }
    }

    pub fn handle(&mut self, event: &Event) {
        let span = self.span.clone();
        let _enter = span.enter();
        match event {
            Event::MarketDiscovered(market) => {
                info!(slug = %market.slug, "Tracking books for new market");
                self.books = Some(MarketBooks::new(market.clone()));
            }
            Event::BookSnapshot(snapshot) => self.on_snapshot(snapshot),
            Event::PriceChangeBatch(batch) => self.on_batch(batch),
            Event::MarketExpired { .. } => self.books = None,
            _ => {}
        }
    }

    /// Book of `role` in the active market
    pub fn book(&self, role: Role) -> Option<&OrderBook> {
        self.books.as_ref().map(|books| match role {
            Role::Yes => &books.yes,
            Role::No => &books.no,
        })
    }

    fn on_snapshot(&mut self, snapshot: &BookSnapshot) {
        if let Some(book) = self
            .books
            .as_mut()
            .and_then(|books| books.book_mut(&snapshot.asset_id))
        {
            book.load_snapshot(snapshot);
        }
    }

    fn on_batch(&mut self, batch: &PriceChangeBatch) {
        let Some(books) = self.books.as_mut() else {
            return;
        };

        for change in &batch.changes {
            match books.book_mut(&change.asset_id) {
                Some(book) => book.apply(change.price, change.side, change.size),
                None => trace!(asset_id = %change.asset_id, "Delta for unknown asset dropped"),
            }
        }

        let timestamp = batch.timestamp.unwrap_or_else(Utc::now);
        for signal in evaluate(&books.yes, &books.no, timestamp) {
            debug!(
                kind = ?signal.kind,
                combined = %signal.combined,
                profit = %signal.profit,
                "Arbitrage detected"
            );
            self.bus.publish(Event::ArbitrageDetected(signal));
        }
    }
}

/// Compare combined best prices of a YES/NO pair against $1.00.
///
/// A pair whose sum overflows is skipped.
pub fn evaluate(yes: &OrderBook, no: &OrderBook, timestamp: DateTime<Utc>) -> Vec<ArbitrageSignal> {
    let mut signals = Vec::new();

    if let (Some(yes_ask), Some(no_ask)) = (yes.best_ask(), no.best_ask()) {
        let combined = yes_ask.checked_add(no_ask);
        if let Some(combined) = combined.filter(|combined| *combined < Decimal::ONE) {
            signals.push(ArbitrageSignal {
                kind: ArbitrageKind::BuyBoth,
                yes_price: yes_ask,
                no_price: no_ask,
                combined,
                profit: Decimal::ONE.saturating_sub(combined),
                timestamp,
            });
        }
    }

    if let (Some(yes_bid), Some(no_bid)) = (yes.best_bid(), no.best_bid()) {
        let combined = yes_bid.checked_add(no_bid);
        if let Some(combined) = combined.filter(|combined| *combined > Decimal::ONE) {
            signals.push(ArbitrageSignal {
                kind: ArbitrageKind::SellBoth,
                yes_price: yes_bid,
                no_price: no_bid,
                combined,
                profit: combined - Decimal::ONE,
                timestamp,
            });
        }
    }

    signals
}
