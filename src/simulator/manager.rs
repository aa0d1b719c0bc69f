//! Simulated order manager
//!
//! Paper venue with one order slot per role. Placements and fills are
//! delayed by the latency model; every timer carries the generation of the
//! order it targets and is ignored on arrival if that order has left the slot.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, trace, Span};

use super::latency::LatencyModel;
use super::slot::{SimulatedOrder, Slot};
use crate::bus::{EventBus, TaskHandle, TimerEvent};
use crate::events::{Direction, Event, Market, PriceChange, PriceChangeBatch, Quote, Role};

/// Quotes closer than this to the resting price are not re-placed
pub const PRICE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

#[derive(Debug, Default)]
struct RoleState {
    slot: Slot,
    fill_timers: Vec<TaskHandle>,
}

impl RoleState {
    fn reset(&mut self) {
        self.slot.clear();
        for timer in self.fill_timers.drain(..) {
            timer.cancel();
        }
    }
}

pub struct SimulatedOrderManager {
    bus: EventBus,
    span: Span,
    latency: LatencyModel,
    order_size: Decimal,
    market: Option<Market>,
    yes: RoleState,
    no: RoleState,
    next_generation: u64,
}

impl SimulatedOrderManager {
    pub fn new(bus: EventBus, span: Span, latency: LatencyModel, order_size: Decimal) -> Self {
        Self {
            bus,
            span,
            latency,
            order_size,
            market: None,
            yes: RoleState::default(),
            no: RoleState::default(),
            next_generation: 1,
        }
    }

    pub fn slot(&self, role: Role) -> &Slot {
        &self.state(role).slot
    }

    /// Fill timers not yet fired or cancelled for `role`
    pub fn outstanding_fills(&self, role: Role) -> usize {
        self.state(role)
            .fill_timers
            .iter()
            .filter(|timer| !timer.is_finished())
            .count()
    }

    pub fn handle(&mut self, event: &Event) {
        let span = self.span.clone();
        let _enter = span.enter();
        match event {
            Event::QuoteIssued(quote) => self.on_quote(quote),
            Event::PriceChangeBatch(batch) => self.on_batch(batch),
            Event::MarketDiscovered(market) => {
                self.reset();
                self.market = Some(market.clone());
            }
            Event::MarketExpired { .. } => {
                self.reset();
                self.market = None;
            }
            _ => {}
        }
    }

    pub fn on_timer(&mut self, timer: TimerEvent) {
        let span = self.span.clone();
        let _enter = span.enter();
        match timer {
            TimerEvent::PlacementDue { role, generation } => self.materialize(role, generation),
            TimerEvent::FillDue { role, generation } => self.fill(role, generation),
        }
    }

    fn state(&self, role: Role) -> &RoleState {
        match role {
            Role::Yes => &self.yes,
            Role::No => &self.no,
        }
    }

    fn state_mut(&mut self, role: Role) -> &mut RoleState {
        match role {
            Role::Yes => &mut self.yes,
            Role::No => &mut self.no,
        }
    }

    fn on_quote(&mut self, quote: &Quote) {
        let active = self
            .market
            .as_ref()
            .is_some_and(|market| market.asset(quote.role) == quote.asset_id);
        if !active {
            debug!(asset_id = %quote.asset_id, "Quote outside the active market dropped");
            return;
        }

        if let Some(order) = self.slot(quote.role).resting() {
            if order.direction == quote.direction
                && (order.price - quote.price).abs() < PRICE_TOLERANCE
            {
                trace!(role = ?quote.role, price = %quote.price, "Quote matches resting order");
                return;
            }
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let delay = self.latency.sample();
        let timer = self.bus.schedule(
            delay,
            TimerEvent::PlacementDue {
                role: quote.role,
                generation,
            },
        );
        let order = SimulatedOrder {
            asset_id: quote.asset_id.clone(),
            role: quote.role,
            direction: quote.direction,
            price: quote.price,
            size: self.order_size,
            created_at: Utc::now(),
            generation,
        };

        debug!(
            role = ?quote.role,
            price = %quote.price,
            generation,
            delay = ?delay,
            "Placing simulated order"
        );

        let slot = &mut self.state_mut(quote.role).slot;
        slot.clear();
        *slot = Slot::Pending { order, timer };
    }

    fn materialize(&mut self, role: Role, generation: u64) {
        let slot = &mut self.state_mut(role).slot;
        match std::mem::take(slot) {
            Slot::Pending { mut order, .. } if order.generation == generation => {
                order.created_at = Utc::now();
                debug!(role = ?role, price = %order.price, generation, "Simulated order resting");
                *slot = Slot::Resting(order);
            }
            other => {
                trace!(role = ?role, generation, "Stale placement ignored");
                *slot = other;
            }
        }
    }

    fn on_batch(&mut self, batch: &PriceChangeBatch) {
        for change in &batch.changes {
            for role in Role::ALL {
                let Some(order) = self.slot(role).resting() else {
                    continue;
                };
                if !crosses(order, change) {
                    continue;
                }

                let generation = order.generation;
                let delay = self.latency.sample();
                let timer = self
                    .bus
                    .schedule(delay, TimerEvent::FillDue { role, generation });

                debug!(role = ?role, generation, best_ask = ?change.best_ask, "Fill condition met");

                let timers = &mut self.state_mut(role).fill_timers;
                timers.retain(|timer| !timer.is_finished());
                timers.push(timer);
            }
        }
    }

    fn fill(&mut self, role: Role, generation: u64) {
        let slot = &mut self.state_mut(role).slot;
        let fill = match slot.resting() {
            Some(order) if order.generation == generation => order.to_fill(),
            _ => {
                trace!(role = ?role, generation, "Stale fill ignored");
                return;
            }
        };
        *slot = Slot::Empty;

        debug!(role = ?role, price = %fill.price, size = %fill.size, "Simulated order filled");
        self.bus.publish(Event::OrderFilled(fill));
    }

    fn reset(&mut self) {
        self.yes.reset();
        self.no.reset();
    }
}

/// Whether `change` would execute against a resting `order`.
///
/// Only BID orders are matched: they fill once the reported best ask
/// reaches the order price.
fn crosses(order: &SimulatedOrder, change: &PriceChange) -> bool {
    if order.asset_id != change.asset_id || order.direction != Direction::Bid {
        return false;
    }
    matches!(change.best_ask, Some(best_ask) if best_ask <= order.price)
}
