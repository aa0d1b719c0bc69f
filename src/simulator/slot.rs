//! Per-role order slot
//!
//! `Empty -> Pending -> Resting -> Empty`. A new quote moves `Pending` or
//! `Resting` straight to a fresh `Pending`; expiry resets any state to `Empty`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::bus::TaskHandle;
use crate::events::{Direction, Fill, Role};

/// A simulated resting limit order
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedOrder {
    pub asset_id: String,
    pub role: Role,
    pub direction: Direction,
    pub price: Decimal,
    pub size: Decimal,
    pub created_at: DateTime<Utc>,
    /// Identity token; timers carry it and are stale once it leaves the slot
    pub generation: u64,
}

impl SimulatedOrder {
    pub fn to_fill(&self) -> Fill {
        Fill {
            asset_id: self.asset_id.clone(),
            role: self.role,
            direction: self.direction,
            price: self.price,
            size: self.size,
        }
    }
}

#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Empty,
    /// Placement in flight; only the timer and the order it will install
    Pending { order: SimulatedOrder, timer: TaskHandle },
    Resting(SimulatedOrder),
}

impl Slot {
    pub fn resting(&self) -> Option<&SimulatedOrder> {
        match self {
            Slot::Resting(order) => Some(order),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// Generation of whatever occupies the slot
    pub fn generation(&self) -> Option<u64> {
        match self {
            Slot::Empty => None,
            Slot::Pending { order, .. } | Slot::Resting(order) => Some(order.generation),
        }
    }

    /// Cancel any in-flight placement and leave the slot empty
    pub fn clear(&mut self) {
        if let Slot::Pending { timer, .. } = self {
            timer.cancel();
        }
        *self = Slot::Empty;
    }
}
