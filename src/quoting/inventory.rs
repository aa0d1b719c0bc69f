//! Per-role inventory ledger

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::events::{PnlSummary, Role};

/// Quantity held and its volume-weighted average cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub quantity: Decimal,
    pub avg_cost: Decimal,
}

impl Position {
    /// Capital tied up in this position
    pub fn invested(&self) -> Decimal {
        self.quantity.saturating_mul(self.avg_cost)
    }

    /// Position after buying `size` at `price`, `None` on overflow
    fn after_buy(&self, size: Decimal, price: Decimal) -> Option<Self> {
        let quantity = self.quantity.checked_add(size)?;
        let avg_cost = if quantity.is_zero() {
            Decimal::ZERO
        } else {
            let cost = self
                .quantity
                .checked_mul(self.avg_cost)?
                .checked_add(size.checked_mul(price)?)?;
            cost.checked_div(quantity)?
        };
        Some(Self { quantity, avg_cost })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inventory {
    yes: Position,
    no: Position,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, role: Role) -> &Position {
        match role {
            Role::Yes => &self.yes,
            Role::No => &self.no,
        }
    }

    /// Record a confirmed buy of `size` at `price`.
    ///
    /// The position is left untouched when the new totals overflow.
    pub fn record_buy(&mut self, role: Role, size: Decimal, price: Decimal) -> Result<()> {
        let position = match role {
            Role::Yes => &mut self.yes,
            Role::No => &mut self.no,
        };
        *position = position
            .after_buy(size, price)
            .ok_or(EngineError::Overflow("inventory position"))?;
        Ok(())
    }

    pub fn summary(&self, slug: &str) -> PnlSummary {
        let yes_invested = self.yes.invested();
        let no_invested = self.no.invested();
        PnlSummary {
            slug: slug.to_string(),
            yes_qty: self.yes.quantity,
            no_qty: self.no.quantity,
            yes_invested,
            no_invested,
            total_invested: yes_invested.saturating_add(no_invested),
            theoretical_payout: self.yes.quantity.max(self.no.quantity),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
