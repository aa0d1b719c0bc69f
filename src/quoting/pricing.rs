//! Reservation-price quoting math
//!
//! Micro-price from the top of book, skewed by inventory imbalance,
//! then offset by the spread margin to form a bid.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::events::{Level, Role};

/// Lowest price a quote may carry
pub const MIN_QUOTE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Highest price a quote may carry
pub const MAX_QUOTE: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Tunable quoting constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteParams {
    /// Weight of the inventory skew
    pub risk_factor: Decimal,
    /// Half-spread subtracted from the reservation price
    pub spread_margin: Decimal,
}

/// Every intermediate value of one quote computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBreakdown {
    pub spread: Decimal,
    pub mid: Decimal,
    pub micro_price: Decimal,
    pub imbalance_pct: Decimal,
    pub adjustment: Decimal,
    pub reservation_price: Decimal,
    pub bid: Decimal,
}

/// Size-weighted price between the best bid and ask.
///
/// Each price is weighted by the *opposite* side's size. Falls back to the
/// mid when neither level carries size. `None` on overflow.
pub fn micro_price(best_bid: &Level, best_ask: &Level) -> Option<Decimal> {
    let total = best_bid.size.checked_add(best_ask.size)?;
    if total.is_zero() {
        return mid_price(best_bid.price, best_ask.price);
    }
    let weighted = best_bid
        .price
        .checked_mul(best_ask.size)?
        .checked_add(best_ask.price.checked_mul(best_bid.size)?)?;
    weighted.checked_div(total)
}

fn mid_price(best_bid: Decimal, best_ask: Decimal) -> Option<Decimal> {
    best_bid.checked_add(best_ask)?.checked_div(Decimal::TWO)
}

/// `(yes - no) / (yes + no) * 100`, zero when flat
pub fn imbalance_pct(yes_qty: Decimal, no_qty: Decimal) -> Option<Decimal> {
    let total = yes_qty.checked_add(no_qty)?;
    if total.is_zero() {
        return Some(Decimal::ZERO);
    }
    yes_qty
        .checked_sub(no_qty)?
        .checked_div(total)?
        .checked_mul(HUNDRED)
}

/// Inventory skew for `role`; long YES pushes YES down and NO up
pub fn skew_adjustment(imbalance_pct: Decimal, risk_factor: Decimal, role: Role) -> Option<Decimal> {
    let adjustment = (imbalance_pct / HUNDRED).checked_mul(risk_factor)?;
    Some(match role {
        Role::Yes => adjustment,
        Role::No => -adjustment,
    })
}

/// Reservation price minus margin, rounded to the cent and clamped to [0.01, 0.99]
pub fn bid_quote(reservation_price: Decimal, spread_margin: Decimal) -> Option<Decimal> {
    let raw = reservation_price.checked_sub(spread_margin)?;
    Some(round_to_cent(raw).clamp(MIN_QUOTE, MAX_QUOTE))
}

pub fn round_to_cent(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Full quote computation for one book of the pair.
///
/// `None` when any intermediate value overflows.
pub fn compute(
    best_bid: &Level,
    best_ask: &Level,
    yes_qty: Decimal,
    no_qty: Decimal,
    role: Role,
    params: QuoteParams,
) -> Option<QuoteBreakdown> {
    let spread = best_ask.price.checked_sub(best_bid.price)?;
    let mid = mid_price(best_bid.price, best_ask.price)?;
    let micro_price = micro_price(best_bid, best_ask)?;
    let imbalance_pct = imbalance_pct(yes_qty, no_qty)?;
    let adjustment = skew_adjustment(imbalance_pct, params.risk_factor, role)?;
    let reservation_price = micro_price.checked_sub(adjustment)?;

    Some(QuoteBreakdown {
        spread,
        mid,
        micro_price,
        imbalance_pct,
        adjustment,
        reservation_price,
        bid: bid_quote(reservation_price, params.spread_margin)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> QuoteParams {
        QuoteParams {
            risk_factor: dec!(0.05),
            spread_margin: dec!(0.01),
        }
    }

    #[test]
    fn test_micro_price_weights_opposite_size() {
        let bid = Level::new(dec!(0.40), dec!(100));
        let ask = Level::new(dec!(0.45), dec!(50));
        let micro = micro_price(&bid, &ask).unwrap();
        // (0.40*50 + 0.45*100) / 150 = 0.4333...
        assert_eq!(micro.round_dp(4), dec!(0.4333));
        assert!(micro > dec!(0.4333) && micro < dec!(0.4334));
    }

    #[test]
    fn test_micro_price_without_size_is_mid() {
        let bid = Level::new(dec!(0.40), dec!(0));
        let ask = Level::new(dec!(0.46), dec!(0));
        assert_eq!(micro_price(&bid, &ask), Some(dec!(0.43)));
    }

    #[test]
    fn test_imbalance() {
        assert_eq!(imbalance_pct(dec!(2400), dec!(2600)), Some(dec!(-4)));
        assert_eq!(imbalance_pct(dec!(0), dec!(0)), Some(dec!(0)));
        assert_eq!(imbalance_pct(dec!(10), dec!(0)), Some(dec!(100)));
    }

    #[test]
    fn test_reservation_price_yes_role() {
        let adjustment = skew_adjustment(dec!(-4), dec!(0.05), Role::Yes).unwrap();
        assert_eq!(adjustment, dec!(-0.002));
        assert_eq!(dec!(0.50) - adjustment, dec!(0.502));
    }

    #[test]
    fn test_adjustment_sign_flips_for_no_role() {
        let yes = skew_adjustment(dec!(20), dec!(0.05), Role::Yes);
        let no = skew_adjustment(dec!(20), dec!(0.05), Role::No);
        assert_eq!(yes, Some(dec!(0.01)));
        assert_eq!(no, Some(dec!(-0.01)));
    }

    #[test]
    fn test_quote_clamps_low() {
        assert_eq!(bid_quote(dec!(0.005), dec!(0.01)), Some(dec!(0.01)));
    }

    #[test]
    fn test_quote_clamps_high() {
        assert_eq!(bid_quote(dec!(1.20), dec!(0.01)), Some(dec!(0.99)));
    }

    #[test]
    fn test_quote_rounds_to_cent() {
        assert_eq!(bid_quote(dec!(0.502), dec!(0.01)), Some(dec!(0.49)));
        assert_eq!(bid_quote(dec!(0.4433), dec!(0.01)), Some(dec!(0.43)));
        assert_eq!(round_to_cent(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_compute_flat_inventory() {
        let bid = Level::new(dec!(0.40), dec!(100));
        let ask = Level::new(dec!(0.45), dec!(50));
        let quote = compute(&bid, &ask, dec!(0), dec!(0), Role::Yes, params()).unwrap();

        assert_eq!(quote.spread, dec!(0.05));
        assert_eq!(quote.mid, dec!(0.425));
        assert_eq!(quote.adjustment, dec!(0));
        assert_eq!(quote.reservation_price, quote.micro_price);
        // 0.4333 - 0.01 = 0.4233 -> 0.42
        assert_eq!(quote.bid, dec!(0.42));
    }

    #[test]
    fn test_compute_long_yes_lowers_yes_bid() {
        let bid = Level::new(dec!(0.50), dec!(100));
        let ask = Level::new(dec!(0.52), dec!(100));
        let flat = compute(&bid, &ask, dec!(0), dec!(0), Role::Yes, params()).unwrap();
        let long = compute(&bid, &ask, dec!(100), dec!(0), Role::Yes, params()).unwrap();
        let hedge = compute(&bid, &ask, dec!(100), dec!(0), Role::No, params()).unwrap();

        assert_eq!(flat.bid, dec!(0.50));
        assert_eq!(long.bid, dec!(0.45));
        assert_eq!(hedge.bid, dec!(0.55));
    }

    #[test]
    fn test_huge_sizes_do_not_panic() {
        let bid = Level::new(dec!(0.50), dec!(50000000000000000000000000000));
        let ask = Level::new(dec!(0.52), dec!(50000000000000000000000000000));
        assert_eq!(micro_price(&bid, &ask), None);
        assert!(compute(&bid, &ask, dec!(0), dec!(0), Role::Yes, params()).is_none());
    }

    #[test]
    fn test_huge_inventory_does_not_panic() {
        let max = Decimal::MAX;
        assert_eq!(imbalance_pct(max, max), None);
    }
}
