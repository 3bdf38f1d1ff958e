//! Decimal helpers shared by the schedule generator and the allocator.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Installment amounts are floored to a multiple of this many currency units.
pub const ROUNDING_UNIT: Decimal = dec!(100);

/// Two amounts closer than this are the same payment.
pub const PAYOFF_TOLERANCE: Decimal = dec!(0.01);

/// Interest-only balances below one currency unit are written off as paid.
pub const ROLL_FORWARD_THRESHOLD: Decimal = dec!(1);

/// Totals are carried at cent precision.
pub const MONEY_DP: u32 = 2;

/// 10 (percent) -> 0.10
pub fn percent_to_rate(percent: Decimal) -> Rate {
    percent / dec!(100)
}

/// Floor `amount` down to the nearest multiple of [`ROUNDING_UNIT`].
pub fn floor_to_unit(amount: Money) -> Money {
    (amount / ROUNDING_UNIT).floor() * ROUNDING_UNIT
}

pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Flat interest `base * rate * months` rounded to cents. `None` when the
/// interest, or `base` plus the interest, leaves the decimal range.
pub fn checked_flat_interest(base: Money, rate: Rate, months: Decimal) -> Option<Money> {
    let interest = round_money(base.checked_mul(rate)?.checked_mul(months)?);
    base.checked_add(interest)?;
    Some(interest)
}

pub fn clamp_non_negative(amount: Money) -> Money {
    amount.max(Decimal::ZERO)
}

pub fn approx_eq(a: Money, b: Money) -> bool {
    (a - b).abs() < PAYOFF_TOLERANCE
}
