//! Cent rounding applied at every sum and multiplication boundary

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary and volume values carry two decimal places
pub const CENT_SCALE: u32 = 2;

/// Round to the next cent, away from zero (`1.001 -> 1.01`, `-1.001 -> -1.01`)
pub fn round_up_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::AwayFromZero)
}

/// Multiply, then round
pub fn mul_cents(a: Decimal, b: Decimal) -> Decimal {
    round_up_cents(a * b)
}

/// Sum, then round
pub fn sum_cents<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_up_cents(values.into_iter().sum())
}
