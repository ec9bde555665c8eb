//! Money helpers
//!
//! Amounts are `rust_decimal::Decimal` in currency units (e.g. soles) everywhere
//! inside the service. Gateways speak integer minor units; the conversion
//! happens once, here.

use anyhow::{Result, anyhow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for stored amounts
pub const CURRENCY_SCALE: u32 = 2;

/// Largest amount a price, subtotal or order total may take (`NUMERIC(10, 2)`)
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, CURRENCY_SCALE)
}

/// Whether `amount` is positive and within [`max_amount`]
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= max_amount()
}

/// Convert a currency amount to integer minor units (value x 100, half away from zero)
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| anyhow!("amount {} does not fit in minor units", amount))
}

/// Round an amount to the currency scale
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Subtotal of a line: quantity x unit price
///
/// Saturates at `Decimal::MAX`, which no storable total can reach.
pub fn line_subtotal(unit_price: Decimal, quantity: i64) -> Decimal {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .map(round_currency)
        .unwrap_or(Decimal::MAX)
}

/// Sum of amounts, saturating at `Decimal::MAX`
pub fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .unwrap_or(Decimal::MAX)
}
