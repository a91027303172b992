//! Checkout summary figures derived from a cart total.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Subtotal, sales tax and grand total, each rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl CartTotals {
    /// Mexican IVA, the rate shown on the cart page.
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

    /// Compute the summary for `subtotal` at `tax_rate` (e.g. `0.16`).
    #[must_use]
    pub fn compute(subtotal: Decimal, tax_rate: Decimal) -> Self {
        let subtotal = round_cents(subtotal);
        let tax = round_cents(subtotal.saturating_mul(tax_rate));
        Self {
            subtotal,
            tax,
            grand_total: subtotal.saturating_add(tax),
        }
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
