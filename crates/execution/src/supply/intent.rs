//! Transient supply request.

use lendbook_domain::{Amount, Pool};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Pool and amount the user is about to supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyIntent {
    /// Target pool.
    pub pool: Pool,
    /// Amount as entered or displayed.
    pub amount: String,
    /// Exact amount to execute when it differs from the displayed one.
    exact: Option<Amount>,
}

impl SupplyIntent {
    /// Creates an intent with an empty amount.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            amount: String::new(),
            exact: None,
        }
    }

    /// Replaces the amount with user input.
    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.exact = None;
    }

    /// Uses the whole balance.
    ///
    /// The displayed amount is rounded to two fraction digits; execution uses
    /// `balance` at full precision.
    pub fn set_max(&mut self, balance: Decimal, decimals: u8) {
        let mut shown = balance.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        shown.rescale(2);
        self.amount = shown.to_string();
        self.exact = Amount::from_decimal(balance, decimals).ok();
    }

    /// Whether the intent executes the full-precision balance.
    pub fn uses_max(&self) -> bool {
        self.exact.is_some()
    }

    /// Amount that will be sent on-chain.
    pub fn execution_amount(&self, decimals: u8) -> Result<Amount, lendbook_domain::AmountError> {
        match self.exact {
            Some(amount) => Ok(amount),
            None => Amount::parse(&self.amount, decimals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendbook_domain::registry;
    use primitive_types::U256;
    use rust_decimal_macros::dec;

    fn intent() -> SupplyIntent {
        SupplyIntent::new(registry::default_pools().remove(0))
    }

    #[test]
    fn test_max_uses_full_precision() {
        let mut intent = intent();
        intent.set_max(dec!(499.996789), 6);

        assert_eq!(intent.amount, "500.00");
        assert!(intent.uses_max());
        assert_eq!(
            intent.execution_amount(6).unwrap().raw,
            U256::from(499_996_789u64)
        );
    }

    #[test]
    fn test_typing_clears_max() {
        let mut intent = intent();
        intent.set_max(dec!(10), 6);
        intent.set_amount("2.5");

        assert!(!intent.uses_max());
        assert_eq!(intent.execution_amount(6).unwrap().raw, U256::from(2_500_000u64));
    }
}
