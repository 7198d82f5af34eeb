use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction digits kept for the loan token balance.
pub const BALANCE_DECIMALS: u32 = 6;

/// Connected wallet state shared by the catalog (read only) and the supply flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletSession {
    pub address: Option<String>,
    pub connected: bool,
    /// Loan token balance.
    pub balance: Decimal,
}

impl WalletSession {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            connected: true,
            balance: Decimal::ZERO,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.address.is_some()
    }

    pub fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance.round_dp(BALANCE_DECIMALS);
    }

    /// Disconnects and forgets the balance.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `0x1234...abcd` form used in the header button.
    pub fn short_address(&self) -> Option<String> {
        let address = self.address.as_deref()?;
        if address.len() <= 10 || !address.is_ascii() {
            return Some(address.to_string());
        }
        Some(format!(
            "{}...{}",
            &address[..6],
            &address[address.len() - 4..]
        ))
    }
}
