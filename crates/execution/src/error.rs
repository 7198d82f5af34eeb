//! Error types for wallet and supply operations.

use crate::supply::SupplyState;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures reported by the chain gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No wallet provider is installed.
    #[error("No wallet available, install a Web3 wallet")]
    WalletUnavailable,

    /// The user declined a signing or connection prompt.
    #[error("User rejected the request")]
    UserRejected,

    /// Transport or provider failure.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The transaction was mined but reverted.
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    /// No confirmation arrived in time.
    #[error("Timed out waiting for transaction confirmation")]
    Timeout,
}

/// Errors surfaced by the supply flow.
///
/// Validation variants never leave any on-chain side effect; the
/// [`SupplyError::Gateway`] variant carries the gateway's reason verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    #[error("Please connect your wallet first")]
    NoWalletConnected,

    #[error("Please enter a valid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("No pool selected")]
    NoPoolSelected,

    #[error("Cannot move supply flow from {from} to {to}")]
    InvalidTransition { from: SupplyState, to: SupplyState },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SupplyError {
    /// Whether the error was raised by local validation rather than the chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SupplyError::NoWalletConnected
                | SupplyError::InvalidAmount(_)
                | SupplyError::InsufficientBalance { .. }
        )
    }
}
