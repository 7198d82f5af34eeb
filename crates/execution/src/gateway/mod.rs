//! Chain gateway abstraction.
//!
//! The gateway fronts the user's wallet and the chain:
//! - Account discovery and change notifications
//! - Token balance reads
//! - Approval and supply transactions
//! - Confirmation tracking

mod simulated;

pub use simulated::*;

use crate::error::GatewayError;
use async_trait::async_trait;
use lendbook_domain::Amount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Kind of transaction sent through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// ERC-20 allowance grant.
    Approve,
    /// Pool deposit.
    Supply,
}

/// Handle of a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle {
    /// Transaction hash.
    pub hash: String,
    /// What the transaction does.
    pub kind: TxKind,
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub hash: String,
    /// Block the transaction was included in.
    pub block_number: u64,
}

/// Raw token balance as reported on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Balance in the token's smallest unit.
    pub raw: U256,
    /// Token decimals.
    pub decimals: u8,
}

impl TokenBalance {
    /// Converts into a domain amount.
    pub fn to_amount(&self) -> Amount {
        Amount::new(self.raw, self.decimals)
    }
}

/// Arguments of the pool's `supply(id, assets, shares, onBehalf, data)` entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyCall {
    /// Pool contract address.
    pub pool: String,
    /// Market id inside the pool contract.
    pub pool_id: u64,
    /// Assets to deposit, in raw units.
    pub assets: U256,
    /// Shares to mint; zero lets the pool derive shares from `assets`.
    pub shares: U256,
    /// Account credited with the position.
    pub on_behalf: String,
    /// Auxiliary callback data.
    pub data: Vec<u8>,
}

/// Wallet and chain operations consumed by the dashboard core.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Prompts the wallet for account access and returns the selected account.
    async fn request_accounts(&self) -> Result<String, GatewayError>;

    /// Lists already authorized accounts without prompting.
    async fn get_accounts(&self) -> Result<Vec<String>, GatewayError>;

    /// Subscribes to account changes; an empty list means disconnection.
    fn accounts_changed(&self) -> broadcast::Receiver<Vec<String>>;

    /// Reads `owner`'s balance of `token`.
    async fn get_token_balance(&self, token: &str, owner: &str)
    -> Result<TokenBalance, GatewayError>;

    /// Sends an allowance grant of exactly `amount` to `spender`.
    async fn approve(
        &self,
        token: &str,
        spender: &str,
        amount: U256,
    ) -> Result<TxHandle, GatewayError>;

    /// Sends a pool deposit.
    async fn supply(&self, call: SupplyCall) -> Result<TxHandle, GatewayError>;

    /// Waits until the transaction is mined.
    async fn await_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt, GatewayError>;
}
