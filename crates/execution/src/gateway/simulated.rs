//! In-memory chain used by the CLI demo and the tests.

use super::{ChainGateway, SupplyCall, TokenBalance, TxHandle, TxKind, TxReceipt};
use crate::error::GatewayError;
use async_trait::async_trait;
use primitive_types::U256;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

/// Point at which a scripted failure is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `request_accounts`.
    RequestAccounts,
    /// `get_token_balance`.
    Balance,
    /// Submission of an approval.
    Approve,
    /// Confirmation of an approval.
    ApproveConfirmation,
    /// Submission of a deposit.
    Supply,
    /// Confirmation of a deposit.
    SupplyConfirmation,
}

/// A call received by the simulated gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    RequestAccounts,
    GetAccounts,
    GetTokenBalance { token: String, owner: String },
    Approve { token: String, spender: String, amount: U256 },
    Supply(SupplyCall),
    AwaitConfirmation { hash: String, kind: TxKind },
}

/// Configuration for the simulated gateway.
#[derive(Debug, Clone)]
pub struct SimulatedGatewayConfig {
    /// Whether a wallet provider is present at all.
    pub wallet_available: bool,
    /// Delay before a transaction is reported as mined.
    pub confirmation_delay_ms: u64,
}

impl Default for SimulatedGatewayConfig {
    fn default() -> Self {
        Self {
            wallet_available: true,
            confirmation_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct MinedTx {
    block_number: u64,
    outcome: Result<(), GatewayError>,
}

#[derive(Debug, Default)]
struct ChainState {
    /// Accounts the wallet holds, first is selected.
    wallet_accounts: Vec<String>,
    /// Whether the dapp has been granted account access.
    authorized: bool,
    decimals: HashMap<String, u8>,
    balances: HashMap<(String, String), U256>,
    /// Keyed by (token, owner, spender).
    allowances: HashMap<(String, String, String), U256>,
    /// Pool contract to the token it accepts.
    pool_tokens: HashMap<String, String>,
    /// Keyed by (pool, market id, owner).
    deposits: HashMap<(String, u64, String), U256>,
    mined: HashMap<String, MinedTx>,
    failures: HashMap<FailurePoint, VecDeque<GatewayError>>,
    calls: Vec<GatewayCall>,
    block_number: u64,
    nonce: u64,
}

impl ChainState {
    fn take_failure(&mut self, point: FailurePoint) -> Option<GatewayError> {
        self.failures.get_mut(&point).and_then(VecDeque::pop_front)
    }

    fn selected_account(&self) -> Result<String, GatewayError> {
        if !self.authorized {
            return Err(GatewayError::Gateway("account not authorized".to_string()));
        }
        self.wallet_accounts
            .first()
            .cloned()
            .ok_or_else(|| GatewayError::Gateway("no account selected".to_string()))
    }

    fn next_hash(&mut self) -> String {
        self.nonce += 1;
        format!("0x{:064x}", self.nonce)
    }

    fn mine(&mut self, hash: &str, outcome: Result<(), GatewayError>) {
        self.block_number += 1;
        self.mined.insert(
            hash.to_string(),
            MinedTx {
                block_number: self.block_number,
                outcome,
            },
        );
    }

    fn balance(&self, token: &str, owner: &str) -> U256 {
        self.balances
            .get(&(token.to_string(), owner.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn execute_supply(&mut self, owner: &str, call: &SupplyCall) -> Result<(), GatewayError> {
        let token = self
            .pool_tokens
            .get(&call.pool)
            .cloned()
            .ok_or_else(|| GatewayError::TransactionReverted("unknown market".to_string()))?;

        let allowance_key = (token.clone(), owner.to_string(), call.pool.clone());
        let allowance = self
            .allowances
            .get(&allowance_key)
            .copied()
            .unwrap_or_default();
        if allowance < call.assets {
            return Err(GatewayError::TransactionReverted(
                "transfer amount exceeds allowance".to_string(),
            ));
        }

        let balance = self.balance(&token, owner);
        if balance < call.assets {
            return Err(GatewayError::TransactionReverted(
                "transfer amount exceeds balance".to_string(),
            ));
        }

        self.allowances
            .insert(allowance_key, allowance - call.assets);
        self.balances
            .insert((token, owner.to_string()), balance - call.assets);
        *self
            .deposits
            .entry((call.pool.clone(), call.pool_id, call.on_behalf.clone()))
            .or_default() += call.assets;
        Ok(())
    }
}

/// In-memory [`ChainGateway`].
///
/// Transactions take effect when they are submitted, as on a real chain
/// where a sent transaction lands whether or not anyone waits for it;
/// `await_confirmation` only reports the stored outcome after the
/// configured delay.
pub struct SimulatedGateway {
    config: SimulatedGatewayConfig,
    state: RwLock<ChainState>,
    accounts_tx: broadcast::Sender<Vec<String>>,
}

impl SimulatedGateway {
    /// Creates an empty simulated chain.
    pub fn new(config: SimulatedGatewayConfig) -> Self {
        let (accounts_tx, _) = broadcast::channel(16);
        Self {
            config,
            state: RwLock::new(ChainState::default()),
            accounts_tx,
        }
    }

    /// Registers a token and its decimals.
    pub async fn add_token(&self, token: &str, decimals: u8) {
        self.state
            .write()
            .await
            .decimals
            .insert(token.to_string(), decimals);
    }

    /// Registers a pool contract accepting `token`.
    pub async fn add_pool(&self, pool: &str, token: &str) {
        self.state
            .write()
            .await
            .pool_tokens
            .insert(pool.to_string(), token.to_string());
    }

    /// Sets the accounts held by the wallet without notifying listeners.
    pub async fn set_wallet_accounts(&self, accounts: Vec<String>) {
        self.state.write().await.wallet_accounts = accounts;
    }

    /// Grants account access as if the user had connected earlier.
    pub async fn authorize(&self) {
        self.state.write().await.authorized = true;
    }

    /// Switches the wallet's accounts and notifies listeners.
    pub async fn switch_accounts(&self, accounts: Vec<String>) {
        let visible = {
            let mut state = self.state.write().await;
            state.wallet_accounts = accounts;
            if state.authorized {
                state.wallet_accounts.clone()
            } else {
                Vec::new()
            }
        };
        info!(accounts = visible.len(), "Simulated wallet accounts changed");
        let _ = self.accounts_tx.send(visible);
    }

    /// Sets a raw token balance.
    pub async fn set_balance(&self, token: &str, owner: &str, raw: U256) {
        self.state
            .write()
            .await
            .balances
            .insert((token.to_string(), owner.to_string()), raw);
    }

    /// Raw token balance.
    pub async fn balance_of(&self, token: &str, owner: &str) -> U256 {
        self.state.read().await.balance(token, owner)
    }

    /// Remaining allowance of `spender` over `owner`'s `token`.
    pub async fn allowance(&self, token: &str, owner: &str, spender: &str) -> U256 {
        self.state
            .read()
            .await
            .allowances
            .get(&(token.to_string(), owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Assets deposited by `owner` into a market.
    pub async fn deposit_of(&self, pool: &str, pool_id: u64, owner: &str) -> U256 {
        self.state
            .read()
            .await
            .deposits
            .get(&(pool.to_string(), pool_id, owner.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Queues a failure for the next call at `point`.
    pub async fn fail_next(&self, point: FailurePoint, error: GatewayError) {
        self.state
            .write()
            .await
            .failures
            .entry(point)
            .or_default()
            .push_back(error);
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    fn ensure_wallet(&self) -> Result<(), GatewayError> {
        if self.config.wallet_available {
            Ok(())
        } else {
            Err(GatewayError::WalletUnavailable)
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(SimulatedGatewayConfig::default())
    }
}

#[async_trait]
impl ChainGateway for SimulatedGateway {
    async fn request_accounts(&self) -> Result<String, GatewayError> {
        self.ensure_wallet()?;
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::RequestAccounts);

        if let Some(err) = state.take_failure(FailurePoint::RequestAccounts) {
            return Err(err);
        }
        state.authorized = true;
        state.selected_account()
    }

    async fn get_accounts(&self) -> Result<Vec<String>, GatewayError> {
        self.ensure_wallet()?;
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::GetAccounts);

        if state.authorized {
            Ok(state.wallet_accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    fn accounts_changed(&self) -> broadcast::Receiver<Vec<String>> {
        self.accounts_tx.subscribe()
    }

    async fn get_token_balance(
        &self,
        token: &str,
        owner: &str,
    ) -> Result<TokenBalance, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::GetTokenBalance {
            token: token.to_string(),
            owner: owner.to_string(),
        });

        if let Some(err) = state.take_failure(FailurePoint::Balance) {
            return Err(err);
        }
        let decimals = *state
            .decimals
            .get(token)
            .ok_or_else(|| GatewayError::Gateway(format!("unknown token {token}")))?;
        Ok(TokenBalance {
            raw: state.balance(token, owner),
            decimals,
        })
    }

    async fn approve(
        &self,
        token: &str,
        spender: &str,
        amount: U256,
    ) -> Result<TxHandle, GatewayError> {
        self.ensure_wallet()?;
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::Approve {
            token: token.to_string(),
            spender: spender.to_string(),
            amount,
        });

        if let Some(err) = state.take_failure(FailurePoint::Approve) {
            return Err(err);
        }
        let owner = state.selected_account()?;
        let hash = state.next_hash();

        let outcome = match state.take_failure(FailurePoint::ApproveConfirmation) {
            Some(err) => Err(err),
            None => {
                state
                    .allowances
                    .insert((token.to_string(), owner, spender.to_string()), amount);
                Ok(())
            }
        };
        state.mine(&hash, outcome);

        debug!(hash = %hash, spender = spender, amount = %amount, "Simulated approval sent");
        Ok(TxHandle {
            hash,
            kind: TxKind::Approve,
        })
    }

    async fn supply(&self, call: SupplyCall) -> Result<TxHandle, GatewayError> {
        self.ensure_wallet()?;
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::Supply(call.clone()));

        if let Some(err) = state.take_failure(FailurePoint::Supply) {
            return Err(err);
        }
        let owner = state.selected_account()?;
        let hash = state.next_hash();

        let outcome = match state.take_failure(FailurePoint::SupplyConfirmation) {
            Some(err) => Err(err),
            None => state.execute_supply(&owner, &call),
        };
        state.mine(&hash, outcome);

        debug!(hash = %hash, pool = %call.pool, assets = %call.assets, "Simulated supply sent");
        Ok(TxHandle {
            hash,
            kind: TxKind::Supply,
        })
    }

    async fn await_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt, GatewayError> {
        self.state
            .write()
            .await
            .calls
            .push(GatewayCall::AwaitConfirmation {
                hash: tx.hash.clone(),
                kind: tx.kind,
            });

        if self.config.confirmation_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.confirmation_delay_ms)).await;
        }

        let mined = self
            .state
            .read()
            .await
            .mined
            .get(&tx.hash)
            .cloned()
            .ok_or_else(|| GatewayError::Gateway(format!("unknown transaction {}", tx.hash)))?;

        mined.outcome.map(|()| TxReceipt {
            hash: tx.hash.clone(),
            block_number: mined.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0xtoken";
    const POOL: &str = "0xpool";
    const ALICE: &str = "0xalice";

    async fn gateway() -> SimulatedGateway {
        let gw = SimulatedGateway::default();
        gw.add_token(TOKEN, 6).await;
        gw.add_pool(POOL, TOKEN).await;
        gw.set_wallet_accounts(vec![ALICE.to_string()]).await;
        gw.set_balance(TOKEN, ALICE, U256::from(1_000_000u64)).await;
        gw
    }

    fn supply_call(assets: u64) -> SupplyCall {
        SupplyCall {
            pool: POOL.to_string(),
            pool_id: 1,
            assets: U256::from(assets),
            shares: U256::zero(),
            on_behalf: ALICE.to_string(),
            data: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_accounts_require_authorization() {
        let gw = gateway().await;
        assert!(gw.get_accounts().await.unwrap().is_empty());

        assert_eq!(gw.request_accounts().await.unwrap(), ALICE);
        assert_eq!(gw.get_accounts().await.unwrap(), vec![ALICE.to_string()]);
    }

    #[tokio::test]
    async fn test_wallet_unavailable() {
        let gw = SimulatedGateway::new(SimulatedGatewayConfig {
            wallet_available: false,
            ..Default::default()
        });
        assert_eq!(
            gw.request_accounts().await,
            Err(GatewayError::WalletUnavailable)
        );
    }

    #[tokio::test]
    async fn test_approve_then_supply_moves_funds() {
        let gw = gateway().await;
        gw.request_accounts().await.unwrap();

        let approve = gw.approve(TOKEN, POOL, U256::from(400_000u64)).await.unwrap();
        gw.await_confirmation(&approve).await.unwrap();
        assert_eq!(gw.allowance(TOKEN, ALICE, POOL).await, U256::from(400_000u64));

        let supply = gw.supply(supply_call(400_000)).await.unwrap();
        let receipt = gw.await_confirmation(&supply).await.unwrap();
        assert!(receipt.block_number > 1);

        assert_eq!(gw.balance_of(TOKEN, ALICE).await, U256::from(600_000u64));
        assert_eq!(gw.deposit_of(POOL, 1, ALICE).await, U256::from(400_000u64));
        assert!(gw.allowance(TOKEN, ALICE, POOL).await.is_zero());
    }

    #[tokio::test]
    async fn test_supply_without_allowance_reverts() {
        let gw = gateway().await;
        gw.request_accounts().await.unwrap();

        let supply = gw.supply(supply_call(10)).await.unwrap();
        assert!(matches!(
            gw.await_confirmation(&supply).await,
            Err(GatewayError::TransactionReverted(_))
        ));
        assert_eq!(gw.balance_of(TOKEN, ALICE).await, U256::from(1_000_000u64));
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_once() {
        let gw = gateway().await;
        gw.request_accounts().await.unwrap();
        gw.fail_next(FailurePoint::Approve, GatewayError::UserRejected)
            .await;

        assert_eq!(
            gw.approve(TOKEN, POOL, U256::one()).await,
            Err(GatewayError::UserRejected)
        );
        assert!(gw.approve(TOKEN, POOL, U256::one()).await.is_ok());
    }

    #[tokio::test]
    async fn test_switch_accounts_notifies() {
        let gw = gateway().await;
        gw.authorize().await;
        let mut rx = gw.accounts_changed();

        gw.switch_accounts(Vec::new()).await;
        assert!(rx.recv().await.unwrap().is_empty());
    }
}
