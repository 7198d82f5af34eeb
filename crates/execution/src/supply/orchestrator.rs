//! Supply orchestrator driving the two-phase deposit.

use super::{SupplyIntent, SupplyState};
use crate::config::SupplyConfig;
use crate::error::{GatewayError, SupplyError};
use crate::gateway::{ChainGateway, SupplyCall, TxHandle, TxReceipt};
use crate::lifecycle::{SupplyEvent, SupplyTracker};
use crate::wallet::WalletManager;
use lendbook_domain::{Amount, Pool};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of a confirmed deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyReceipt {
    /// Pool market id.
    pub pool_id: u64,
    /// Pool name.
    pub pool_name: String,
    /// Amount supplied.
    pub amount: Decimal,
    /// Approval transaction hash.
    pub approval_tx: String,
    /// Deposit transaction hash.
    pub supply_tx: String,
    /// Wallet balance read after the deposit confirmed.
    pub balance_after: Decimal,
}

/// Validated submission ready for execution.
struct ValidatedSupply {
    owner: String,
    amount: Amount,
    display: Decimal,
}

/// Drives the supply state machine against the chain gateway.
///
/// Every operation takes `&mut self`, so a flow can have at most one phase in
/// flight. Dropping a [`SupplyOrchestrator::submit`] future does not recall a
/// transaction already sent; [`SupplyOrchestrator::cancel`] reconciles the
/// balance in that case.
pub struct SupplyOrchestrator {
    /// Chain gateway.
    gateway: Arc<dyn ChainGateway>,
    /// Wallet session owner.
    wallet: Arc<WalletManager>,
    /// Configuration.
    config: SupplyConfig,
    /// Supply history.
    tracker: Arc<SupplyTracker>,
    /// Progress event sender.
    events: broadcast::Sender<SupplyEvent>,
    /// Current state.
    state: SupplyState,
    /// Current request.
    intent: Option<SupplyIntent>,
    /// Current flow id.
    flow_id: Uuid,
    /// Pool of the current flow, kept for events after the intent is cleared.
    pool_id: u64,
    /// Error of the last failed submission.
    last_error: Option<SupplyError>,
    /// Receipt of the last completed deposit.
    last_receipt: Option<SupplyReceipt>,
}

impl SupplyOrchestrator {
    /// Creates an idle orchestrator.
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        wallet: Arc<WalletManager>,
        config: SupplyConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            gateway,
            wallet,
            config,
            tracker: Arc::new(SupplyTracker::new()),
            events,
            state: SupplyState::Idle,
            intent: None,
            flow_id: Uuid::nil(),
            pool_id: 0,
            last_error: None,
            last_receipt: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SupplyState {
        self.state
    }

    /// Current request, if a pool is selected.
    pub fn intent(&self) -> Option<&SupplyIntent> {
        self.intent.as_ref()
    }

    /// Error of the last failed submission.
    pub fn last_error(&self) -> Option<&SupplyError> {
        self.last_error.as_ref()
    }

    /// Receipt of the last completed deposit.
    pub fn last_receipt(&self) -> Option<&SupplyReceipt> {
        self.last_receipt.as_ref()
    }

    /// Supply history.
    pub fn tracker(&self) -> &Arc<SupplyTracker> {
        &self.tracker
    }

    /// Subscribes to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<SupplyEvent> {
        self.events.subscribe()
    }

    /// Opens the supply flow for `pool`.
    ///
    /// Selecting another pool while one is selected starts a new flow.
    ///
    /// # Errors
    /// [`SupplyError::NoWalletConnected`] without a wallet session, or
    /// [`SupplyError::InvalidTransition`] while a flow is past selection.
    pub async fn select(&mut self, pool: Pool) -> Result<(), SupplyError> {
        if !matches!(self.state, SupplyState::Idle | SupplyState::Selected) {
            return Err(SupplyError::InvalidTransition {
                from: self.state,
                to: SupplyState::Selected,
            });
        }
        if !self.wallet.session().await.is_connected() {
            warn!(pool = %pool.name, "Supply requested without a connected wallet");
            return Err(SupplyError::NoWalletConnected);
        }

        if self.state == SupplyState::Selected {
            self.transition(SupplyState::Idle, "Switching pool").await?;
        }

        self.flow_id = Uuid::new_v4();
        self.pool_id = pool.id;
        self.last_error = None;
        let message = format!("Supply {} to {}", pool.loan_token, pool.name);
        self.intent = Some(SupplyIntent::new(pool));
        self.transition(SupplyState::Selected, message).await
    }

    /// Replaces the entered amount.
    ///
    /// # Errors
    /// [`SupplyError::NoPoolSelected`] outside the selected state.
    pub fn set_amount(&mut self, amount: impl Into<String>) -> Result<(), SupplyError> {
        self.selected_intent()?.set_amount(amount);
        Ok(())
    }

    /// Fills in the whole wallet balance and returns the displayed amount.
    ///
    /// # Errors
    /// [`SupplyError::NoPoolSelected`] outside the selected state.
    pub async fn set_max_amount(&mut self) -> Result<String, SupplyError> {
        let balance = self.wallet.session().await.balance;
        let decimals = self.config.loan_token.decimals;
        let intent = self.selected_intent()?;
        intent.set_max(balance, decimals);
        Ok(intent.amount.clone())
    }

    /// Validates the entered amount and runs approval then deposit.
    ///
    /// On any failure the flow returns to [`SupplyState::Selected`] so the user
    /// can retry; a retry always starts again with the approval.
    ///
    /// # Errors
    /// Validation errors before any transaction is sent, or the gateway's
    /// failure of either phase.
    pub async fn submit(&mut self) -> Result<SupplyReceipt, SupplyError> {
        if self.state != SupplyState::Selected {
            return Err(if self.intent.is_none() {
                SupplyError::NoPoolSelected
            } else {
                SupplyError::InvalidTransition {
                    from: self.state,
                    to: SupplyState::Validating,
                }
            });
        }
        let intent = self.intent.clone().ok_or(SupplyError::NoPoolSelected)?;
        self.last_error = None;

        self.transition(SupplyState::Validating, "Validating amount")
            .await?;
        let validated = match self.validate(&intent).await {
            Ok(validated) => validated,
            Err(e) => {
                warn!(pool = %intent.pool.name, error = %e, "Supply rejected");
                self.transition(SupplyState::Rejected, e.to_string()).await?;
                self.transition(SupplyState::Selected, "Enter a new amount")
                    .await?;
                self.last_error = Some(e.clone());
                return Err(e);
            }
        };

        let pool = &intent.pool;
        info!(
            pool = %pool.name,
            pool_id = pool.id,
            amount = %validated.display,
            max = intent.uses_max(),
            "Executing supply"
        );

        // Phase 1: allowance for exactly the supplied amount.
        self.emit(
            SupplyEvent::new(
                self.flow_id,
                pool.id,
                SupplyState::Validating,
                SupplyState::Approving,
                format!(
                    "Please approve {} spending in your wallet...",
                    self.config.loan_token.symbol
                ),
            )
            .with_amount(validated.display),
        )
        .await?;
        let approval = match self.run_approval(pool, &validated).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.fail("approval", e).await),
        };
        self.emit(
            SupplyEvent::new(
                self.flow_id,
                pool.id,
                SupplyState::Approving,
                SupplyState::Approved,
                "Approval successful! Now supplying to pool...",
            )
            .with_amount(validated.display)
            .with_tx_hash(approval.hash.clone()),
        )
        .await?;

        // Phase 2: deposit, entered only after the approval confirmed.
        self.emit(
            SupplyEvent::new(
                self.flow_id,
                pool.id,
                SupplyState::Approved,
                SupplyState::Supplying,
                format!("Supplying to {}...", pool.name),
            )
            .with_amount(validated.display),
        )
        .await?;
        let deposit = match self.run_deposit(pool, &validated).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.fail("supply", e).await),
        };

        // Balance is read only after the deposit is mined.
        let balance_after = self.wallet.refresh_balance().await;

        let receipt = SupplyReceipt {
            pool_id: pool.id,
            pool_name: pool.name.clone(),
            amount: validated.display,
            approval_tx: approval.hash,
            supply_tx: deposit.hash.clone(),
            balance_after,
        };
        self.emit(
            SupplyEvent::new(
                self.flow_id,
                pool.id,
                SupplyState::Supplying,
                SupplyState::Completed,
                format!(
                    "Successfully supplied {} {} to {}!",
                    validated.display, pool.loan_token, pool.name
                ),
            )
            .with_amount(validated.display)
            .with_tx_hash(deposit.hash),
        )
        .await?;

        self.intent = None;
        self.last_receipt = Some(receipt.clone());
        Ok(receipt)
    }

    /// Closes a completed flow.
    ///
    /// # Errors
    /// [`SupplyError::InvalidTransition`] unless the flow is completed.
    pub async fn close(&mut self) -> Result<(), SupplyError> {
        if self.state != SupplyState::Completed {
            return Err(SupplyError::InvalidTransition {
                from: self.state,
                to: SupplyState::Idle,
            });
        }
        self.intent = None;
        self.transition(SupplyState::Idle, "Supply closed").await
    }

    /// Abandons the flow from any state.
    ///
    /// When a phase was in flight the balance is refreshed, since the sent
    /// transaction may still be mined.
    pub async fn cancel(&mut self) {
        if self.state == SupplyState::Idle {
            return;
        }
        let in_flight = self.state.is_in_flight();
        self.intent = None;
        if let Err(e) = self.transition(SupplyState::Idle, "Supply cancelled").await {
            error!(error = %e, "Cancel transition refused");
            self.state = SupplyState::Idle;
        }

        if in_flight {
            warn!(
                flow = %self.flow_id,
                "Supply cancelled with a transaction pending, reconciling balance"
            );
            self.wallet.refresh_balance().await;
        }
    }

    /// Checks wallet, amount and balance, in that order.
    async fn validate(&self, intent: &SupplyIntent) -> Result<ValidatedSupply, SupplyError> {
        let session = self.wallet.session().await;
        let owner = match session.address.clone() {
            Some(owner) if session.is_connected() => owner,
            _ => return Err(SupplyError::NoWalletConnected),
        };

        let decimals = self.config.loan_token.decimals;
        let amount = intent
            .execution_amount(decimals)
            .map_err(|e| SupplyError::InvalidAmount(e.to_string()))?;
        if amount.is_zero() {
            return Err(SupplyError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        // Compared in raw units so inputs beyond the decimal range still
        // report the shortfall.
        let available =
            Amount::from_decimal(session.balance, decimals).unwrap_or(Amount::zero(decimals));
        if amount.raw > available.raw {
            return Err(SupplyError::InsufficientBalance {
                requested: amount.to_decimal().unwrap_or(Decimal::MAX),
                available: session.balance,
            });
        }
        let display = amount
            .to_decimal()
            .map_err(|e| SupplyError::InvalidAmount(e.to_string()))?;

        Ok(ValidatedSupply {
            owner,
            amount,
            display,
        })
    }

    async fn run_approval(
        &self,
        pool: &Pool,
        validated: &ValidatedSupply,
    ) -> Result<TxReceipt, GatewayError> {
        let handle = self
            .gateway
            .approve(
                &self.config.loan_token.address,
                &pool.address,
                validated.amount.raw,
            )
            .await?;
        debug!(hash = %handle.hash, spender = %pool.address, "Approval sent");
        self.confirm(&handle).await
    }

    async fn run_deposit(
        &self,
        pool: &Pool,
        validated: &ValidatedSupply,
    ) -> Result<TxReceipt, GatewayError> {
        let call = SupplyCall {
            pool: pool.address.clone(),
            pool_id: pool.id,
            assets: validated.amount.raw,
            shares: U256::zero(),
            on_behalf: validated.owner.clone(),
            data: Vec::new(),
        };
        let handle = self.gateway.supply(call).await?;
        debug!(hash = %handle.hash, pool = %pool.address, "Deposit sent");
        self.confirm(&handle).await
    }

    async fn confirm(&self, handle: &TxHandle) -> Result<TxReceipt, GatewayError> {
        let receipt = tokio::time::timeout(
            self.config.confirmation_timeout(),
            self.gateway.await_confirmation(handle),
        )
        .await
        .map_err(|_| GatewayError::Timeout)??;

        debug!(
            hash = %receipt.hash,
            kind = ?handle.kind,
            block = receipt.block_number,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    /// Moves a failed phase back to selection and returns the surfaced error.
    async fn fail(&mut self, phase: &str, e: GatewayError) -> SupplyError {
        error!(flow = %self.flow_id, phase = phase, error = %e, "Supply phase failed");

        let message = format!("Error: {e}");
        if let Err(transition) = self.transition(SupplyState::Failed, message).await {
            error!(error = %transition, "Failure transition refused");
        }
        if let Err(transition) = self
            .transition(SupplyState::Selected, "Ready to retry")
            .await
        {
            error!(error = %transition, "Retry transition refused");
        }

        // A sent deposit may still land; never retry against the old balance.
        if phase == "supply" {
            self.wallet.refresh_balance().await;
        }

        let err = SupplyError::Gateway(e);
        self.last_error = Some(err.clone());
        err
    }

    async fn transition(
        &mut self,
        to: SupplyState,
        message: impl Into<String>,
    ) -> Result<(), SupplyError> {
        let event = SupplyEvent::new(self.flow_id, self.pool_id, self.state, to, message);
        self.emit(event).await
    }

    async fn emit(&mut self, event: SupplyEvent) -> Result<(), SupplyError> {
        if event.from != self.state || !self.state.can_transition_to(event.to) {
            return Err(SupplyError::InvalidTransition {
                from: self.state,
                to: event.to,
            });
        }

        info!(
            flow = %event.flow_id,
            from = %event.from,
            to = %event.to,
            message = %event.message,
            "Supply progress"
        );
        self.state = event.to;
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
        self.tracker.record(event).await;
        Ok(())
    }

    fn selected_intent(&mut self) -> Result<&mut SupplyIntent, SupplyError> {
        if self.state != SupplyState::Selected {
            return Err(SupplyError::NoPoolSelected);
        }
        self.intent.as_mut().ok_or(SupplyError::NoPoolSelected)
    }
}
