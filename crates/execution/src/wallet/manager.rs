//! Wallet manager driving the shared session.

use crate::error::GatewayError;
use crate::gateway::ChainGateway;
use lendbook_domain::{Token, WalletSession};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Owner of the wallet session.
///
/// The session is only mutated here: on connect, on account change
/// notifications and on balance refresh.
pub struct WalletManager {
    /// Chain gateway.
    gateway: Arc<dyn ChainGateway>,
    /// Token whose balance is tracked.
    token: Token,
    /// Current session.
    session: Arc<RwLock<WalletSession>>,
    /// Session snapshots for observers.
    updates: watch::Sender<WalletSession>,
}

impl WalletManager {
    /// Creates a manager with a disconnected session.
    pub fn new(gateway: Arc<dyn ChainGateway>, token: Token) -> Self {
        let (updates, _) = watch::channel(WalletSession::default());
        Self {
            gateway,
            token,
            session: Arc::new(RwLock::new(WalletSession::default())),
            updates,
        }
    }

    /// Restores a session for an account authorized earlier, without prompting.
    ///
    /// Awaited once at startup; afterwards balance reads assume the gateway is ready.
    pub async fn initialize(&self) -> WalletSession {
        match self.gateway.get_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(address) => {
                    info!(address = %address, "Wallet already connected");
                    self.adopt(address).await;
                    self.refresh_balance().await;
                }
                None => debug!("No authorized wallet account"),
            },
            Err(e) => warn!(error = %e, "Wallet probe failed"),
        }
        self.session().await
    }

    /// Prompts the wallet for access and loads the balance of the chosen account.
    ///
    /// # Errors
    /// Returns [`GatewayError::WalletUnavailable`] or [`GatewayError::UserRejected`]
    /// when the connection cannot be established.
    pub async fn connect(&self) -> Result<WalletSession, GatewayError> {
        let address = self.gateway.request_accounts().await.map_err(|e| {
            error!(error = %e, "Error connecting wallet");
            e
        })?;

        info!(address = %address, "Wallet connected");
        self.adopt(address).await;
        self.refresh_balance().await;
        Ok(self.session().await)
    }

    /// Re-reads the token balance of the connected account.
    ///
    /// Failures degrade to a zero balance. A result for an account that is no
    /// longer selected is discarded.
    pub async fn refresh_balance(&self) -> Decimal {
        let Some(address) = self.session.read().await.address.clone() else {
            return Decimal::ZERO;
        };

        let balance = match self
            .gateway
            .get_token_balance(&self.token.address, &address)
            .await
        {
            Ok(raw) => raw.to_amount().to_decimal().unwrap_or_else(|e| {
                warn!(error = %e, "Balance out of display range");
                Decimal::ZERO
            }),
            Err(e) => {
                warn!(error = %e, token = %self.token.symbol, "Error fetching balance");
                Decimal::ZERO
            }
        };

        let mut session = self.session.write().await;
        if session.address.as_deref() != Some(address.as_str()) {
            debug!(address = %address, "Discarding balance of deselected account");
            return session.balance;
        }
        session.set_balance(balance);
        debug!(address = %address, balance = %session.balance, "Balance fetched");
        self.publish(&session);
        session.balance
    }

    /// Applies an account change notification.
    pub async fn handle_accounts_changed(&self, accounts: Vec<String>) {
        match accounts.into_iter().next() {
            Some(address) => {
                info!(address = %address, "Wallet account changed");
                self.adopt(address).await;
                self.refresh_balance().await;
            }
            None => {
                info!("Wallet disconnected");
                let mut session = self.session.write().await;
                session.clear();
                self.publish(&session);
            }
        }
    }

    /// Spawns a task applying the gateway's account change notifications.
    pub fn spawn_account_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut rx = self.gateway.accounts_changed();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(accounts) => manager.handle_accounts_changed(accounts).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Missed account notifications, resyncing");
                        match manager.gateway.get_accounts().await {
                            Ok(accounts) => manager.handle_accounts_changed(accounts).await,
                            Err(e) => warn!(error = %e, "Account resync failed"),
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Account notifications closed, stopping listener");
                        break;
                    }
                }
            }
        })
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> WalletSession {
        self.session.read().await.clone()
    }

    /// Receiver of session snapshots, updated on every change.
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.updates.subscribe()
    }

    /// Token whose balance is tracked.
    pub fn token(&self) -> &Token {
        &self.token
    }

    async fn adopt(&self, address: String) {
        let mut session = self.session.write().await;
        if session.address.as_deref() != Some(address.as_str()) {
            *session = WalletSession::new(address);
        }
        session.connected = true;
        self.publish(&session);
    }

    fn publish(&self, session: &WalletSession) {
        self.updates.send_replace(session.clone());
    }
}
