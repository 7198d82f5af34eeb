//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lendbook_execution::prelude::*;
//! ```

// Config
pub use crate::config::SupplyConfig;

// Errors
pub use crate::error::{GatewayError, SupplyError};

// Gateway
pub use crate::gateway::{
    ChainGateway, FailurePoint, GatewayCall, SimulatedGateway, SimulatedGatewayConfig,
    SupplyCall, TokenBalance, TxHandle, TxKind, TxReceipt,
};

// Lifecycle
pub use crate::lifecycle::{AggregateStats, FlowStatus, FlowSummary, SupplyEvent, SupplyTracker};

// Supply
pub use crate::supply::{SupplyIntent, SupplyOrchestrator, SupplyReceipt, SupplyState};

// Wallet
pub use crate::wallet::WalletManager;
