//! Wallet and supply execution for lending pools.
//!
//! This crate provides the stateful side of the dashboard:
//! - Chain gateway abstraction with an in-memory implementation
//! - Wallet session management and account change handling
//! - Two-phase supply orchestration (approve, then deposit)
//! - Supply lifecycle tracking

/// Prelude module for convenient imports.
pub mod prelude;

/// Execution configuration.
pub mod config;
/// Error types.
pub mod error;
/// Chain gateway.
pub mod gateway;
/// Supply lifecycle tracking.
pub mod lifecycle;
/// Supply orchestration.
pub mod supply;
/// Wallet management.
pub mod wallet;
