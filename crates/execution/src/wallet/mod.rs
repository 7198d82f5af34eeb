//! Wallet session management.
//!
//! Owns the process-wide [`WalletSession`](lendbook_domain::WalletSession):
//! - Explicit startup probe of already authorized accounts
//! - Interactive connection
//! - Balance refresh with graceful degradation
//! - Account change notifications

mod manager;

pub use manager::*;
