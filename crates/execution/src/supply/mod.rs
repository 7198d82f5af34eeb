//! Supply flow.
//!
//! Drives a deposit into a selected pool:
//! - Amount entry and validation against the wallet balance
//! - Phase 1: exact-amount allowance grant, awaited to confirmation
//! - Phase 2: pool deposit, awaited to confirmation
//! - Balance refresh and outcome reporting

mod intent;
mod orchestrator;
mod state;

pub use intent::*;
pub use orchestrator::*;
pub use state::*;
