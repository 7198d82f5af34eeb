//! Supply lifecycle tracking.
//!
//! Keeps an in-memory history of supply flows:
//! - Progress events for every state transition
//! - Per-flow summaries
//! - Aggregate statistics for the deposits overview

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
