//! Supply flow states and their allowed transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the supply flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyState {
    /// No pool selected.
    Idle,
    /// Pool selected, waiting for an amount.
    Selected,
    /// Checking the submitted amount.
    Validating,
    /// Amount refused by validation.
    Rejected,
    /// Allowance grant sent, waiting for confirmation.
    Approving,
    /// Allowance confirmed.
    Approved,
    /// Deposit sent, waiting for confirmation.
    Supplying,
    /// Deposit confirmed and balance refreshed.
    Completed,
    /// A transaction phase failed.
    Failed,
}

impl SupplyState {
    /// Whether `next` is a legal successor of this state.
    ///
    /// Any state may return to [`SupplyState::Idle`] through cancellation.
    pub fn can_transition_to(self, next: SupplyState) -> bool {
        use SupplyState::*;

        matches!(
            (self, next),
            (_, Idle)
                | (Idle, Selected)
                | (Selected, Validating)
                | (Validating, Rejected)
                | (Rejected, Selected)
                | (Validating, Approving)
                | (Approving, Approved)
                | (Approving, Failed)
                | (Approved, Supplying)
                | (Supplying, Completed)
                | (Supplying, Failed)
                | (Failed, Selected)
        )
    }

    /// Whether a transaction phase has been entered and not yet resolved.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SupplyState::Approving | SupplyState::Approved | SupplyState::Supplying
        )
    }
}

impl fmt::Display for SupplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupplyState::Idle => "IDLE",
            SupplyState::Selected => "SELECTED",
            SupplyState::Validating => "VALIDATING",
            SupplyState::Rejected => "REJECTED",
            SupplyState::Approving => "APPROVING",
            SupplyState::Approved => "APPROVED",
            SupplyState::Supplying => "SUPPLYING",
            SupplyState::Completed => "COMPLETED",
            SupplyState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
