//! Progress events emitted by the supply flow.

use crate::supply::SupplyState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A state transition of a supply flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyEvent {
    /// Event ID.
    pub id: String,
    /// Flow the event belongs to, one per selected pool.
    pub flow_id: Uuid,
    /// Pool market id.
    pub pool_id: u64,
    /// State before the transition.
    pub from: SupplyState,
    /// State after the transition.
    pub to: SupplyState,
    /// User-facing progress message.
    pub message: String,
    /// Amount involved, once validated.
    pub amount: Option<Decimal>,
    /// Transaction hash, for phase events.
    pub tx_hash: Option<String>,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SupplyEvent {
    /// Creates a new supply event.
    pub fn new(
        flow_id: Uuid,
        pool_id: u64,
        from: SupplyState,
        to: SupplyState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            flow_id,
            pool_id,
            from,
            to,
            message: message.into(),
            amount: None,
            tx_hash: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Sets the amount.
    #[must_use]
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the transaction hash.
    #[must_use]
    pub fn with_tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.tx_hash = Some(hash.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_event_creation() {
        let event = SupplyEvent::new(
            Uuid::new_v4(),
            1,
            SupplyState::Approving,
            SupplyState::Approved,
            "Approval successful",
        )
        .with_tx_hash("0x01");

        assert_eq!(event.to, SupplyState::Approved);
        assert_eq!(event.tx_hash.as_deref(), Some("0x01"));
        assert!(event.amount.is_none());
    }
}
