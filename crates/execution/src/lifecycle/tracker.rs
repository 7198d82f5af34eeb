//! Lifecycle tracker for supply history.

use super::SupplyEvent;
use crate::supply::SupplyState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of a supply flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    /// Still open.
    Open,
    /// Deposit confirmed.
    Completed,
    /// Closed without a confirmed deposit.
    Cancelled,
}

/// Summary of one supply flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Flow ID.
    pub flow_id: Uuid,
    /// Pool market id.
    pub pool_id: u64,
    /// When the pool was selected.
    pub opened_at: chrono::DateTime<chrono::Utc>,
    /// When the flow ended.
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Flow status.
    pub status: FlowStatus,
    /// Submissions that reached the approval phase.
    pub attempts: u32,
    /// Submissions refused by validation.
    pub rejections: u32,
    /// Attempts that failed in a transaction phase.
    pub failures: u32,
    /// Last failure or rejection reason.
    pub last_error: Option<String>,
    /// Amount supplied by the flow.
    pub supplied: Decimal,
}

/// Tracks supply events for all flows.
pub struct SupplyTracker {
    /// Events by flow.
    events: Arc<RwLock<HashMap<Uuid, Vec<SupplyEvent>>>>,
    /// Flow summaries.
    summaries: Arc<RwLock<HashMap<Uuid, FlowSummary>>>,
}

impl SupplyTracker {
    /// Creates a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            summaries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records an event and updates the flow summary.
    pub async fn record(&self, event: SupplyEvent) {
        {
            let mut summaries = self.summaries.write().await;
            let summary = summaries
                .entry(event.flow_id)
                .or_insert_with(|| FlowSummary {
                    flow_id: event.flow_id,
                    pool_id: event.pool_id,
                    opened_at: event.timestamp,
                    closed_at: None,
                    status: FlowStatus::Open,
                    attempts: 0,
                    rejections: 0,
                    failures: 0,
                    last_error: None,
                    supplied: Decimal::ZERO,
                });

            match event.to {
                SupplyState::Approving => summary.attempts += 1,
                SupplyState::Rejected => {
                    summary.rejections += 1;
                    summary.last_error = Some(event.message.clone());
                }
                SupplyState::Failed => {
                    summary.failures += 1;
                    summary.last_error = Some(event.message.clone());
                }
                SupplyState::Completed => {
                    summary.status = FlowStatus::Completed;
                    summary.supplied += event.amount.unwrap_or_default();
                    summary.closed_at = Some(event.timestamp);
                    info!(
                        flow = %event.flow_id,
                        pool_id = event.pool_id,
                        supplied = %summary.supplied,
                        attempts = summary.attempts,
                        "Supply flow completed"
                    );
                }
                SupplyState::Idle if summary.status == FlowStatus::Open => {
                    summary.status = FlowStatus::Cancelled;
                    summary.closed_at = Some(event.timestamp);
                }
                _ => {}
            }
        }

        debug!(
            flow = %event.flow_id,
            from = %event.from,
            to = %event.to,
            "Supply event recorded"
        );
        self.events
            .write()
            .await
            .entry(event.flow_id)
            .or_default()
            .push(event);
    }

    /// Gets all events for a flow.
    pub async fn get_events(&self, flow_id: &Uuid) -> Vec<SupplyEvent> {
        self.events
            .read()
            .await
            .get(flow_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets the summary for a flow.
    pub async fn get_summary(&self, flow_id: &Uuid) -> Option<FlowSummary> {
        self.summaries.read().await.get(flow_id).cloned()
    }

    /// Gets all flow summaries.
    pub async fn get_all_summaries(&self) -> Vec<FlowSummary> {
        self.summaries.read().await.values().cloned().collect()
    }

    /// Gets aggregate statistics.
    pub async fn get_aggregate_stats(&self) -> AggregateStats {
        let summaries = self.summaries.read().await;

        let mut stats = AggregateStats::default();
        let mut pools = HashSet::new();

        for summary in summaries.values() {
            stats.total_flows += 1;
            match summary.status {
                FlowStatus::Open => stats.open_flows += 1,
                FlowStatus::Completed => {
                    stats.completed_flows += 1;
                    pools.insert(summary.pool_id);
                }
                FlowStatus::Cancelled => stats.cancelled_flows += 1,
            }
            stats.total_attempts += summary.attempts;
            stats.failed_attempts += summary.failures;
            stats.rejected_submissions += summary.rejections;
            stats.total_supplied += summary.supplied;
        }
        stats.pools_supplied = pools.len() as u32;

        stats
    }
}

impl Default for SupplyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics across all flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Flows tracked.
    pub total_flows: u32,
    /// Flows still open.
    pub open_flows: u32,
    /// Flows ending in a confirmed deposit.
    pub completed_flows: u32,
    /// Flows closed without a deposit.
    pub cancelled_flows: u32,
    /// Submissions that reached the approval phase.
    pub total_attempts: u32,
    /// Attempts that failed on-chain or at signing.
    pub failed_attempts: u32,
    /// Submissions refused by validation.
    pub rejected_submissions: u32,
    /// Total amount supplied.
    pub total_supplied: Decimal,
    /// Distinct pools supplied to.
    pub pools_supplied: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(flow: Uuid, pool_id: u64, from: SupplyState, to: SupplyState) -> SupplyEvent {
        SupplyEvent::new(flow, pool_id, from, to, format!("{from} -> {to}"))
    }

    #[tokio::test]
    async fn test_tracker_completed_flow() {
        let tracker = SupplyTracker::new();
        let flow = Uuid::new_v4();

        tracker
            .record(event(flow, 1, SupplyState::Idle, SupplyState::Selected))
            .await;
        tracker
            .record(event(flow, 1, SupplyState::Validating, SupplyState::Approving))
            .await;
        tracker
            .record(event(flow, 1, SupplyState::Approving, SupplyState::Failed))
            .await;
        tracker
            .record(event(flow, 1, SupplyState::Validating, SupplyState::Approving))
            .await;
        tracker
            .record(
                event(flow, 1, SupplyState::Supplying, SupplyState::Completed)
                    .with_amount(dec!(100)),
            )
            .await;
        tracker
            .record(event(flow, 1, SupplyState::Completed, SupplyState::Idle))
            .await;

        assert_eq!(tracker.get_events(&flow).await.len(), 6);

        let summary = tracker.get_summary(&flow).await.unwrap();
        assert_eq!(summary.status, FlowStatus::Completed);
        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.supplied, dec!(100));
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let tracker = SupplyTracker::new();
        let done = Uuid::new_v4();
        let cancelled = Uuid::new_v4();

        tracker
            .record(
                event(done, 2, SupplyState::Supplying, SupplyState::Completed)
                    .with_amount(dec!(40.5)),
            )
            .await;
        tracker
            .record(event(cancelled, 3, SupplyState::Idle, SupplyState::Selected))
            .await;
        tracker
            .record(event(cancelled, 3, SupplyState::Validating, SupplyState::Rejected))
            .await;
        tracker
            .record(event(cancelled, 3, SupplyState::Selected, SupplyState::Idle))
            .await;

        let stats = tracker.get_aggregate_stats().await;
        assert_eq!(stats.total_flows, 2);
        assert_eq!(stats.completed_flows, 1);
        assert_eq!(stats.cancelled_flows, 1);
        assert_eq!(stats.rejected_submissions, 1);
        assert_eq!(stats.total_supplied, dec!(40.5));
        assert_eq!(stats.pools_supplied, 1);
    }
}
