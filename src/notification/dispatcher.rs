use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::metrics::DispatchMetrics;
use crate::push::PushSender;
use crate::token_store::DeviceTokenStore;

use super::{DispatchResult, FailureKind, NoOpReason, NotificationEvent, PushPayload};

/// Statistics for the push dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Events handled, whatever the outcome
    pub total_dispatched: AtomicU64,
    /// Messages accepted by the push backend
    pub total_sent: AtomicU64,
    /// Events skipped because they were already read
    pub total_already_read: AtomicU64,
    /// Events skipped because the user has no device token
    pub total_no_token: AtomicU64,
    /// Token lookups that failed
    pub total_lookup_failed: AtomicU64,
    /// Sends rejected by the backend or lost in transit
    pub total_send_failed: AtomicU64,
}

impl DispatcherStats {
    fn record(&self, result: &DispatchResult) {
        self.total_dispatched.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            DispatchResult::Sent { .. } => &self.total_sent,
            DispatchResult::NoOp {
                reason: NoOpReason::AlreadyRead,
            } => &self.total_already_read,
            DispatchResult::NoOp {
                reason: NoOpReason::NoToken,
            } => &self.total_no_token,
            DispatchResult::Failed {
                kind: FailureKind::TokenLookup,
                ..
            } => &self.total_lookup_failed,
            DispatchResult::Failed {
                kind: FailureKind::Send,
                ..
            } => &self.total_send_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_already_read: self.total_already_read.load(Ordering::Relaxed),
            total_no_token: self.total_no_token.load(Ordering::Relaxed),
            total_lookup_failed: self.total_lookup_failed.load(Ordering::Relaxed),
            total_send_failed: self.total_send_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_dispatched: u64,
    pub total_sent: u64,
    pub total_already_read: u64,
    pub total_no_token: u64,
    pub total_lookup_failed: u64,
    pub total_send_failed: u64,
}

/// Turns one "notification created" event into at most one push message.
///
/// The token store and push sender are injected so the dispatcher holds no
/// global client state. Dispatch never fails: every collaborator error is
/// folded into the returned `DispatchResult`.
pub struct PushDispatcher {
    token_store: Arc<dyn DeviceTokenStore>,
    sender: Arc<dyn PushSender>,
    stats: DispatcherStats,
}

impl PushDispatcher {
    pub fn new(token_store: Arc<dyn DeviceTokenStore>, sender: Arc<dyn PushSender>) -> Self {
        Self {
            token_store,
            sender,
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Dispatch a push notification for a newly created notification record
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, event),
        fields(
            user_id = %event.user_id,
            notification_id = %event.notification_id,
            outcome = tracing::field::Empty
        )
    )]
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult {
        let started = Instant::now();
        let result = self.run(event).await;

        let outcome = result.outcome();
        tracing::Span::current().record("outcome", outcome);
        self.stats.record(&result);
        DispatchMetrics::record(outcome, started.elapsed());

        result
    }

    async fn run(&self, event: &NotificationEvent) -> DispatchResult {
        if event.is_read {
            tracing::info!("Notification is already read, skipping push");
            return DispatchResult::no_op(NoOpReason::AlreadyRead);
        }

        let token = match self.token_store.get_token(&event.user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("User has no device token, cannot send push");
                return DispatchResult::no_op(NoOpReason::NoToken);
            }
            Err(e) => {
                tracing::error!(error = %e, "Device token lookup failed");
                return DispatchResult::failed(FailureKind::TokenLookup, e);
            }
        };

        let payload = PushPayload::build(event, token);
        tracing::debug!(
            booking_id = %payload.data.booking_id,
            "Sending push payload"
        );

        match self.sender.send(&payload).await {
            Ok(receipt) => {
                tracing::info!(receipt = %receipt, "Push notification sent");
                DispatchResult::sent(receipt)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send push notification");
                DispatchResult::failed(FailureKind::Send, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_by_outcome() {
        let stats = DispatcherStats::default();
        stats.record(&DispatchResult::sent("r1"));
        stats.record(&DispatchResult::sent("r2"));
        stats.record(&DispatchResult::no_op(NoOpReason::AlreadyRead));
        stats.record(&DispatchResult::no_op(NoOpReason::NoToken));
        stats.record(&DispatchResult::failed(FailureKind::Send, "rejected"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_dispatched, 5);
        assert_eq!(snapshot.total_sent, 2);
        assert_eq!(snapshot.total_already_read, 1);
        assert_eq!(snapshot.total_no_token, 1);
        assert_eq!(snapshot.total_lookup_failed, 0);
        assert_eq!(snapshot.total_send_failed, 1);
    }
}
