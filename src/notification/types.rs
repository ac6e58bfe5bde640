use serde::{Deserialize, Serialize};

/// Notification record as written to the data store under
/// `notifications/{user_id}/{notification_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

/// A "notification created" event: the record plus the path it was created at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Owner of the notification, also the key for the device token lookup
    pub user_id: String,
    pub notification_id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub booking_id: Option<String>,
    pub is_read: bool,
}

impl NotificationEvent {
    /// Build an event from the trigger path parameters and the created record
    pub fn from_record(
        user_id: impl Into<String>,
        notification_id: impl Into<String>,
        record: NotificationRecord,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            notification_id: notification_id.into(),
            title: record.title,
            body: record.body,
            booking_id: record.booking_id,
            is_read: record.is_read,
        }
    }
}

/// Why a dispatch finished without sending anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// The notification was already read when it was created
    AlreadyRead,
    /// The user has no registered device
    NoToken,
}

/// Which step of the dispatch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TokenLookup,
    Send,
}

/// Outcome of one dispatch. Exactly one is produced per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    Sent { receipt: String },
    NoOp { reason: NoOpReason },
    Failed { kind: FailureKind, reason: String },
}

impl DispatchResult {
    pub fn sent(receipt: impl Into<String>) -> Self {
        DispatchResult::Sent {
            receipt: receipt.into(),
        }
    }

    pub fn no_op(reason: NoOpReason) -> Self {
        DispatchResult::NoOp { reason }
    }

    pub fn failed(kind: FailureKind, reason: impl ToString) -> Self {
        DispatchResult::Failed {
            kind,
            reason: reason.to_string(),
        }
    }

    /// Label used for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchResult::Sent { .. } => "sent",
            DispatchResult::NoOp {
                reason: NoOpReason::AlreadyRead,
            } => "already_read",
            DispatchResult::NoOp {
                reason: NoOpReason::NoToken,
            } => "no_token",
            DispatchResult::Failed {
                kind: FailureKind::TokenLookup,
                ..
            } => "token_lookup_failed",
            DispatchResult::Failed {
                kind: FailureKind::Send,
                ..
            } => "send_failed",
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchResult::Sent { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_camel_case() {
        let json = r#"{
            "title": "Booking Confirmed",
            "body": "Your booking is set",
            "bookingId": "bk123",
            "isRead": false,
            "createdAt": 1700000000
        }"#;

        let record: NotificationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title.as_deref(), Some("Booking Confirmed"));
        assert_eq!(record.booking_id.as_deref(), Some("bk123"));
        assert!(!record.is_read);
    }

    #[test]
    fn test_parse_record_missing_fields() {
        let record: NotificationRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, NotificationRecord::default());
        assert!(!record.is_read);
    }

    #[test]
    fn test_event_from_record() {
        let record = NotificationRecord {
            title: Some("t".to_string()),
            body: None,
            booking_id: Some("bk1".to_string()),
            is_read: true,
        };

        let event = NotificationEvent::from_record("user-1", "n-1", record);
        assert_eq!(event.user_id, "user-1");
        assert_eq!(event.notification_id, "n-1");
        assert_eq!(event.title.as_deref(), Some("t"));
        assert!(event.body.is_none());
        assert!(event.is_read);
    }

    #[test]
    fn test_result_serialization() {
        let sent = serde_json::to_value(DispatchResult::sent("projects/p/messages/1")).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"status": "sent", "receipt": "projects/p/messages/1"})
        );

        let no_op = serde_json::to_value(DispatchResult::no_op(NoOpReason::NoToken)).unwrap();
        assert_eq!(no_op, serde_json::json!({"status": "no_op", "reason": "no_token"}));

        let failed =
            serde_json::to_value(DispatchResult::failed(FailureKind::Send, "boom")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"status": "failed", "kind": "send", "reason": "boom"})
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchResult::sent("r").outcome(), "sent");
        assert_eq!(
            DispatchResult::no_op(NoOpReason::AlreadyRead).outcome(),
            "already_read"
        );
        assert_eq!(
            DispatchResult::failed(FailureKind::TokenLookup, "down").outcome(),
            "token_lookup_failed"
        );
        assert!(!DispatchResult::no_op(NoOpReason::NoToken).is_sent());
    }
}
