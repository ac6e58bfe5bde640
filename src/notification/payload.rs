//! Outbound push message, in the shape the FCM `messages:send` API expects.

use serde::{Deserialize, Serialize};

use super::NotificationEvent;

/// Marker the mobile client uses to route a notification tap
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Sound requested on both platforms
pub const DEFAULT_SOUND: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub notification: PushNotification,
    pub token: String,
    pub data: PushData,
    pub apns: ApnsConfig,
    pub android: AndroidConfig,
}

/// Title and body are forwarded verbatim; absent values are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushData {
    #[serde(rename = "bookingId")]
    pub booking_id: String,
    pub click_action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidNotification {
    pub sound: String,
}

impl PushPayload {
    /// Build the message for `event` addressed to `token`
    pub fn build(event: &NotificationEvent, token: impl Into<String>) -> Self {
        Self {
            notification: PushNotification {
                title: event.title.clone(),
                body: event.body.clone(),
            },
            token: token.into(),
            data: PushData {
                booking_id: event.booking_id.clone().unwrap_or_default(),
                click_action: CLICK_ACTION.to_string(),
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: DEFAULT_SOUND.to_string(),
                    },
                },
            },
            android: AndroidConfig {
                notification: AndroidNotification {
                    sound: DEFAULT_SOUND.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(booking_id: Option<&str>) -> NotificationEvent {
        NotificationEvent {
            user_id: "user-1".to_string(),
            notification_id: "n-1".to_string(),
            title: Some("Booking Confirmed".to_string()),
            body: Some("Your booking is set".to_string()),
            booking_id: booking_id.map(str::to_string),
            is_read: false,
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = PushPayload::build(&event(Some("bk123")), "tok_abc");

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "notification": {"title": "Booking Confirmed", "body": "Your booking is set"},
                "token": "tok_abc",
                "data": {"bookingId": "bk123", "click_action": "FLUTTER_NOTIFICATION_CLICK"},
                "apns": {"payload": {"aps": {"sound": "default"}}},
                "android": {"notification": {"sound": "default"}}
            })
        );
    }

    #[test]
    fn test_missing_booking_id_is_empty_string() {
        let payload = PushPayload::build(&event(None), "tok");
        assert_eq!(payload.data.booking_id, "");

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["data"]["bookingId"], json!(""));
    }

    #[test]
    fn test_title_and_body_pass_through_untouched() {
        let mut e = event(None);
        e.title = Some("  <b>Hi</b> & \"quoted\"  ".to_string());
        e.body = Some("x".repeat(5000));

        let payload = PushPayload::build(&e, "tok");
        assert_eq!(payload.notification.title, e.title);
        assert_eq!(payload.notification.body, e.body);
    }

    #[test]
    fn test_absent_title_is_omitted() {
        let mut e = event(None);
        e.title = None;

        let value = serde_json::to_value(PushPayload::build(&e, "tok")).unwrap();
        assert_eq!(value["notification"], json!({"body": "Your booking is set"}));
    }
}
