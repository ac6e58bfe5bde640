//! Notification events, push payloads, and dispatching.

mod dispatcher;
mod payload;
mod types;

pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, PushDispatcher};
pub use payload::{
    AndroidConfig, AndroidNotification, ApnsConfig, ApnsPayload, Aps, PushData, PushNotification,
    PushPayload, CLICK_ACTION, DEFAULT_SOUND,
};
pub use types::{DispatchResult, FailureKind, NoOpReason, NotificationEvent, NotificationRecord};
