//! Adapters that turn "notification created" events from the host into
//! dispatcher calls.

mod backoff;
mod http;
mod redis;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use http::notification_created;
pub use redis::{parse_message, RedisNotificationMessage, RedisSubscriber, DEFAULT_CHANNEL};
