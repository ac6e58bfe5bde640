//! Device token lookup.
//!
//! The dispatcher only needs a point read by user id. Two backends:
//!
//! - `RedisTokenStore`: reads from a Redis hash per user (production)
//! - `MemoryTokenStore`: DashMap-backed, for tests and local runs
//!
//! Use `create_token_store()` to pick one from configuration.

mod memory_store;
mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{RedisConfig, TokenStoreConfig};

pub use memory_store::MemoryTokenStore;
pub use redis_store::RedisTokenStore;

/// Errors raised by a token store backend.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Token store unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown token store backend: {0:?} (expected \"redis\" or \"memory\")")]
    UnknownBackend(String),
}

/// Read-only access to the per-user device token.
#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// Look up the token registered for `user_id`.
    ///
    /// `Ok(None)` means the user has no token on record.
    async fn get_token(&self, user_id: &str) -> Result<Option<String>, TokenStoreError>;

    /// Backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Create a token store based on configuration.
///
/// `"memory"` yields an empty `MemoryTokenStore`, `"redis"` connects to Redis.
/// Any other value is rejected at startup.
pub async fn create_token_store(
    settings: &TokenStoreConfig,
    redis: &RedisConfig,
) -> Result<Arc<dyn DeviceTokenStore>, TokenStoreError> {
    match settings.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory token store");
            Ok(Arc::new(MemoryTokenStore::new()))
        }
        "redis" => {
            tracing::info!(
                backend = "redis",
                key_prefix = %settings.key_prefix,
                field = %settings.field,
                "Creating Redis token store"
            );
            let store = RedisTokenStore::connect(
                &redis.url,
                settings.key_prefix.clone(),
                settings.field.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        other => Err(TokenStoreError::UnknownBackend(other.to_string())),
    }
}
