use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{DeviceTokenStore, TokenStoreError};

/// Redis-backed token store.
///
/// Each user owns a hash at `{key_prefix}:{user_id}`; the token is the
/// `{field}` entry of that hash.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    key_prefix: String,
    field: String,
}

impl RedisTokenStore {
    /// Connect to Redis and build a store
    pub async fn connect(
        url: &str,
        key_prefix: String,
        field: String,
    ) -> Result<Self, TokenStoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(conn, key_prefix, field))
    }

    pub fn with_connection(conn: ConnectionManager, key_prefix: String, field: String) -> Self {
        Self {
            conn,
            key_prefix,
            field,
        }
    }

    /// Hash key holding the user's profile
    pub fn user_key(&self, user_id: &str) -> String {
        user_key(&self.key_prefix, user_id)
    }
}

fn user_key(prefix: &str, user_id: &str) -> String {
    format!("{}:{}", prefix, user_id)
}

#[async_trait]
impl DeviceTokenStore for RedisTokenStore {
    async fn get_token(&self, user_id: &str) -> Result<Option<String>, TokenStoreError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = conn.hget(self.user_key(user_id), &self.field).await?;
        Ok(token)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
