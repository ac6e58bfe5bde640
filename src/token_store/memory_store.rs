use async_trait::async_trait;
use dashmap::DashMap;

use super::{DeviceTokenStore, TokenStoreError};

/// In-memory token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the token for a user
    pub fn insert(&self, user_id: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(user_id.into(), token.into());
    }

    /// Forget the token for a user, returning it if one was stored
    pub fn remove(&self, user_id: &str) -> Option<String> {
        self.tokens.remove(user_id).map(|(_, token)| token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl DeviceTokenStore for MemoryTokenStore {
    async fn get_token(&self, user_id: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self
            .tokens
            .get(user_id)
            .map(|token| token.value().clone()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
