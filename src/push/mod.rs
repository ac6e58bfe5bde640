//! Push delivery backends.
//!
//! `FcmClient` talks to the FCM HTTP v1 API. The `PushSender` trait is the
//! seam the dispatcher depends on, so tests can substitute their own sender.

mod auth;
mod fcm;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::FcmConfig;
use crate::notification::PushPayload;

pub use auth::{FcmAuth, ServiceAccountKey, ServiceAccountTokens, FCM_SCOPE};
pub use fcm::FcmClient;

/// Errors that can occur while handing a message to the push backend.
#[derive(Debug, Error)]
pub enum PushError {
    /// Network failure, timeout, or an unreadable response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status (invalid token, bad payload, ...)
    #[error("Rejected by push backend ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Could not obtain an access token for the backend
    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Sends one push message and returns the backend's receipt.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, payload: &PushPayload) -> Result<String, PushError>;
}

/// Build the FCM sender from configuration.
pub fn create_push_sender(config: &FcmConfig) -> Result<Arc<dyn PushSender>, PushError> {
    let client = FcmClient::new(config)?;
    tracing::info!(
        project_id = %config.project_id,
        base_url = %config.base_url,
        auth = client.auth_kind(),
        "Created FCM push sender"
    );
    Ok(Arc::new(client))
}
