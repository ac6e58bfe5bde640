use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::FcmConfig;
use crate::notification::PushPayload;

use super::{FcmAuth, PushError, PushSender, ServiceAccountKey};

/// Client for `POST /v1/projects/{project_id}/messages:send`
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    auth: FcmAuth,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushPayload,
}

#[derive(Deserialize)]
struct SendResponse {
    /// Message resource name, e.g. `projects/demo/messages/0:1500415314455276%31bd1c9631bd1c96`
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl FcmClient {
    /// Build a client from configuration. A configured access token wins over
    /// the service account key.
    pub fn new(config: &FcmConfig) -> Result<Self, PushError> {
        let auth = match (&config.access_token, &config.service_account_path) {
            (Some(token), _) => FcmAuth::Static(token.clone()),
            (None, Some(path)) => FcmAuth::from_service_account(ServiceAccountKey::from_file(path)?)?,
            (None, None) => {
                return Err(PushError::Auth(
                    "either fcm.access_token or fcm.service_account_path must be set".to_string(),
                ))
            }
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self::with_auth(http, &config.base_url, &config.project_id, auth))
    }

    pub fn with_auth(http: reqwest::Client, base_url: &str, project_id: &str, auth: FcmAuth) -> Self {
        Self {
            http,
            endpoint: send_endpoint(base_url, project_id),
            auth,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth_kind(&self) -> &'static str {
        self.auth.kind()
    }
}

fn send_endpoint(base_url: &str, project_id: &str) -> String {
    format!(
        "{}/v1/projects/{}/messages:send",
        base_url.trim_end_matches('/'),
        project_id
    )
}

/// Pull a readable reason out of an FCM error body, falling back to the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{}: {}", status, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, payload: &PushPayload) -> Result<String, PushError> {
        let access_token = self.auth.access_token(&self.http).await?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&SendRequest { message: payload })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let sent: SendResponse = response.json().await?;
        Ok(sent.name)
    }
}
