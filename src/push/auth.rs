//! OAuth2 access tokens for the FCM HTTP v1 API.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::PushError;

/// OAuth2 scope required by `messages:send`
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime in seconds (Google's maximum)
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this long before the cached token expires
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a Google service account key file that are needed here
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &str) -> Result<Self, PushError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PushError::Auth(format!("cannot read service account {}: {}", path, e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, PushError> {
        serde_json::from_str(raw)
            .map_err(|e| PushError::Auth(format!("invalid service account key: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Source of bearer tokens for FCM requests
pub enum FcmAuth {
    /// Pre-issued token, used as-is
    Static(String),
    /// Tokens minted from a service account and cached until shortly before expiry
    ServiceAccount(ServiceAccountTokens),
}

/// Signing material and the last minted token for one service account
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn access_token(&self, http: &reqwest::Client) -> Result<String, PushError> {
        // Held across the exchange so concurrent sends refresh once
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        let fresh = exchange_assertion(http, &self.key, &self.signing_key, now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

impl FcmAuth {
    pub fn from_service_account(key: ServiceAccountKey) -> Result<Self, PushError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| PushError::Auth(format!("invalid service account private key: {}", e)))?;

        Ok(FcmAuth::ServiceAccount(ServiceAccountTokens {
            key,
            signing_key,
            cached: Mutex::new(None),
        }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FcmAuth::Static(_) => "static",
            FcmAuth::ServiceAccount(_) => "service_account",
        }
    }

    /// Current access token, exchanging a fresh assertion when the cached one is stale
    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String, PushError> {
        match self {
            FcmAuth::Static(token) => Ok(token.clone()),
            FcmAuth::ServiceAccount(tokens) => tokens.access_token(http).await,
        }
    }
}

fn sign_assertion(
    key: &ServiceAccountKey,
    signing_key: &EncodingKey,
    now: DateTime<Utc>,
) -> Result<String, PushError> {
    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: FCM_SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_TTL_SECS,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, signing_key)
        .map_err(|e| PushError::Auth(format!("failed to sign assertion: {}", e)))
}

async fn exchange_assertion(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
    signing_key: &EncodingKey,
    now: DateTime<Utc>,
) -> Result<CachedToken, PushError> {
    let assertion = sign_assertion(key, signing_key, now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "OAuth token exchange rejected");
        return Err(PushError::Auth(format!(
            "token endpoint returned {}",
            status.as_u16()
        )));
    }

    let token: TokenResponse = response.json().await?;
    tracing::debug!(expires_in = token.expires_in, "Obtained FCM access token");

    Ok(CachedToken {
        token: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
