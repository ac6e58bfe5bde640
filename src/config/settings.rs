use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub token_store: TokenStoreConfig,
    pub fcm: FcmConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared secret expected in `X-API-Key` on webhook calls (disabled when unset)
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Channels carrying "notification created" events. Glob patterns are
    /// subscribed with PSUBSCRIBE.
    #[serde(default)]
    pub channels: Vec<String>,
    /// How long shutdown waits for dispatches already in flight
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
}

/// Where device tokens live: `HGET {key_prefix}:{user_id} {field}`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStoreConfig {
    /// "redis" or "memory"
    #[serde(default = "default_token_backend")]
    pub backend: String,
    #[serde(default = "default_token_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_token_field")]
    pub field: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    pub project_id: String,
    #[serde(default = "default_fcm_base_url")]
    pub base_url: String,
    /// Path to a Google service account JSON key
    pub service_account_path: Option<String>,
    /// Pre-issued OAuth2 access token, takes precedence over the service account
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_fcm_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_otel_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_drain_timeout() -> u64 {
    10
}

fn default_token_backend() -> String {
    "redis".to_string()
}

fn default_token_key_prefix() -> String {
    "users".to_string()
}

fn default_token_field() -> String {
    "fcmToken".to_string()
}

fn default_fcm_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_fcm_timeout() -> u64 {
    10
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "push-notification-dispatcher".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("token_store.backend", "redis")?
            .set_default("fcm.base_url", "https://fcm.googleapis.com")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, FCM__PROJECT_ID, TOKEN_STORE__KEY_PREFIX, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("redis.channels"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            channels: vec![],
            drain_timeout_seconds: default_drain_timeout(),
        }
    }
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_token_backend(),
            key_prefix: default_token_key_prefix(),
            field: default_token_field(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_otel_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
