//! Application configuration.

mod settings;

pub use settings::{
    ApiConfig, FcmConfig, LogConfig, OtelConfig, RedisConfig, ServerConfig, Settings, TokenStoreConfig,
};
