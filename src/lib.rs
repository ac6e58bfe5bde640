// Infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain
pub mod notification;
pub mod push;
pub mod token_store;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;
