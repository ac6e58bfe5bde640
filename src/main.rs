use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use push_notification_dispatcher::config::Settings;
use push_notification_dispatcher::notification::PushDispatcher;
use push_notification_dispatcher::push::create_push_sender;
use push_notification_dispatcher::server::{create_app, AppState};
use push_notification_dispatcher::telemetry::init_telemetry;
use push_notification_dispatcher::token_store::create_token_store;
use push_notification_dispatcher::triggers::RedisSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    let _telemetry = init_telemetry(&settings.log, &settings.otel)?;
    tracing::info!("Configuration loaded");

    // Clients live for the whole process and are handed to the dispatcher
    let token_store = create_token_store(&settings.token_store, &settings.redis).await?;
    let push_sender = create_push_sender(&settings.fcm)?;
    let token_backend = token_store.backend_name();
    let dispatcher = Arc::new(PushDispatcher::new(token_store, push_sender));

    let state = AppState::new(settings.clone(), dispatcher.clone(), token_backend);
    tracing::info!("Application state initialized");

    let redis_subscriber = Arc::new(RedisSubscriber::new(settings.redis.clone(), dispatcher));
    let shutdown_signal = redis_subscriber.shutdown_signal();

    let redis_subscriber_clone = redis_subscriber.clone();
    let redis_handle = tokio::spawn(async move {
        if let Err(e) = redis_subscriber_clone.start().await {
            tracing::error!(error = %e, "Redis subscriber failed");
        }
    });

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_signal))
        .await?;

    tracing::info!("Waiting for Redis subscriber to finish...");
    let _ = redis_handle.await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the Redis subscriber
    let _ = shutdown_tx.send(());
}
