use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;

use crate::config::RedisConfig;
use crate::metrics::TriggerMetrics;
use crate::notification::{NotificationEvent, NotificationRecord, PushDispatcher};

use super::backoff::ExponentialBackoff;

/// Channel used when none is configured
pub const DEFAULT_CHANNEL: &str = "notifications:created";

/// Message format received from Redis Pub/Sub, one per created record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisNotificationMessage {
    pub user_id: String,
    pub notification_id: String,
    /// The record as written, e.g. `{"title": ..., "body": ..., "bookingId": ..., "isRead": false}`
    #[serde(default)]
    pub record: NotificationRecord,
}

impl RedisNotificationMessage {
    pub fn into_event(self) -> NotificationEvent {
        NotificationEvent::from_record(self.user_id, self.notification_id, self.record)
    }
}

/// Parse a Pub/Sub payload into an event
pub fn parse_message(payload: &str) -> Result<NotificationEvent, serde_json::Error> {
    serde_json::from_str::<RedisNotificationMessage>(payload).map(RedisNotificationMessage::into_event)
}

/// Redis Pub/Sub subscriber feeding "notification created" events to the dispatcher
pub struct RedisSubscriber {
    config: RedisConfig,
    dispatcher: Arc<PushDispatcher>,
    shutdown: broadcast::Sender<()>,
    drain_timeout: Duration,
}

impl RedisSubscriber {
    pub fn new(config: RedisConfig, dispatcher: Arc<PushDispatcher>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        let drain_timeout = Duration::from_secs(config.drain_timeout_seconds);
        Self {
            config,
            dispatcher,
            shutdown,
            drain_timeout,
        }
    }

    /// Override how long shutdown waits for in-flight dispatches
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Get a shutdown signal sender
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Run the subscriber until a shutdown signal arrives.
    ///
    /// Subscription failures are retried with exponential backoff. Individual
    /// events are never retried. Dispatches already started when shutdown is
    /// requested are awaited (bounded by the drain timeout) before returning.
    pub async fn start(&self) -> anyhow::Result<()> {
        let channels = self.channels();
        tracing::info!(channels = ?channels, "Starting Redis subscriber");

        let mut backoff = ExponentialBackoff::new();
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut in_flight = JoinSet::new();

        loop {
            match self
                .run_subscription_loop(&channels, &mut backoff, &mut in_flight)
                .await
            {
                Ok(()) => {
                    tracing::info!("Redis subscriber stopped gracefully");
                    break;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    TriggerMetrics::record_reconnect();
                    tracing::error!(
                        error = %e,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Redis subscription error, reconnecting"
                    );

                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Shutdown requested while reconnecting");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.drain(in_flight).await;
        Ok(())
    }

    fn channels(&self) -> Vec<String> {
        if self.config.channels.is_empty() {
            vec![DEFAULT_CHANNEL.to_string()]
        } else {
            self.config.channels.clone()
        }
    }

    async fn run_subscription_loop(
        &self,
        channels: &[String],
        backoff: &mut ExponentialBackoff,
        in_flight: &mut JoinSet<()>,
    ) -> anyhow::Result<()> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        for channel in channels {
            if is_pattern(channel) {
                pubsub.psubscribe(channel).await?;
                tracing::debug!(pattern = %channel, "Subscribed to pattern");
            } else {
                pubsub.subscribe(channel).await?;
                tracing::debug!(channel = %channel, "Subscribed to channel");
            }
        }

        tracing::info!("Redis subscription established");
        backoff.reset();

        let mut message_stream = pubsub.on_message();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    return Ok(());
                }
                // Reap finished dispatches so the set only holds running ones
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join_error(joined);
                }
                msg = message_stream.next() => {
                    let Some(msg) = msg else {
                        anyhow::bail!("Redis message stream ended");
                    };

                    let channel = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to get message payload");
                            continue;
                        }
                    };

                    self.handle_message(&channel, &payload, in_flight);
                }
            }
        }
    }

    /// Parse a message and dispatch it on its own task tracked by `in_flight`
    fn handle_message(&self, channel: &str, payload: &str, in_flight: &mut JoinSet<()>) {
        tracing::debug!(channel = %channel, "Received Redis message");
        TriggerMetrics::record_redis_event();

        let event = match parse_message(payload) {
            Ok(event) => event,
            Err(e) => {
                TriggerMetrics::record_malformed();
                tracing::warn!(
                    error = %e,
                    channel = %channel,
                    payload = %payload,
                    "Failed to parse Redis message"
                );
                return;
            }
        };

        let dispatcher = self.dispatcher.clone();
        let channel = channel.to_string();
        in_flight.spawn(async move {
            let result = dispatcher.dispatch(&event).await;
            tracing::debug!(
                channel = %channel,
                outcome = result.outcome(),
                "Dispatched notification from Redis"
            );
        });
    }

    /// Wait for dispatches that were started before shutdown.
    ///
    /// Returns how many were still running when the drain timeout elapsed;
    /// those are aborted when the set is dropped.
    async fn drain(&self, mut in_flight: JoinSet<()>) -> usize {
        if in_flight.is_empty() {
            return 0;
        }

        tracing::info!(
            pending = in_flight.len(),
            timeout_ms = self.drain_timeout.as_millis() as u64,
            "Draining in-flight dispatches"
        );

        let drained = timeout(self.drain_timeout, async {
            while let Some(joined) = in_flight.join_next().await {
                log_join_error(joined);
            }
        })
        .await;

        match drained {
            Ok(()) => {
                tracing::info!("In-flight dispatches finished");
                0
            }
            Err(_) => {
                let remaining = in_flight.len();
                tracing::warn!(remaining, "Drain timeout elapsed, abandoning dispatches");
                remaining
            }
        }
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Dispatch task failed");
    }
}

fn is_pattern(channel: &str) -> bool {
    channel.contains('*') || channel.contains('?') || channel.contains('[')
}
