//! HTTP webhook trigger.
//!
//! The host calls `POST /api/v1/notifications/{user_id}/{notification_id}`
//! with the created record as body. Every dispatch outcome answers 200 with
//! the dispatch result, so the host never redelivers an event. Only a body
//! that is not a notification record is refused.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::error::Result;
use crate::metrics::TriggerMetrics;
use crate::notification::{DispatchResult, NotificationEvent, NotificationRecord};
use crate::server::AppState;

#[tracing::instrument(
    name = "http.notification_created",
    skip_all,
    fields(user_id = %user_id, notification_id = %notification_id)
)]
pub async fn notification_created(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(String, String)>,
    record: std::result::Result<Json<NotificationRecord>, JsonRejection>,
) -> Result<Json<DispatchResult>> {
    TriggerMetrics::record_http_event();

    let Json(record) = record.inspect_err(|_| TriggerMetrics::record_malformed())?;

    let event = NotificationEvent::from_record(user_id, notification_id, record);
    Ok(Json(state.dispatcher.dispatch(&event).await))
}
