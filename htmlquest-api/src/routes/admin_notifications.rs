/// Admin notification endpoints
///
/// All routes require the `admin` role.
///
/// # Endpoints
///
/// - `GET /api/admin/notifications` - recent feed, newest first (`?limit=`)
/// - `POST /api/admin/notifications` - broadcast `{ "title", "body" }`
/// - `POST /api/admin/notifications/:id/read` - mark one as read
/// - `GET /api/admin/notifications/stream` - live SSE stream
///
/// # SSE Event Format
///
/// ```text
/// event: notification
/// data: {"id":"...","kind":"project_created","title":"...","body":"...","created_at":"..."}
/// ```
///
/// A subscriber that falls behind skips what it missed; consoles reload the
/// feed to catch up.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use htmlquest_shared::{
    auth::middleware::AuthContext,
    models::notification::AdminNotification,
    notifications::{NotificationEvent, KIND_BROADCAST},
    push::{self, PushMessage},
};
use serde::Deserialize;
use std::{convert::Infallible, time::Duration};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt as _,
};
use uuid::Uuid;
use validator::Validate;

use super::{not_blank, Pagination};

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = 2000, message = "Body must be 1-2000 characters"),
        custom(function = "not_blank")
    )]
    pub body: String,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<AdminNotification>>> {
    Ok(Json(AdminNotification::list_recent(&state.db, page.limit()).await?))
}

/// Persists, publishes to live consoles and pushes to every device.
pub async fn broadcast(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BroadcastRequest>,
) -> ApiResult<(StatusCode, Json<AdminNotification>)> {
    req.validate()?;

    let notification =
        AdminNotification::create(&state.db, KIND_BROADCAST, req.title.trim(), req.body.trim())
            .await?;

    let live = state.hub.publish(NotificationEvent::from(&notification));

    push::spawn_to_all(
        state.db.clone(),
        state.push.clone(),
        PushMessage::new(notification.title.clone(), notification.body.clone()),
    );

    tracing::info!(
        notification_id = %notification.id,
        admin_id = %auth.user_id,
        live_subscribers = live,
        "Admin broadcast sent"
    );

    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminNotification>> {
    let notification = AdminNotification::mark_read(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Maps hub messages to SSE events, skipping over lag gaps.
fn event_stream(
    rx: tokio::sync::broadcast::Receiver<NotificationEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|message| match message {
        Ok(event) => match Event::default().event("notification").json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode notification event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "Admin stream subscriber lagged");
            None
        }
    })
}

pub async fn stream(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(admin_id = %auth.user_id, "Admin stream opened");

    Sse::new(event_stream(state.hub.subscribe()))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(25)))
}
