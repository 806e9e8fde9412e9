use crate::{
    error::{AppError, Result},
    models::{
        CreateNotificationRequest, DispatchResult, Notification, RegisterTokenRequest,
        RegisterTokenResponse, SendNotificationRequest,
    },
    state::AppState,
    utils::JsonBody,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", post(create_notification))
        .route("/send", post(send_notification))
        .route("/tokens", post(register_token))
        .route("/:notification_id", get(get_notification))
        .route("/:notification_id/read", post(mark_read))
}

/// GET /health
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Get a notification by id
/// GET /:notification_id
async fn get_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>> {
    debug!("Fetching notification: {}", notification_id);

    let notification = state
        .notification_service
        .get_notification(&notification_id)
        .await
        .map_err(|e| e.context("Error fetching notification"))?;

    Ok(Json(notification))
}

/// Create a notification record
/// POST /
pub(crate) async fn create_notification(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CreateNotificationRequest>,
) -> Result<Json<Notification>> {
    let notification = state
        .notification_service
        .create_notification(request)
        .await
        .map_err(|e| e.context("Error creating notification"))?;

    Ok(Json(notification))
}

/// Send a push notification to every device of a user
/// POST /send
async fn send_notification(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SendNotificationRequest>,
) -> Result<(StatusCode, Json<DispatchResult>)> {
    request
        .validate()
        .map_err(|_| AppError::validation("Missing required fields"))?;

    let SendNotificationRequest {
        user_id,
        title,
        body,
        data,
    } = request;

    let result = state
        .dispatch_service
        .send_notification(
            user_id.as_deref().unwrap_or_default(),
            title.as_deref().unwrap_or_default(),
            body.as_deref().unwrap_or_default(),
            data,
        )
        .await
        .map_err(|e| e.context("Error sending notification"))?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Register a device token for a user
/// POST /tokens
async fn register_token(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<RegisterTokenRequest>,
) -> Result<Json<RegisterTokenResponse>> {
    request
        .validate()
        .map_err(|_| AppError::validation("Missing userId or token"))?;

    let response = state
        .token_service
        .register_token(
            request.user_id.as_deref().unwrap_or_default(),
            request.token.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| e.context("Error registering token"))?;

    Ok(Json(response))
}

/// Mark a notification as read
/// POST /:notification_id/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>> {
    debug!("Marking notification {} as read", notification_id);

    let notification = state
        .notification_service
        .mark_read(&notification_id)
        .await
        .map_err(|e| e.context("Error updating notification"))?;

    Ok(Json(notification))
}
