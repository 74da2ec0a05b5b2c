/// Push device registration
///
/// - `POST /api/devices` - `{ "token": "...", "platform": "ios" }`
/// - `DELETE /api/devices/:token`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use htmlquest_shared::{auth::middleware::AuthContext, models::device_token::DeviceToken};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 255, message = "Token must be 1-255 characters"))]
    pub token: String,

    #[validate(length(max = 32, message = "Platform must be at most 32 characters"))]
    pub platform: Option<String>,
}

pub async fn register_device(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RegisterDeviceRequest>,
) -> ApiResult<(StatusCode, Json<DeviceToken>)> {
    req.validate()?;

    let device = DeviceToken::register(
        &state.db,
        auth.user_id,
        req.token.trim(),
        req.platform.as_deref(),
    )
    .await?;

    tracing::debug!(user_id = %auth.user_id, platform = ?device.platform, "Device registered");

    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn unregister_device(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    if !DeviceToken::unregister(&state.db, auth.user_id, &token).await? {
        return Err(ApiError::NotFound("Device not registered".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
