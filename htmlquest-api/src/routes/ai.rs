/// Basic-project evaluator endpoints
///
/// # Endpoints
///
/// - `POST /api/ai-local/evaluate-basic-project` - score the current step
/// - `GET /api/ai-local/project-progress` - current state and step list
/// - `GET /api/ai-local/steps` - the fixed step list
/// - `PUT /api/auth/upgrade-level` - re-apply the certificate's level and badge
///
/// # Submission
///
/// ```text
/// POST /api/ai-local/evaluate-basic-project
///
/// { "code": "<!DOCTYPE html>...", "step": 2 }
/// ```
///
/// `step` is optional; when present it must match the stored step (409
/// otherwise). A scoring-service outage answers 503 with a fixed message and
/// leaves the learner on the same step.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use htmlquest_shared::{
    auth::middleware::AuthContext,
    evaluator::{service, ProgressView, StepInfo, SubmissionResult},
    models::user::User,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 100000, message = "Code must be 1-100000 characters"))]
    pub code: String,

    pub step: Option<u8>,
}

pub async fn evaluate_basic_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult<Json<SubmissionResult>> {
    req.validate()?;

    let result = service::submit(
        &state.db,
        state.scorer.as_ref(),
        auth.user_id,
        &req.code,
        req.step,
    )
    .await?;

    Ok(Json(result))
}

pub async fn project_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProgressView>> {
    Ok(Json(service::load_progress(&state.db, auth.user_id).await?))
}

pub async fn steps() -> Json<Vec<StepInfo>> {
    Json(service::step_list())
}

pub async fn upgrade_level(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = service::reapply_certificate(&state.db, auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, level = ?user.level, "Certificate level applied");

    Ok(Json(user))
}
