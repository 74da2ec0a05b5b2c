/// Evaluation endpoints
///
/// Supervisors rate students and students rate supervisors, 1 to 5 stars.
/// Writing again for the same pair and direction replaces the previous
/// rating and comment.
///
/// # Endpoints
///
/// - `POST /api/evaluations` - upsert
/// - `GET /api/evaluations/received` - evaluations about the caller
/// - `GET /api/evaluations/given` - evaluations written by the caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use htmlquest_shared::{
    auth::{authorization::require_any_role, middleware::AuthContext},
    models::{
        evaluation::{Evaluation, EvaluationDirection, EvaluationEntry, UpsertEvaluation},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct EvaluationRequest {
    pub direction: EvaluationDirection,

    pub evaluatee_id: Uuid,

    /// Any number; stored rounded and clamped to 1-5
    pub rating: f64,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

pub async fn upsert_evaluation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<EvaluationRequest>,
) -> ApiResult<Json<Evaluation>> {
    req.validate()?;

    if req.evaluatee_id == auth.user_id {
        return Err(ApiError::BadRequest("Cannot evaluate yourself".to_string()));
    }

    require_any_role(&auth, req.direction.evaluator_roles())?;

    let evaluatee = User::find_by_id(&state.db, req.evaluatee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evaluatee not found".to_string()))?;

    let expected = req.direction.evaluatee_role();
    if evaluatee.role != expected {
        return Err(ApiError::BadRequest(format!(
            "Evaluatee must be a {}",
            expected.as_str()
        )));
    }

    let evaluation = Evaluation::upsert(
        &state.db,
        UpsertEvaluation {
            direction: req.direction,
            evaluator_id: auth.user_id,
            evaluatee_id: evaluatee.id,
            rating: req.rating,
            comment: req
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        },
    )
    .await?;

    tracing::info!(
        evaluation_id = %evaluation.id,
        direction = ?evaluation.direction,
        rating = evaluation.rating,
        "Evaluation saved"
    );

    Ok(Json(evaluation))
}

pub async fn list_received(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<EvaluationEntry>>> {
    Ok(Json(Evaluation::list_received(&state.db, auth.user_id).await?))
}

pub async fn list_given(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<EvaluationEntry>>> {
    Ok(Json(Evaluation::list_given(&state.db, auth.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlquest_shared::models::evaluation::clamp_rating;

    #[test]
    fn test_request_accepts_any_numeric_rating() {
        for (raw, stored) in [("4.5", 5), ("2.4", 2), ("1e30", 5), ("-99999999999999999999", 1)] {
            let body = format!(
                r#"{{"direction":"supervisor_to_student","evaluatee_id":"{}","rating":{}}}"#,
                Uuid::nil(),
                raw
            );
            let req: EvaluationRequest = serde_json::from_str(&body).unwrap();
            assert_eq!(clamp_rating(req.rating), stored, "rating {}", raw);
        }
    }
}
