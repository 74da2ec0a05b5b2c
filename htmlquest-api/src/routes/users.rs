/// User directory
///
/// `GET /api/users?role=student|supervisor&limit=&offset=` lists accounts by
/// role so evaluators can pick who to rate.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use htmlquest_shared::models::user::{User, UserRole, UserSummary};
use serde::Deserialize;

use super::Pagination;

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: UserRole,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list_by_role(&state.db, query.role, page.limit(), page.offset()).await?;

    Ok(Json(users))
}
