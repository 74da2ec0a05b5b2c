/// Project hub endpoints
///
/// Learners publish HTML projects, like them and comment on them. Every
/// mutation returns the server's count so clients never adjust counters
/// locally. Likes and comments from someone other than the owner push a
/// notification to the owner's devices in the background.
///
/// # Endpoints
///
/// - `GET /api/project-hub` - newest first, `?limit=&offset=`
/// - `POST /api/project-hub` - create
/// - `GET /api/project-hub/:id` - project with threaded comments
/// - `PUT /api/project-hub/:id` - owner-only update
/// - `DELETE /api/project-hub/:id` - owner or admin
/// - `POST /api/project-hub/:id/like` - toggle like
/// - `POST /api/project-hub/:id/comment` - add comment or reply
/// - `GET /api/project-hub/:id/comments` - threaded comments

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use htmlquest_shared::{
    auth::{
        authorization::{require_owner, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::{
        comment::Comment,
        project::{CreateProject, LikeState, Project, ProjectCard, UpdateProject},
        user::User,
    },
    notifications::KIND_PROJECT_CREATED,
    push::{self, PushMessage},
    social::{self, CommentAdded, CommentThread},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{not_blank, Pagination};

fn validate_http_url(link: &str) -> Result<(), ValidationError> {
    if social::is_http_url(link) {
        Ok(())
    } else {
        let mut err = ValidationError::new("url");
        err.message = Some("Link must be an http(s) URL".into());
        Err(err)
    }
}

fn validate_image_path(path: &str) -> Result<(), ValidationError> {
    if path.contains("..") || path.starts_with('/') || path.contains("://") {
        let mut err = ValidationError::new("image_path");
        err.message = Some("Image path must be a relative path".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(
        length(max = 512, message = "Image path is too long"),
        custom(function = "validate_image_path")
    )]
    pub image_path: Option<String>,

    #[validate(
        length(max = 512, message = "Link is too long"),
        custom(function = "validate_http_url")
    )]
    pub github_link: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(
        length(max = 512, message = "Image path is too long"),
        custom(function = "validate_image_path")
    )]
    pub image_path: Option<String>,

    #[validate(
        length(max = 512, message = "Link is too long"),
        custom(function = "validate_http_url")
    )]
    pub github_link: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub text: String,

    /// Comment being replied to; replies to replies attach to the thread root
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectCard>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectCard,
    pub comments: Vec<CommentThread>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Pushes to the project owner unless they are the actor.
async fn notify_owner(state: &AppState, project: &Project, actor_id: Uuid, action: &str) {
    if project.owner_id == actor_id {
        return;
    }

    let actor = match User::find_by_id(&state.db, actor_id).await {
        Ok(Some(user)) => user.name,
        Ok(None) => "Someone".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load actor for push");
            "Someone".to_string()
        }
    };

    push::spawn_to_user(
        state.db.clone(),
        state.push.clone(),
        project.owner_id,
        PushMessage::new(
            "Project hub",
            format!("{} {} \"{}\"", actor, action, project.title),
        ),
    );
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<ProjectPage>> {
    let (limit, offset) = (page.limit(), page.offset());
    let projects = Project::list_cards(&state.db, auth.user_id, limit, offset).await?;
    let total = Project::count(&state.db).await?;

    Ok(Json(ProjectPage {
        projects,
        total,
        limit,
        offset,
    }))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectCard>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            owner_id: auth.user_id,
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            image_path: non_blank(req.image_path),
            github_link: non_blank(req.github_link),
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    let hub = state.hub.clone();
    let db = state.db.clone();
    let title = project.title.clone();
    tokio::spawn(async move {
        hub.record(&db, KIND_PROJECT_CREATED, "New project published", &title).await;
    });

    let card = Project::find_card(&state.db, project.id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Created project vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = Project::find_card(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let comments = Comment::list_for_project(&state.db, id).await?;

    Ok(Json(ProjectDetail {
        project,
        comments: social::group_threads(comments),
    }))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectCard>> {
    req.validate()?;

    let project = load_project(&state, id).await?;
    require_owner(&auth, project.owner_id)?;

    Project::update(
        &state.db,
        id,
        UpdateProject {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description.map(|d| d.trim().to_string()),
            image_path: non_blank(req.image_path),
            github_link: non_blank(req.github_link),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let card = Project::find_card(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(card))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = load_project(&state, id).await?;
    require_owner_or_admin(&auth, project.owner_id)?;

    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %id, by = %auth.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LikeState>> {
    let like = Project::toggle_like(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if like.liked {
        if let Ok(project) = load_project(&state, id).await {
            notify_owner(&state, &project, auth.user_id, "liked").await;
        }
    }

    Ok(Json(like))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentAdded>)> {
    req.validate()?;

    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::invalid("text", "Comment cannot be blank"));
    }

    let added =
        social::add_comment(&state.db, id, auth.user_id, text.to_string(), req.reply_to).await?;

    if let Ok(project) = load_project(&state, id).await {
        notify_owner(&state, &project, auth.user_id, "commented on").await;
    }

    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentThread>>> {
    load_project(&state, id).await?;
    let comments = Comment::list_for_project(&state.db, id).await?;

    Ok(Json(social::group_threads(comments)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let ok = CreateProjectRequest {
            title: "Portfolio".to_string(),
            description: "My first page".to_string(),
            image_path: Some("uploads/portfolio.png".to_string()),
            github_link: Some("https://github.com/ada/portfolio".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad_link = CreateProjectRequest {
            github_link: Some("ftp://example.com".to_string()),
            ..ok_request()
        };
        assert!(bad_link.validate().is_err());

        let empty_title = CreateProjectRequest {
            title: String::new(),
            ..ok_request()
        };
        assert!(empty_title.validate().is_err());

        let blank_title = CreateProjectRequest {
            title: "   ".to_string(),
            ..ok_request()
        };
        let errors = blank_title.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let long_description = CreateProjectRequest {
            description: "x".repeat(5001),
            ..ok_request()
        };
        assert!(long_description.validate().is_err());

        let escaping_path = CreateProjectRequest {
            image_path: Some("../etc/passwd".to_string()),
            ..ok_request()
        };
        assert!(escaping_path.validate().is_err());
    }

    fn ok_request() -> CreateProjectRequest {
        CreateProjectRequest {
            title: "Portfolio".to_string(),
            description: String::new(),
            image_path: None,
            github_link: None,
        }
    }

    #[test]
    fn test_update_request_rejects_blank_title() {
        let blank = UpdateProjectRequest {
            title: Some(" \t ".to_string()),
            description: None,
            image_path: None,
            github_link: None,
        };
        assert!(blank.validate().is_err());

        let untouched = UpdateProjectRequest {
            title: None,
            description: Some("New words".to_string()),
            image_path: None,
            github_link: None,
        };
        assert!(untouched.validate().is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
