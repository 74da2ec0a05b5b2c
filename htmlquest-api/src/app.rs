/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use htmlquest_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::from_config(pool, config)?;
/// let app = htmlquest_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::{jwt_auth_layer, require_admin},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use htmlquest_shared::{
    evaluator::{HttpScorer, Scorer},
    notifications::NotificationHub,
    push::{DisabledPushGateway, HttpPushGateway, PushGateway},
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; everything
/// inside is either a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Basic-project scoring service
    pub scorer: Arc<dyn Scorer>,

    /// Outbound push delivery
    pub push: Arc<dyn PushGateway>,

    /// Admin realtime channel
    pub hub: NotificationHub,
}

impl AppState {
    /// Creates state with explicit service handles (tests inject mocks here).
    pub fn new(
        db: PgPool,
        config: Config,
        scorer: Arc<dyn Scorer>,
        push: Arc<dyn PushGateway>,
    ) -> Self {
        let hub = NotificationHub::new(config.notifications.buffer);

        Self {
            db,
            config: Arc::new(config),
            scorer,
            push,
            hub,
        }
    }

    /// Creates state with the HTTP scorer and the configured push gateway.
    pub fn from_config(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let scorer = HttpScorer::new(
            config.scorer.url.clone(),
            Duration::from_secs(config.scorer.timeout_secs),
        )?;

        let push: Arc<dyn PushGateway> = if config.push.enabled {
            Arc::new(HttpPushGateway::new(
                config.push.gateway_url.clone(),
                Duration::from_secs(config.push.timeout_secs),
            )?)
        } else {
            Arc::new(DisabledPushGateway)
        };

        Ok(Self::new(db, config, Arc::new(scorer), push))
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                              # public
/// └── /api/
///     ├── /auth/                               # register, login, refresh public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   ├── GET  /me
///     │   ├── PUT  /profile
///     │   └── PUT  /upgrade-level
///     ├── GET /users?role=
///     ├── /lessons/
///     │   ├── GET  /
///     │   ├── GET  /content/:id
///     │   ├── GET  /nav/:id
///     │   └── POST /:id/quiz
///     ├── /project-hub/
///     │   ├── GET|POST /
///     │   ├── GET|PUT|DELETE /:id
///     │   ├── POST /:id/like
///     │   ├── POST /:id/comment
///     │   └── GET  /:id/comments
///     ├── /ai-local/
///     │   ├── POST /evaluate-basic-project
///     │   ├── GET  /project-progress
///     │   └── GET  /steps
///     ├── /evaluations/                        # POST /, GET /received, GET /given
///     ├── /devices/                            # POST /, DELETE /:token
///     └── /admin/notifications/                # admin only
///         ├── GET|POST /
///         ├── POST /:id/read
///         └── GET  /stream                     # SSE
/// ```
///
/// # Middleware Stack
///
/// Applied outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Compression (SSE responses are left alone)
/// 4. Request tracing
/// 5. Authentication and the admin gate (per route group)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/profile", put(routes::auth::update_profile))
        .route("/auth/upgrade-level", put(routes::ai::upgrade_level))
        .route("/users", get(routes::users::list_users))
        .route("/lessons", get(routes::lessons::list_lessons))
        .route("/lessons/content/:id", get(routes::lessons::lesson_content))
        .route("/lessons/nav/:id", get(routes::lessons::lesson_nav))
        .route("/lessons/:id/quiz", post(routes::lessons::submit_quiz))
        .route(
            "/project-hub",
            get(routes::project_hub::list_projects).post(routes::project_hub::create_project),
        )
        .route(
            "/project-hub/:id",
            get(routes::project_hub::get_project)
                .put(routes::project_hub::update_project)
                .delete(routes::project_hub::delete_project),
        )
        .route("/project-hub/:id/like", post(routes::project_hub::toggle_like))
        .route("/project-hub/:id/comment", post(routes::project_hub::add_comment))
        .route("/project-hub/:id/comments", get(routes::project_hub::list_comments))
        .route(
            "/ai-local/evaluate-basic-project",
            post(routes::ai::evaluate_basic_project),
        )
        .route("/ai-local/project-progress", get(routes::ai::project_progress))
        .route("/ai-local/steps", get(routes::ai::steps))
        .route("/evaluations", post(routes::evaluations::upsert_evaluation))
        .route("/evaluations/received", get(routes::evaluations::list_received))
        .route("/evaluations/given", get(routes::evaluations::list_given))
        .route("/devices", post(routes::devices::register_device))
        .route("/devices/:token", delete(routes::devices::unregister_device))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let admin_routes = Router::new()
        .route(
            "/admin/notifications",
            get(routes::admin_notifications::list_notifications)
                .post(routes::admin_notifications::broadcast),
        )
        .route(
            "/admin/notifications/:id/read",
            post(routes::admin_notifications::mark_read),
        )
        .route(
            "/admin/notifications/stream",
            get(routes::admin_notifications::stream),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
