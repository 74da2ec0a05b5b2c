//! Common test utilities for integration tests
//!
//! - Scorer and push doubles
//! - Router construction over a lazy pool (no database needed)
//! - Database-backed test context with seeded users
//! - JWT token generation and request helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use htmlquest_api::{
    app::{build_router, AppState},
    config::Config,
};
use htmlquest_shared::{
    auth::jwt::{create_token, Claims, TokenType},
    db::pool::{create_lazy_pool, DatabaseConfig},
    evaluator::{Scorer, ScorerError, StepScore},
    models::user::{CreateUser, User, UserRole},
    push::{PushError, PushGateway, PushMessage},
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// Scorer that answers with a queue of scores, repeating the last one.
pub struct MockScorer {
    scores: Mutex<Vec<u8>>,
    fail: bool,
}

impl MockScorer {
    pub fn fixed(score: u8) -> Self {
        Self::sequence(vec![score])
    }

    pub fn sequence(scores: Vec<u8>) -> Self {
        Self {
            scores: Mutex::new(scores),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            scores: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, step: u8, _instruction: &str, _code: &str) -> Result<StepScore, ScorerError> {
        if self.fail {
            return Err(ScorerError::Status(502));
        }

        let mut scores = self.scores.lock().unwrap();
        let score = if scores.len() > 1 {
            scores.remove(0)
        } else {
            scores.first().copied().unwrap_or(0)
        };

        Ok(StepScore {
            score,
            feedback: format!("step {} scored {}", step, score),
        })
    }
}

/// Push gateway that records what it was asked to send.
#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<(String, PushMessage)>>,
}

#[async_trait]
impl PushGateway for RecordingPush {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));
        Ok(())
    }
}

/// Issues an access token for an arbitrary identity.
pub fn token_for(user_id: Uuid, role: UserRole) -> String {
    let claims = Claims::new(user_id, role, TokenType::Access);
    create_token(&claims, TEST_SECRET).unwrap()
}

/// Router over a pool that never connects; for paths that stop before the database.
pub fn offline_app() -> Router {
    let config = Config::for_tests("postgresql://127.0.0.1:1/unused", TEST_SECRET);
    let db = create_lazy_pool(&DatabaseConfig {
        url: config.database.url.clone(),
        min_connections: 0,
        acquire_timeout_seconds: 1,
        ..Default::default()
    })
    .unwrap();

    build_router(AppState::new(
        db,
        config,
        Arc::new(MockScorer::fixed(100)),
        Arc::new(RecordingPush::default()),
    ))
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Database-backed context. Requires `DATABASE_URL`.
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub push: Arc<RecordingPush>,
    pub student: User,
    pub supervisor: User,
    pub admin: User,
}

impl TestContext {
    pub async fn new(scorer: MockScorer) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")?;

        let db = PgPool::connect(&url).await?;
        sqlx::migrate!("../migrations").run(&db).await?;

        let student = create_user(&db, "Student", UserRole::Student).await?;
        let supervisor = create_user(&db, "Supervisor", UserRole::Supervisor).await?;
        let admin = create_user(&db, "Admin", UserRole::Admin).await?;

        let push = Arc::new(RecordingPush::default());
        let state = AppState::new(
            db.clone(),
            Config::for_tests(url, TEST_SECRET),
            Arc::new(scorer),
            push.clone(),
        );

        Ok(Self {
            db,
            app: build_router(state),
            push,
            student,
            supervisor,
            admin,
        })
    }

    pub fn token(&self, user: &User) -> String {
        token_for(user.id, user.role)
    }

    /// Deletes the seeded users; dependent rows cascade.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(vec![self.student.id, self.supervisor.id, self.admin.id])
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

pub async fn create_user(db: &PgPool, name: &str, role: UserRole) -> anyhow::Result<User> {
    Ok(User::create(
        db,
        CreateUser {
            name: name.to_string(),
            email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
            role,
        },
    )
    .await?)
}
