/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, tokens and profile
/// - `users`: Role directory
/// - `lessons`: Lesson catalogue, gated content, navigation and quizzes
/// - `project_hub`: Projects, likes and comments
/// - `ai`: Stepwise basic-project evaluator and certificate
/// - `evaluations`: Supervisor/student ratings
/// - `devices`: Push token registration
/// - `admin_notifications`: Admin feed, broadcast and live stream

pub mod admin_notifications;
pub mod ai;
pub mod auth;
pub mod devices;
pub mod evaluations;
pub mod health;
pub mod lessons;
pub mod project_hub;
pub mod users;

use serde::Deserialize;
use validator::ValidationError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?limit=&offset=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Rejects text that is empty once trimmed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}
