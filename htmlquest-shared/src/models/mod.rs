/// Database models for HTMLQuest
///
/// Each module owns one table (or a table and its ledger) and exposes the
/// queries the handlers need as associated functions taking a pool or
/// executor.
///
/// # Models
///
/// - `user`: accounts, roles, level and badge
/// - `lesson`: seeded lesson catalogue with quizzes
/// - `progress`: per-learner lesson progress and quiz results
/// - `project`: project hub entries and the like ledger
/// - `comment`: project comments (one level of replies)
/// - `evaluation`: supervisor/student ratings
/// - `project_progress`: persisted state of the basic-project evaluator
/// - `device_token`: push registration per device
/// - `notification`: admin notification feed
///
/// # Example
///
/// ```no_run
/// use htmlquest_shared::db::pool::{create_pool, DatabaseConfig};
/// use htmlquest_shared::models::lesson::Lesson;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// for lesson in Lesson::list_summaries(&pool).await? {
///     println!("{}. {}", lesson.position, lesson.title);
/// }
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod device_token;
pub mod evaluation;
pub mod lesson;
pub mod notification;
pub mod progress;
pub mod project;
pub mod project_progress;
pub mod user;
