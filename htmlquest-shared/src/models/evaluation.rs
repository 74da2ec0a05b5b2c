/// Supervisor/student evaluations
///
/// One row per (direction, evaluator, evaluatee). Writes are upserts: the
/// latest rating and comment win and `updated_at` moves on every write.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE evaluation_direction AS ENUM ('supervisor_to_student', 'student_to_supervisor');
///
/// CREATE TABLE evaluations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     direction evaluation_direction NOT NULL,
///     evaluator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     evaluatee_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
///     comment TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT evaluations_direction_pair_key UNIQUE (direction, evaluator_id, evaluatee_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRole;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "evaluation_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvaluationDirection {
    SupervisorToStudent,
    StudentToSupervisor,
}

impl EvaluationDirection {
    /// Roles allowed to write an evaluation in this direction
    pub fn evaluator_roles(&self) -> &'static [UserRole] {
        match self {
            EvaluationDirection::SupervisorToStudent => &[UserRole::Supervisor, UserRole::Admin],
            EvaluationDirection::StudentToSupervisor => &[UserRole::Student],
        }
    }

    /// Role the evaluatee must hold
    pub fn evaluatee_role(&self) -> UserRole {
        match self {
            EvaluationDirection::SupervisorToStudent => UserRole::Student,
            EvaluationDirection::StudentToSupervisor => UserRole::Supervisor,
        }
    }
}

/// Rounds and clamps any submitted rating into `[MIN_RATING, MAX_RATING]`.
///
/// NaN maps to `MIN_RATING`.
pub fn clamp_rating(rating: f64) -> i16 {
    if rating.is_nan() {
        return MIN_RATING;
    }
    rating
        .round()
        .clamp(f64::from(MIN_RATING), f64::from(MAX_RATING)) as i16
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Evaluation {
    pub id: Uuid,
    pub direction: EvaluationDirection,
    pub evaluator_id: Uuid,
    pub evaluatee_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Evaluation joined with the other party's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EvaluationEntry {
    pub id: Uuid,
    pub direction: EvaluationDirection,
    pub evaluator_id: Uuid,
    pub evaluator_name: String,
    pub evaluatee_id: Uuid,
    pub evaluatee_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertEvaluation {
    pub direction: EvaluationDirection,
    pub evaluator_id: Uuid,
    pub evaluatee_id: Uuid,
    /// Raw rating; rounded and clamped on write
    pub rating: f64,
    pub comment: Option<String>,
}

const ENTRY_SELECT: &str = r#"
    SELECT e.id, e.direction, e.evaluator_id, er.name AS evaluator_name,
           e.evaluatee_id, ee.name AS evaluatee_name, e.rating, e.comment,
           e.created_at, e.updated_at
    FROM evaluations e
    JOIN users er ON er.id = e.evaluator_id
    JOIN users ee ON ee.id = e.evaluatee_id
"#;

impl Evaluation {
    pub async fn upsert(pool: &PgPool, data: UpsertEvaluation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Evaluation>(
            r#"
            INSERT INTO evaluations (direction, evaluator_id, evaluatee_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT evaluations_direction_pair_key DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING id, direction, evaluator_id, evaluatee_id, rating, comment,
                      created_at, updated_at
            "#,
        )
        .bind(data.direction)
        .bind(data.evaluator_id)
        .bind(data.evaluatee_id)
        .bind(clamp_rating(data.rating))
        .bind(data.comment)
        .fetch_one(pool)
        .await
    }

    /// Evaluations about `user_id`, most recently updated first
    pub async fn list_received(pool: &PgPool, user_id: Uuid) -> Result<Vec<EvaluationEntry>, sqlx::Error> {
        let query = format!("{} WHERE e.evaluatee_id = $1 ORDER BY e.updated_at DESC", ENTRY_SELECT);

        sqlx::query_as::<_, EvaluationEntry>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Evaluations written by `user_id`, most recently updated first
    pub async fn list_given(pool: &PgPool, user_id: Uuid) -> Result<Vec<EvaluationEntry>, sqlx::Error> {
        let query = format!("{} WHERE e.evaluator_id = $1 ORDER BY e.updated_at DESC", ENTRY_SELECT);

        sqlx::query_as::<_, EvaluationEntry>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_rating() {
        for raw in [-100.0, -1.0, 0.0, 1.0, 1.4] {
            assert_eq!(clamp_rating(raw), 1);
        }
        for raw in 1..=5 {
            assert_eq!(clamp_rating(f64::from(raw)), raw as i16);
        }
        for raw in [6.0, 10.0, 1e300, f64::INFINITY] {
            assert_eq!(clamp_rating(raw), 5);
        }
        assert_eq!(clamp_rating(4.5), 5);
        assert_eq!(clamp_rating(2.49), 2);
        assert_eq!(clamp_rating(f64::NEG_INFINITY), 1);
        assert_eq!(clamp_rating(f64::NAN), 1);
    }

    #[test]
    fn test_direction_roles() {
        let down = EvaluationDirection::SupervisorToStudent;
        assert!(down.evaluator_roles().contains(&UserRole::Supervisor));
        assert!(down.evaluator_roles().contains(&UserRole::Admin));
        assert_eq!(down.evaluatee_role(), UserRole::Student);

        let up = EvaluationDirection::StudentToSupervisor;
        assert_eq!(up.evaluator_roles(), &[UserRole::Student]);
        assert_eq!(up.evaluatee_role(), UserRole::Supervisor);
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(
            serde_json::to_string(&EvaluationDirection::SupervisorToStudent).unwrap(),
            "\"supervisor_to_student\""
        );
        let parsed: EvaluationDirection = serde_json::from_str("\"student_to_supervisor\"").unwrap();
        assert_eq!(parsed, EvaluationDirection::StudentToSupervisor);
    }
}
