/// Persisted evaluator flow
///
/// Loads the learner's progress, runs one submission through the state
/// machine and writes the result back. The certificate side effect (level and
/// badge) is written in the same transaction as the progress row.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::machine::{
    self, EvaluationState, StepOutcome, TransitionError, BASIC_PROJECT_STEPS,
    FINAL_STEP_INDEX, STEP_PASS_SCORE,
};
use super::scorer::Scorer;
use crate::models::project_progress::{ProjectProgress, ProjectStatus, SaveProgress};
use crate::models::user::{User, UserLevel};

/// Level granted with the certificate
pub const CERTIFICATE_LEVEL: UserLevel = UserLevel::Intermediate;

/// Badge granted with the certificate
pub const CERTIFICATE_BADGE: &str = "html-basics";

/// Shown when the scoring service cannot be reached
pub const SCORER_FALLBACK_MESSAGE: &str =
    "The evaluation service is unavailable right now. Your code was not scored; please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("The basic project is already finished")]
    AlreadyFinished,

    #[error("Submission is for step {supplied} but the current step is {expected}")]
    StepMismatch { expected: u8, supplied: u8 },

    #[error("Progress changed while this submission was being scored")]
    Conflict,

    #[error("{}", SCORER_FALLBACK_MESSAGE)]
    ScorerUnavailable,

    #[error("The basic-project certificate has not been earned")]
    NotCertified,

    #[error("User not found")]
    UserNotFound,

    #[error("Corrupt evaluator state: {0}")]
    CorruptState(TransitionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<TransitionError> for EvaluatorError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Finished => EvaluatorError::AlreadyFinished,
            TransitionError::AwaitingScore(_) | TransitionError::NotAwaitingScore(_) => {
                EvaluatorError::Conflict
            }
            TransitionError::StepOutOfRange(_) => EvaluatorError::CorruptState(err),
        }
    }
}

/// One step as listed to learners
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub index: u8,
    pub title: &'static str,
    pub instruction: &'static str,
}

pub fn step_list() -> Vec<StepInfo> {
    BASIC_PROJECT_STEPS
        .iter()
        .enumerate()
        .map(|(index, s)| StepInfo {
            index: index as u8,
            title: s.title,
            instruction: s.instruction,
        })
        .collect()
}

/// Learner-facing view of the evaluator state
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub current_step: u8,
    pub final_step: u8,
    pub status: ProjectStatus,
    pub certified: bool,
    pub last_score: Option<i16>,
    pub last_feedback: Option<String>,
    pub current_instruction: &'static str,
    pub steps: Vec<StepInfo>,
}

impl ProgressView {
    pub fn from_progress(progress: &ProjectProgress) -> Result<Self, EvaluatorError> {
        let state = EvaluationState::from_progress(progress).map_err(EvaluatorError::CorruptState)?;
        let current_step = state.current_step();

        Ok(Self {
            current_step,
            final_step: FINAL_STEP_INDEX,
            status: progress.status,
            certified: progress.status == ProjectStatus::Certified,
            last_score: progress.last_score,
            last_feedback: progress.last_feedback.clone(),
            current_instruction: machine::step(current_step)
                .map(|s| s.instruction)
                .unwrap_or_default(),
            steps: step_list(),
        })
    }
}

/// Response to one submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    /// Step that was scored
    pub step: u8,
    pub score: u8,
    pub feedback: String,
    pub passed: bool,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub progress: ProgressView,
}

pub async fn load_progress(pool: &PgPool, user_id: Uuid) -> Result<ProgressView, EvaluatorError> {
    let progress = ProjectProgress::ensure(pool, user_id).await?;
    ProgressView::from_progress(&progress)
}

/// Scores one submission and persists the transition.
///
/// `supplied_step`, when given, must equal the stored current step.
pub async fn submit(
    pool: &PgPool,
    scorer: &dyn Scorer,
    user_id: Uuid,
    code: &str,
    supplied_step: Option<u8>,
) -> Result<SubmissionResult, EvaluatorError> {
    let progress = ProjectProgress::ensure(pool, user_id).await?;
    let state = EvaluationState::from_progress(&progress).map_err(EvaluatorError::CorruptState)?;
    let pending = state.submit()?;
    let step = pending.current_step();

    if let Some(supplied) = supplied_step {
        if supplied != step {
            return Err(EvaluatorError::StepMismatch {
                expected: step,
                supplied,
            });
        }
    }

    let instruction = machine::step(step)
        .map(|s| s.instruction)
        .ok_or(EvaluatorError::CorruptState(TransitionError::StepOutOfRange(step as i16)))?;

    let scored = match scorer.score(step, instruction, code).await {
        Ok(scored) => scored,
        Err(e) => {
            // Nothing is written; the stored row already holds the restored state
            let restored = pending.scorer_failed();
            debug_assert_eq!(restored, state);
            tracing::warn!(
                user_id = %user_id,
                step = restored.current_step(),
                error = %e,
                "Scoring service call failed"
            );
            return Err(EvaluatorError::ScorerUnavailable);
        }
    };

    let (next, outcome) = pending.apply_score(scored.score)?;

    let save = match outcome {
        // A new step starts with a clean slate
        StepOutcome::Advanced { .. } => SaveProgress {
            current_step: next.current_step() as i16,
            status: next.status(),
            last_score: None,
            last_feedback: None,
        },
        _ => SaveProgress {
            current_step: next.current_step() as i16,
            status: next.status(),
            last_score: Some(scored.score as i16),
            last_feedback: Some(scored.feedback.clone()),
        },
    };

    let mut tx = pool.begin().await?;

    let saved = ProjectProgress::transition(&mut *tx, user_id, step as i16, save)
        .await?
        .ok_or(EvaluatorError::Conflict)?;

    if outcome == StepOutcome::CertificateAwarded {
        User::upgrade_level(&mut *tx, user_id, CERTIFICATE_LEVEL, CERTIFICATE_BADGE)
            .await?
            .ok_or(EvaluatorError::UserNotFound)?;
    }

    tx.commit().await?;

    tracing::info!(
        user_id = %user_id,
        step,
        score = scored.score,
        outcome = ?outcome,
        "Basic project submission scored"
    );

    Ok(SubmissionResult {
        step,
        score: scored.score,
        feedback: scored.feedback,
        passed: scored.score >= STEP_PASS_SCORE,
        outcome,
        progress: ProgressView::from_progress(&saved)?,
    })
}

/// Re-applies the certificate's level and badge. Safe to call repeatedly.
pub async fn reapply_certificate(pool: &PgPool, user_id: Uuid) -> Result<User, EvaluatorError> {
    let certified = ProjectProgress::find(pool, user_id)
        .await?
        .map(|p| p.status == ProjectStatus::Certified)
        .unwrap_or(false);

    if !certified {
        return Err(EvaluatorError::NotCertified);
    }

    User::upgrade_level(pool, user_id, CERTIFICATE_LEVEL, CERTIFICATE_BADGE)
        .await?
        .ok_or(EvaluatorError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(step: i16, status: ProjectStatus) -> ProjectProgress {
        ProjectProgress {
            user_id: Uuid::new_v4(),
            current_step: step,
            status,
            last_score: Some(64),
            last_feedback: Some("Close".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_step_list_is_ordered() {
        let steps = step_list();
        assert_eq!(steps.len(), FINAL_STEP_INDEX as usize + 1);
        for (i, s) in steps.iter().enumerate() {
            assert_eq!(s.index as usize, i);
            assert!(!s.instruction.is_empty());
        }
    }

    #[test]
    fn test_progress_view() {
        let view = ProgressView::from_progress(&row(2, ProjectStatus::InProgress)).unwrap();
        assert_eq!(view.current_step, 2);
        assert_eq!(view.final_step, FINAL_STEP_INDEX);
        assert!(!view.certified);
        assert_eq!(view.current_instruction, BASIC_PROJECT_STEPS[2].instruction);
        assert_eq!(view.last_score, Some(64));

        let done = ProgressView::from_progress(&row(6, ProjectStatus::Certified)).unwrap();
        assert!(done.certified);
    }

    #[test]
    fn test_progress_view_rejects_corrupt_step() {
        assert!(matches!(
            ProgressView::from_progress(&row(9, ProjectStatus::InProgress)),
            Err(EvaluatorError::CorruptState(_))
        ));
    }

    #[test]
    fn test_transition_error_mapping() {
        assert!(matches!(
            EvaluatorError::from(TransitionError::Finished),
            EvaluatorError::AlreadyFinished
        ));
        assert!(matches!(
            EvaluatorError::from(TransitionError::AwaitingScore(1)),
            EvaluatorError::Conflict
        ));
    }

    #[test]
    fn test_scorer_failure_restores_stored_state() {
        for step in 0..=FINAL_STEP_INDEX {
            let stored = row(step as i16, ProjectStatus::InProgress);
            let state = EvaluationState::from_progress(&stored).unwrap();
            let restored = state.submit().unwrap().scorer_failed();

            assert_eq!(restored, state);
            assert_eq!(restored.status(), stored.status);
            assert_eq!(restored.current_step() as i16, stored.current_step);
        }
    }

    #[test]
    fn test_fallback_message_is_display() {
        assert_eq!(EvaluatorError::ScorerUnavailable.to_string(), SCORER_FALLBACK_MESSAGE);
    }
}
