/// Stepwise basic-project evaluator
///
/// Learners build one HTML page over seven ordered steps. Each submission is
/// scored by an external service; a score of 70 moves to the next step and a
/// final-step score of 80 awards the certificate (level `intermediate`, badge
/// `html-basics`).
///
/// - `machine`: pure state transitions and the step list
/// - `scorer`: the [`Scorer`] seam and its HTTP client
/// - `service`: loads, scores and persists one submission
///
/// # Example
///
/// ```
/// use htmlquest_shared::evaluator::{EvaluationState, StepOutcome, FINAL_STEP_INDEX};
///
/// let pending = EvaluationState::InProgress { step: FINAL_STEP_INDEX }.submit().unwrap();
/// let (state, outcome) = pending.apply_score(85).unwrap();
///
/// assert_eq!(state, EvaluationState::CertificateAwarded);
/// assert_eq!(outcome, StepOutcome::CertificateAwarded);
/// ```

pub mod machine;
pub mod scorer;
pub mod service;

pub use machine::{
    EvaluationState, StepOutcome, TransitionError, BASIC_PROJECT_STEPS, CERTIFICATE_SCORE,
    FINAL_STEP_INDEX, STEP_PASS_SCORE,
};
pub use scorer::{HttpScorer, Scorer, ScorerError, StepScore};
pub use service::{EvaluatorError, ProgressView, StepInfo, SubmissionResult};
