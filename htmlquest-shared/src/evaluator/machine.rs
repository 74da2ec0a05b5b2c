/// Basic-project evaluator state machine
///
/// Pure transitions only; persistence and the scoring call live in
/// [`super::service`].
///
/// ```text
/// InProgress(s) --submit--> AwaitingScore(s)
/// AwaitingScore(s) --score < 70--> InProgress(s)
/// AwaitingScore(s) --score >= 70, s < FINAL--> InProgress(s + 1)
/// AwaitingScore(FINAL) --score >= 80--> CertificateAwarded
/// AwaitingScore(FINAL) --70 <= score < 80--> Passed(FINAL)
/// AwaitingScore(s) --scorer failure--> InProgress(s)
/// ```

use serde::{Deserialize, Serialize};

use crate::models::project_progress::{ProjectProgress, ProjectStatus};

/// Index of the last step (seven steps, `0..=6`)
pub const FINAL_STEP_INDEX: u8 = 6;

/// Minimum score that completes a step
pub const STEP_PASS_SCORE: u8 = 70;

/// Minimum final-step score that earns the certificate
pub const CERTIFICATE_SCORE: u8 = 80;

/// One instructional step of the basic project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasicProjectStep {
    pub title: &'static str,
    pub instruction: &'static str,
}

/// The basic project, in order. Length is `FINAL_STEP_INDEX + 1`.
pub const BASIC_PROJECT_STEPS: [BasicProjectStep; FINAL_STEP_INDEX as usize + 1] = [
    BasicProjectStep {
        title: "Document skeleton",
        instruction: "Write a complete HTML5 document: a <!DOCTYPE html> declaration, an <html> element with a lang attribute, and a <head> and <body>.",
    },
    BasicProjectStep {
        title: "Head metadata",
        instruction: "Inside <head>, add a UTF-8 <meta charset>, a responsive viewport <meta>, and a descriptive <title>.",
    },
    BasicProjectStep {
        title: "Page header and navigation",
        instruction: "Add a <header> containing an <h1> and a <nav> with an unordered list of at least three links to sections of the page.",
    },
    BasicProjectStep {
        title: "Main content sections",
        instruction: "Add a <main> element with at least two <section> elements, each with a heading and a paragraph. Use ids that match the navigation links.",
    },
    BasicProjectStep {
        title: "Images and media",
        instruction: "Add an <img> with meaningful alt text and explicit width and height, wrapped in a <figure> with a <figcaption>.",
    },
    BasicProjectStep {
        title: "Contact form",
        instruction: "Add a <form> with labelled name, email and message fields, appropriate input types, required attributes and a submit button.",
    },
    BasicProjectStep {
        title: "Footer and final review",
        instruction: "Add a <footer> with contact details and a copyright notice, then make sure the whole page is valid, semantic and properly indented.",
    },
];

/// Returns the step definition, if `step` is in range.
pub fn step(step: u8) -> Option<&'static BasicProjectStep> {
    BASIC_PROJECT_STEPS.get(step as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("The basic project is already finished")]
    Finished,

    #[error("A submission for step {0} is already being scored")]
    AwaitingScore(u8),

    #[error("Step {0} is not awaiting a score")]
    NotAwaitingScore(u8),

    #[error("Stored step {0} is out of range")]
    StepOutOfRange(i16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EvaluationState {
    InProgress { step: u8 },
    AwaitingScore { step: u8 },
    Passed { step: u8 },
    CertificateAwarded,
}

/// What a score did to the learner's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Below the pass mark; same step again
    Retry { step: u8 },
    /// Step completed; previous result cleared
    Advanced { next_step: u8 },
    /// Final step passed below the certificate mark
    PassedWithoutCertificate,
    CertificateAwarded,
}

impl EvaluationState {
    /// Rebuilds the state from a stored row.
    pub fn from_progress(progress: &ProjectProgress) -> Result<Self, TransitionError> {
        let step = u8::try_from(progress.current_step)
            .ok()
            .filter(|s| *s <= FINAL_STEP_INDEX)
            .ok_or(TransitionError::StepOutOfRange(progress.current_step))?;

        Ok(match progress.status {
            ProjectStatus::InProgress => EvaluationState::InProgress { step },
            ProjectStatus::Passed => EvaluationState::Passed { step },
            ProjectStatus::Certified => EvaluationState::CertificateAwarded,
        })
    }

    /// Step the learner is working on (the final step once finished)
    pub fn current_step(&self) -> u8 {
        match self {
            EvaluationState::InProgress { step }
            | EvaluationState::AwaitingScore { step }
            | EvaluationState::Passed { step } => *step,
            EvaluationState::CertificateAwarded => FINAL_STEP_INDEX,
        }
    }

    pub fn status(&self) -> ProjectStatus {
        match self {
            EvaluationState::InProgress { .. } | EvaluationState::AwaitingScore { .. } => {
                ProjectStatus::InProgress
            }
            EvaluationState::Passed { .. } => ProjectStatus::Passed,
            EvaluationState::CertificateAwarded => ProjectStatus::Certified,
        }
    }

    pub fn submit(self) -> Result<Self, TransitionError> {
        match self {
            EvaluationState::InProgress { step } => Ok(EvaluationState::AwaitingScore { step }),
            EvaluationState::AwaitingScore { step } => Err(TransitionError::AwaitingScore(step)),
            EvaluationState::Passed { .. } | EvaluationState::CertificateAwarded => {
                Err(TransitionError::Finished)
            }
        }
    }

    /// Applies a clamped score (0-100) to a pending submission.
    pub fn apply_score(self, score: u8) -> Result<(Self, StepOutcome), TransitionError> {
        let step = match self {
            EvaluationState::AwaitingScore { step } => step,
            other => return Err(TransitionError::NotAwaitingScore(other.current_step())),
        };

        if score < STEP_PASS_SCORE {
            return Ok((EvaluationState::InProgress { step }, StepOutcome::Retry { step }));
        }

        if step < FINAL_STEP_INDEX {
            let next_step = step + 1;
            return Ok((
                EvaluationState::InProgress { step: next_step },
                StepOutcome::Advanced { next_step },
            ));
        }

        if score >= CERTIFICATE_SCORE {
            Ok((EvaluationState::CertificateAwarded, StepOutcome::CertificateAwarded))
        } else {
            Ok((
                EvaluationState::Passed { step },
                StepOutcome::PassedWithoutCertificate,
            ))
        }
    }

    /// The scorer could not be reached; the learner stays on the same step.
    pub fn scorer_failed(self) -> Self {
        match self {
            EvaluationState::AwaitingScore { step } => EvaluationState::InProgress { step },
            other => other,
        }
    }
}
