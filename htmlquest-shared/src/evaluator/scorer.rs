/// Scoring service client
///
/// The evaluator only depends on the [`Scorer`] trait. [`HttpScorer`] talks
/// to the external AI service:
///
/// ```text
/// POST {SCORER_URL}
/// { "step": 2, "instruction": "...", "code": "<!DOCTYPE html>..." }
///
/// 200 OK
/// { "score": 83, "feedback": "..." }
/// ```
///
/// Scores outside 0-100 are clamped; fractional scores are rounded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("Scoring request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Scoring service returned HTTP {0}")]
    Status(u16),

    #[error("Invalid scoring response: {0}")]
    InvalidResponse(String),
}

/// A clamped score with the service's feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepScore {
    pub score: u8,
    pub feedback: String,
}

#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, step: u8, instruction: &str, code: &str) -> Result<StepScore, ScorerError>;
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    step: u8,
    instruction: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
    #[serde(default)]
    feedback: Option<String>,
}

/// Clamps a raw score into 0-100.
pub fn clamp_score(raw: f64) -> Result<u8, ScorerError> {
    if !raw.is_finite() {
        return Err(ScorerError::InvalidResponse(format!("score {} is not a number", raw)));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// Scorer backed by an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpScorer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScorer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScorerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, step: u8, instruction: &str, code: &str) -> Result<StepScore, ScorerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScoreRequest {
                step,
                instruction,
                code,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScorerError::Status(status.as_u16()));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::InvalidResponse(e.to_string()))?;

        Ok(StepScore {
            score: clamp_score(body.score)?,
            feedback: body.feedback.unwrap_or_default(),
        })
    }
}
