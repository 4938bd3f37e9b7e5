//! Collaborator traits for the question provider and the scoring service.
//!
//! These async traits are implemented by the `quizline-client` crate.
//! Implementations should return `BackendError` (wrapped in `anyhow::Error`)
//! so the controller can tell transient failures from permanent ones.

use async_trait::async_trait;

use crate::model::{Locale, Question, ScoreResponse, SubmissionPayload};

/// Source of the localized question bank.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the ordered question list for `locale`.
    async fn fetch_questions(&self, locale: Locale) -> anyhow::Result<Vec<Question>>;
}

/// Service that grades submitted answers.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Submit answers and contact details, returning the correct-answer count.
    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<ScoreResponse>;
}
