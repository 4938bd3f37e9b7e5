//! HTTP quiz backend.
//!
//! Speaks the two endpoints of the quiz service:
//! `GET /quiz?language={locale}` and `POST /submit`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::instrument;

use quizline_core::error::BackendError;
use quizline_core::model::{Locale, Question, ScoreResponse, SubmissionPayload};
use quizline_core::traits::{QuestionProvider, ScoringService};

/// Default retry-after when a 429 carries no usable header, in seconds.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Question provider and scoring service backed by the quiz REST API.
pub struct HttpQuizBackend {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpQuizBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::NetworkError(e.to_string())
        }
    }

    /// Map the status line to an error, or parse the body as `T`.
    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, BackendError> {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(BackendError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status,
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("failed to parse {what}: {e}")))
    }
}

#[async_trait]
impl QuestionProvider for HttpQuizBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_questions(&self, locale: Locale) -> anyhow::Result<Vec<Question>> {
        let url = format!("{}/quiz?language={}", self.base_url, locale.as_query());
        tracing::debug!(%url, "fetching questions");

        let response = self
            .client
            .get(url.as_str())
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let questions: Vec<Question> = self.read_json(response, "question list").await?;
        tracing::debug!(count = questions.len(), "received questions");
        Ok(questions)
    }
}

#[async_trait]
impl ScoringService for HttpQuizBackend {
    #[instrument(
        skip(self, payload),
        fields(base_url = %self.base_url, answers = payload.answers.len())
    )]
    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<ScoreResponse> {
        let response = self
            .client
            .post(format!("{}/submit", self.base_url))
            .header("accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let score: ScoreResponse = self.read_json(response, "score").await?;
        tracing::debug!(correct = score.correct_answers, "received score");
        Ok(score)
    }
}
