//! Quiz session controller.
//!
//! Drives a [`QuizSession`] against a question provider and a scoring
//! service: question loads are abortable, bounded by a timeout, and retried
//! on transient failures; submissions are bounded by a timeout and never
//! retried automatically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use tracing::instrument;

use crate::error::{BackendError, SessionError};
use crate::model::{Contact, Locale, Question, QuizResult};
use crate::session::{Completion, Phase, QuizSession, QuizSnapshot, RequestToken};
use crate::traits::{QuestionProvider, ScoringService};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Configuration for the quiz controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Upper bound on each network call.
    pub request_timeout: Duration,
    /// Retries on transient question-load failures.
    pub max_load_retries: u32,
    /// Delay before the first retry; doubled after each attempt.
    pub retry_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_load_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// A question load that has been started but not yet delivered.
///
/// Awaiting [`PendingLoad::finish`] drives the request. The load is aborted
/// if the controller starts another one first, so this can be spawned onto a
/// runtime while the user keeps interacting.
pub struct PendingLoad {
    token: RequestToken,
    task: Abortable<BoxFuture<'static, anyhow::Result<Vec<Question>>>>,
}

impl PendingLoad {
    /// Run the load to completion (or until aborted).
    pub async fn finish(self) -> FinishedLoad {
        let outcome = match self.task.await {
            Ok(result) => Some(result.map_err(|e| format!("{e:#}"))),
            Err(_aborted) => None,
        };
        FinishedLoad {
            token: self.token,
            outcome,
        }
    }
}

/// The outcome of a [`PendingLoad`], to be handed back to
/// [`QuizController::complete_load`].
#[derive(Debug)]
pub struct FinishedLoad {
    token: RequestToken,
    /// `None` when the load was aborted.
    outcome: Option<Result<Vec<Question>, String>>,
}

impl FinishedLoad {
    pub fn was_aborted(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Result of a submission that reached the scoring service.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Reported(QuizResult),
    /// The session is back in `Presenting`; the message describes the failure.
    Failed(String),
}

/// Owns a quiz session and performs its network calls.
pub struct QuizController {
    provider: Arc<dyn QuestionProvider>,
    scoring: Arc<dyn ScoringService>,
    config: ControllerConfig,
    session: QuizSession,
    inflight_load: Option<AbortHandle>,
}

impl QuizController {
    /// Create a controller in `Loading` for `locale`. No request is issued
    /// until [`select_locale`](Self::select_locale) or
    /// [`begin_load`](Self::begin_load) is called.
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        scoring: Arc<dyn ScoringService>,
        locale: Locale,
        config: ControllerConfig,
    ) -> Self {
        Self {
            provider,
            scoring,
            config,
            session: QuizSession::new(locale),
            inflight_load: None,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Switch to `locale` and start fetching its questions. Any load still
    /// in flight is aborted.
    pub fn begin_load(&mut self, locale: Locale) -> PendingLoad {
        if let Some(previous) = self.inflight_load.take() {
            previous.abort();
        }

        let token = self.session.begin_load(locale);
        tracing::info!(
            session = %self.session.id(),
            %locale,
            %token,
            provider = self.provider.name(),
            "loading questions"
        );

        let fetch = fetch_with_retries(Arc::clone(&self.provider), locale, self.config.clone());
        let (task, handle) = futures::future::abortable(fetch);
        self.inflight_load = Some(handle);

        PendingLoad { token, task }
    }

    /// Apply a finished load. Aborted and superseded loads are discarded.
    pub fn complete_load(&mut self, finished: FinishedLoad) -> Completion {
        let Some(outcome) = finished.outcome else {
            tracing::debug!(token = %finished.token, "question load was aborted");
            return Completion::Stale;
        };

        if let Err(message) = &outcome {
            tracing::warn!(token = %finished.token, "question load failed: {message}");
        }

        let completion = self.session.finish_load(finished.token, outcome);
        if completion == Completion::Applied {
            self.inflight_load = None;
            tracing::info!(
                session = %self.session.id(),
                phase = %self.session.phase(),
                questions = self.session.questions().len(),
                "question load complete"
            );
        }
        completion
    }

    /// Switch to `locale` and wait for its questions.
    pub async fn select_locale(&mut self, locale: Locale) -> Completion {
        let pending = self.begin_load(locale);
        let finished = pending.finish().await;
        self.complete_load(finished)
    }

    /// Fetch the current locale's questions again, e.g. after a load failure.
    pub async fn retry_load(&mut self) -> Completion {
        self.select_locale(self.session.locale()).await
    }

    // -----------------------------------------------------------------------
    // Answering and navigation
    // -----------------------------------------------------------------------

    pub fn select_option(&mut self, option: &str) -> Result<(), SessionError> {
        self.session.select_option(option)
    }

    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        self.session.clear_answer()
    }

    pub fn advance(&mut self) -> Result<bool, SessionError> {
        self.session.advance()
    }

    pub fn retreat(&mut self) -> Result<bool, SessionError> {
        self.session.retreat()
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Submit the answers with `contact` and wait for the score.
    ///
    /// Precondition failures (wrong phase, not on the last question, invalid
    /// contact) are returned as `Err` with the session untouched. Backend
    /// failures are reported as [`SubmitOutcome::Failed`] and leave the
    /// session presenting with its answers intact.
    #[instrument(skip(self, contact), fields(session = %self.session.id()))]
    pub async fn submit(&mut self, contact: Contact) -> Result<SubmitOutcome, SessionError> {
        let (token, payload) = self.session.begin_submit(contact)?;
        tracing::info!(
            %token,
            answered = self.session.answers().answered(),
            total = payload.answers.len(),
            "submitting answers"
        );

        let response = with_timeout(self.config.request_timeout, self.scoring.submit(&payload))
            .await
            .map_err(|e| format!("{e:#}"));

        self.session.finish_submit(token, response);

        match (self.session.phase(), self.session.result()) {
            (Phase::Reported, Some(result)) => {
                tracing::info!(
                    correct = result.correct,
                    total = result.total,
                    "quiz scored {:.1}%",
                    result.percentage_correct
                );
                Ok(SubmitOutcome::Reported(result.clone()))
            }
            _ => {
                let message = self
                    .session
                    .submit_error()
                    .unwrap_or("submission was not applied")
                    .to_string();
                tracing::warn!("submission failed: {message}");
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        self.session.snapshot()
    }

    pub fn locale(&self) -> Locale {
        self.session.locale()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }
}

/// Bound `fut` by `limit`, mapping expiry to [`BackendError::Timeout`].
async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(BackendError::Timeout(limit.as_secs()).into()),
    }
}

/// Fetch questions, retrying transient failures with exponential backoff.
fn fetch_with_retries(
    provider: Arc<dyn QuestionProvider>,
    locale: Locale,
    config: ControllerConfig,
) -> BoxFuture<'static, anyhow::Result<Vec<Question>>> {
    async move {
        let mut delay = config.retry_delay.min(MAX_RETRY_DELAY);
        let mut attempt = 0u32;
        loop {
            let err = match with_timeout(config.request_timeout, provider.fetch_questions(locale))
                .await
            {
                Ok(questions) => return Ok(questions),
                Err(e) => e,
            };

            let backend = err.downcast_ref::<BackendError>();
            let permanent = backend.is_some_and(BackendError::is_permanent);
            let retry_after = backend.and_then(BackendError::retry_after_ms);
            if permanent || attempt >= config.max_load_retries {
                return Err(err);
            }

            if let Some(ms) = retry_after {
                delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
            }
            attempt += 1;
            tracing::warn!(
                %locale,
                attempt,
                "question load failed ({err:#}), retrying in {delay:?}"
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }
    }
    .boxed()
}
