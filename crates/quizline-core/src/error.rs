//! Error types for quiz sessions and their backends.
//!
//! `BackendError` is defined here rather than in `quizline-client` so the
//! controller can downcast and classify failures for retry decisions without
//! string matching.

use thiserror::Error;

use crate::session::Phase;
use crate::validation::ContactError;

/// Errors that can occur when talking to the question provider or the
/// scoring service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl BackendError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            BackendError::ApiError { status, .. } => (400..500).contains(status),
            BackendError::InvalidResponse(_) => true,
            _ => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            BackendError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors returned when a session operation is invoked with its
/// preconditions unmet. The session state is left untouched.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// The operation is not available in the current phase.
    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    /// Submission is only possible from the last question.
    #[error("submit is only available on the last question (at {index} of {total})")]
    NotAtLastQuestion { index: usize, total: usize },

    /// The selected option is not one of the current question's options.
    #[error("'{option}' is not an option of question {question_id}")]
    UnknownOption { option: String, question_id: String },

    /// The contact record failed validation.
    #[error("invalid contact details: {0}")]
    InvalidContact(#[from] ContactError),
}
