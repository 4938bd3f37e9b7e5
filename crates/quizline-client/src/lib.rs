//! quizline-client: Question provider and scoring service integrations.
//!
//! Implements the `QuestionProvider` and `ScoringService` traits over HTTP,
//! plus an in-memory mock backend, and loads quizline configuration.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{create_backend, load_config_from, QuizlineConfig};
pub use http::HttpQuizBackend;
pub use mock::MockBackend;
pub use quizline_core::error::BackendError;
