//! In-memory quiz backend.
//!
//! Serves fixed per-locale question banks and grades submissions against an
//! answer key, so sessions can be exercised without a quiz service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizline_core::error::BackendError;
use quizline_core::model::{Locale, Question, ScoreResponse, SubmissionPayload};
use quizline_core::traits::{QuestionProvider, ScoringService};

/// A mock backend implementing both collaborator traits.
pub struct MockBackend {
    /// Question banks keyed by locale. Missing locales yield no questions.
    banks: HashMap<Locale, Vec<Question>>,
    /// Map of question id → correct option.
    answer_key: HashMap<String, String>,
    /// When set, every submission fails with this HTTP status.
    submit_failure: Option<u16>,
    fetch_count: AtomicU32,
    submit_count: AtomicU32,
    last_payload: Mutex<Option<SubmissionPayload>>,
}

impl MockBackend {
    /// Create a mock with the given banks and answer key.
    pub fn new(banks: HashMap<Locale, Vec<Question>>, answer_key: HashMap<String, String>) -> Self {
        Self {
            banks,
            answer_key,
            submit_failure: None,
            fetch_count: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            last_payload: Mutex::new(None),
        }
    }

    /// A small built-in bilingual bank.
    pub fn sample() -> Self {
        let english = vec![
            question(
                "en-1",
                "What is the capital of India?",
                &["Mumbai", "New Delhi", "Kolkata", "Chennai"],
            ),
            question("en-2", "How many states does India have?", &["25", "28", "29", "31"]),
            question(
                "en-3",
                "Which river is the longest in India?",
                &["Ganga", "Yamuna", "Godavari", "Narmada"],
            ),
            question(
                "en-4",
                "In which year did India become a republic?",
                &["1947", "1950", "1952", "1962"],
            ),
        ];
        let hindi = vec![
            question(
                "hi-1",
                "भारत की राजधानी क्या है?",
                &["मुंबई", "नई दिल्ली", "कोलकाता", "चेन्नई"],
            ),
            question("hi-2", "भारत में कितने राज्य हैं?", &["25", "28", "29", "31"]),
            question(
                "hi-3",
                "भारत की सबसे लंबी नदी कौन सी है?",
                &["गंगा", "यमुना", "गोदावरी", "नर्मदा"],
            ),
            question("hi-4", "भारत किस वर्ष गणराज्य बना?", &["1947", "1950", "1952", "1962"]),
        ];

        let answer_key = [
            ("en-1", "New Delhi"),
            ("en-2", "28"),
            ("en-3", "Ganga"),
            ("en-4", "1950"),
            ("hi-1", "नई दिल्ली"),
            ("hi-2", "28"),
            ("hi-3", "गंगा"),
            ("hi-4", "1950"),
        ]
        .into_iter()
        .map(|(id, answer)| (id.to_string(), answer.to_string()))
        .collect();

        let banks = HashMap::from([(Locale::English, english), (Locale::Hindi, hindi)]);
        Self::new(banks, answer_key)
    }

    /// Make every submission fail with `status`.
    pub fn failing_submissions(mut self, status: u16) -> Self {
        self.submit_failure = Some(status);
        self
    }

    /// Number of question fetches made.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Number of submissions received.
    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::Relaxed)
    }

    /// The last submission received.
    pub fn last_payload(&self) -> Option<SubmissionPayload> {
        self.last_payload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn grade(&self, payload: &SubmissionPayload) -> u32 {
        payload
            .answers
            .iter()
            .filter(|entry| {
                self.answer_key
                    .get(&entry.question_id)
                    .is_some_and(|correct| *correct == entry.answer)
            })
            .count() as u32
    }
}

fn question(id: &str, prompt: &str, options: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        question: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

#[async_trait]
impl QuestionProvider for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_questions(&self, locale: Locale) -> anyhow::Result<Vec<Question>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.banks.get(&locale).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ScoringService for MockBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<ScoreResponse> {
        self.submit_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_payload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(payload.clone());

        if let Some(status) = self.submit_failure {
            return Err(BackendError::ApiError {
                status,
                message: "mock submission failure".into(),
            }
            .into());
        }

        Ok(ScoreResponse {
            correct_answers: self.grade(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quizline_core::model::{AnswerSet, Contact};

    fn contact() -> Contact {
        Contact {
            name: "Test".into(),
            email: "test@example.com".into(),
            phone: "9999999999".into(),
        }
    }

    #[tokio::test]
    async fn serves_banks_per_locale() {
        let mock = MockBackend::sample();

        let english = mock.fetch_questions(Locale::English).await.unwrap();
        let hindi = mock.fetch_questions(Locale::Hindi).await.unwrap();
        assert_eq!(english.len(), 4);
        assert_eq!(hindi.len(), 4);
        assert_eq!(hindi[0].id, "hi-1");
        assert_eq!(mock.fetch_count(), 2);
    }

    #[tokio::test]
    async fn missing_locale_is_empty() {
        let mock = MockBackend::new(HashMap::new(), HashMap::new());
        assert!(mock.fetch_questions(Locale::Hindi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grades_against_answer_key() {
        let mock = MockBackend::sample();
        let questions = mock.fetch_questions(Locale::English).await.unwrap();

        let mut answers = AnswerSet::unset(questions.len());
        answers.set(0, Some("New Delhi".into()));
        answers.set(1, Some("29".into()));
        answers.set(3, Some("1950".into()));
        let payload = SubmissionPayload::build(&questions, &answers, &contact());

        let score = mock.submit(&payload).await.unwrap();
        assert_eq!(score.correct_answers, 2);
        assert_eq!(mock.submit_count(), 1);
        assert_eq!(mock.last_payload().unwrap().answers[2].answer, "");
    }

    #[tokio::test]
    async fn failing_submissions_return_api_error() {
        let mock = MockBackend::sample().failing_submissions(503);
        let questions = mock.fetch_questions(Locale::English).await.unwrap();
        let payload =
            SubmissionPayload::build(&questions, &AnswerSet::unset(questions.len()), &contact());

        let err = mock.submit(&payload).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(mock.last_payload().is_some());
    }
}
