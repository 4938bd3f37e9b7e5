//! Core data model types for quizline.
//!
//! Questions and scores cross the wire as JSON, so the wire types here carry
//! the field names the quiz backend speaks (`questionId`, `correctAnswers`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Opaque identifier, unique within a session.
    #[serde(alias = "_id")]
    pub id: String,
    /// The prompt shown to the user.
    pub question: String,
    /// Answer options, in display order.
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    /// Whether `option` is one of this question's declared options.
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Languages the question bank is available in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Hindi,
}

impl Locale {
    /// All supported locales, in selector order.
    pub const ALL: [Locale; 2] = [Locale::English, Locale::Hindi];

    /// The value sent as the `language` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Locale::English => "english",
            Locale::Hindi => "hindi",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::English => write!(f, "English"),
            Locale::Hindi => write!(f, "Hindi"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Locale::English),
            "hindi" | "hi" => Ok(Locale::Hindi),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// Free-text contact details submitted alongside the answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Positional record of the selected option for each question.
///
/// Always the same length as the question list it was created for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    slots: Vec<Option<String>>,
}

impl AnswerSet {
    /// An answer set with `len` unset slots.
    pub fn unset(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The answer recorded at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// Record `answer` at `index`. `None` clears the slot. Out-of-range
    /// indices are ignored.
    pub fn set(&mut self, index: usize, answer: Option<String>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = answer;
        }
    }

    /// Number of slots holding an answer.
    pub fn answered(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.slots.iter().map(|s| s.as_deref())
    }
}

/// One entry of the submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    /// The selected option, or the empty string when unanswered.
    pub answer: String,
}

/// Body of the `POST /submit` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub answers: Vec<AnswerEntry>,
}

impl SubmissionPayload {
    /// Pair every question with its recorded answer, unset slots becoming
    /// the empty string.
    pub fn build(questions: &[Question], answers: &AnswerSet, contact: &Contact) -> Self {
        let answers = questions
            .iter()
            .enumerate()
            .map(|(i, q)| AnswerEntry {
                question_id: q.id.clone(),
                answer: answers.get(i).unwrap_or_default().to_string(),
            })
            .collect();

        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            answers,
        }
    }
}

/// Response of the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub correct_answers: u32,
}

/// Outcome of a submitted quiz, computed once from the scoring response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub correct: u32,
    pub total: u32,
    pub percentage_correct: f64,
    pub percentage_wrong: f64,
    pub submitted_at: DateTime<Utc>,
}

impl QuizResult {
    /// Derive the percentages for `correct` out of `total` answers.
    ///
    /// Returns `None` when `total` is zero or `correct` exceeds `total`.
    pub fn compute(correct: u32, total: u32) -> Option<Self> {
        if total == 0 || correct > total {
            return None;
        }
        let percentage = |count: u32| f64::from(count) * 100.0 / f64::from(total);
        Some(Self {
            correct,
            total,
            percentage_correct: percentage(correct),
            percentage_wrong: percentage(total - correct),
            submitted_at: Utc::now(),
        })
    }

    pub fn wrong(&self) -> u32 {
        self.total - self.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, options: &[&str]) -> Question {
        Question {
            id: id.into(),
            question: format!("Question {id}?"),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn locale_display_and_parse() {
        assert_eq!(Locale::English.to_string(), "English");
        assert_eq!(Locale::Hindi.as_query(), "hindi");
        assert_eq!("English".parse::<Locale>().unwrap(), Locale::English);
        assert_eq!(" HINDI ".parse::<Locale>().unwrap(), Locale::Hindi);
        assert_eq!("hi".parse::<Locale>().unwrap(), Locale::Hindi);
        assert!("french".parse::<Locale>().is_err());
    }

    #[test]
    fn question_accepts_underscore_id() {
        let json =
            r#"{"_id": "64ab", "question": "Capital of India?", "options": ["Delhi", "Agra"]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, "64ab");
        assert!(q.has_option("Delhi"));
        assert!(!q.has_option("delhi"));
    }

    #[test]
    fn answer_set_set_and_clear() {
        let mut answers = AnswerSet::unset(3);
        assert_eq!(answers.len(), 3);
        assert_eq!(answers.answered(), 0);

        answers.set(1, Some("B".into()));
        assert_eq!(answers.get(1), Some("B"));
        assert_eq!(answers.answered(), 1);

        answers.set(1, None);
        assert_eq!(answers.get(1), None);

        answers.set(7, Some("ignored".into()));
        assert_eq!(answers.len(), 3);
    }

    #[test]
    fn payload_sends_unset_answers_as_empty() {
        let questions = vec![
            question("q1", &["A", "B"]),
            question("q2", &["C", "D"]),
            question("q3", &["E", "F"]),
        ];
        let mut answers = AnswerSet::unset(3);
        answers.set(0, Some("A".into()));
        answers.set(1, Some("D".into()));
        let contact = Contact {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: "+91 98765 43210".into(),
        };

        let payload = SubmissionPayload::build(&questions, &answers, &contact);
        assert_eq!(payload.answers.len(), 3);
        assert_eq!(payload.answers[2].question_id, "q3");
        assert_eq!(payload.answers[2].answer, "");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["answers"][0]["questionId"], "q1");
        assert_eq!(json["answers"][1]["answer"], "D");
        assert_eq!(json["name"], "Asha");
    }

    #[test]
    fn score_response_parses_camel_case() {
        let resp: ScoreResponse =
            serde_json::from_str(r#"{"correctAnswers": 7, "message": "ok"}"#).unwrap();
        assert_eq!(resp.correct_answers, 7);
    }

    #[test]
    fn result_half_correct() {
        let result = QuizResult::compute(2, 4).unwrap();
        assert_eq!(result.percentage_correct, 50.0);
        assert_eq!(result.percentage_wrong, 50.0);
        assert_eq!(result.wrong(), 2);
    }

    #[test]
    fn result_percentages_sum_to_hundred() {
        for total in 1..=200u32 {
            for correct in 0..=total {
                let r = QuizResult::compute(correct, total).unwrap();
                assert_eq!(r.percentage_correct + r.percentage_wrong, 100.0);
                let expected = 100.0 * f64::from(correct) / f64::from(total);
                assert!((r.percentage_correct - expected).abs() < 1e-9);
                assert_eq!(
                    r.percentage_wrong,
                    f64::from(total - correct) * 100.0 / f64::from(total)
                );
            }
        }
    }

    #[test]
    fn wrong_percentage_uses_wrong_count() {
        let r = QuizResult::compute(1, 3).unwrap();
        assert_eq!(r.percentage_wrong, 200.0 / 3.0);
        assert_eq!(r.wrong(), 2);
    }

    #[test]
    fn result_rejects_zero_total_and_overflow() {
        assert!(QuizResult::compute(0, 0).is_none());
        assert!(QuizResult::compute(5, 4).is_none());
    }
}
