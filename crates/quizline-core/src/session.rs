//! Quiz session state machine.
//!
//! `QuizSession` owns all quiz state and is mutated only through its named
//! operations. It performs no I/O: network work is requested through
//! `begin_*` calls that hand out a [`RequestToken`], and results are fed
//! back through the matching `finish_*` call. A completion whose token is
//! not the one currently expected is discarded, so a late response can never
//! overwrite newer state.
//!
//! ```text
//! Loading ──ok──▶ Presenting ──submit──▶ Submitting ──ok──▶ Reported
//!    │  └─empty─▶ NoQuizAvailable            │
//!    └──err──▶ LoadFailed      Presenting ◀──err
//! ```
//!
//! A locale change from any phase returns to `Loading`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{
    AnswerSet, Contact, Locale, Question, QuizResult, ScoreResponse, SubmissionPayload,
};
use crate::validation::validate_contact;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the question list.
    Loading,
    /// The question list could not be fetched; retry is possible.
    LoadFailed,
    /// The provider returned zero questions.
    NoQuizAvailable,
    /// Questions are shown and can be answered.
    Presenting,
    /// Answers are with the scoring service.
    Submitting,
    /// A result has been computed. Terminal until the locale changes.
    Reported,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Loading => "loading",
            Phase::LoadFailed => "load failed",
            Phase::NoQuizAvailable => "no quiz available",
            Phase::Presenting => "presenting",
            Phase::Submitting => "submitting",
            Phase::Reported => "reported",
        };
        f.write_str(label)
    }
}

/// Identifies one in-flight request. Tokens increase monotonically for the
/// lifetime of a `QuizSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    Load(RequestToken),
    Submit(RequestToken),
}

/// Whether a `finish_*` call changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The token was not the one expected; the session is unchanged.
    Stale,
}

/// Immutable view of the session for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSnapshot {
    pub session_id: Uuid,
    pub locale: Locale,
    pub phase: Phase,
    /// Zero-based index of the displayed question.
    pub index: usize,
    pub total: usize,
    /// The displayed question; present only while presenting or submitting.
    pub question: Option<Question>,
    /// The answer recorded for the displayed question.
    pub selected: Option<String>,
    pub answered: usize,
    pub is_last: bool,
    pub load_error: Option<String>,
    pub submit_error: Option<String>,
    pub result: Option<QuizResult>,
}

/// The quiz session state.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    locale: Locale,
    phase: Phase,
    questions: Vec<Question>,
    answers: AnswerSet,
    index: usize,
    contact: Contact,
    load_error: Option<String>,
    submit_error: Option<String>,
    result: Option<QuizResult>,
    last_token: u64,
    pending: Option<PendingRequest>,
}

impl QuizSession {
    /// A fresh session for `locale`, in `Loading` with no request issued yet.
    pub fn new(locale: Locale) -> Self {
        Self {
            id: Uuid::new_v4(),
            locale,
            phase: Phase::Loading,
            questions: Vec::new(),
            answers: AnswerSet::default(),
            index: 0,
            contact: Contact::default(),
            load_error: None,
            submit_error: None,
            result: None,
            last_token: 0,
            pending: None,
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken(self.last_token)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Start a fresh session for `locale` and return the token the question
    /// list must be delivered with. Any in-flight request becomes stale.
    pub fn begin_load(&mut self, locale: Locale) -> RequestToken {
        let token = self.next_token();
        self.id = Uuid::new_v4();
        self.locale = locale;
        self.phase = Phase::Loading;
        self.questions.clear();
        self.answers = AnswerSet::default();
        self.index = 0;
        self.contact = Contact::default();
        self.load_error = None;
        self.submit_error = None;
        self.result = None;
        self.pending = Some(PendingRequest::Load(token));
        token
    }

    /// Deliver the outcome of the load identified by `token`.
    pub fn finish_load(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<Question>, String>,
    ) -> Completion {
        if self.pending != Some(PendingRequest::Load(token)) {
            tracing::debug!(%token, "discarding stale question load");
            return Completion::Stale;
        }
        self.pending = None;

        match outcome.and_then(check_unique_ids) {
            Ok(questions) if questions.is_empty() => {
                self.phase = Phase::NoQuizAvailable;
            }
            Ok(questions) => {
                self.answers = AnswerSet::unset(questions.len());
                self.questions = questions;
                self.index = 0;
                self.phase = Phase::Presenting;
            }
            Err(message) => {
                self.load_error = Some(message);
                self.phase = Phase::LoadFailed;
            }
        }
        Completion::Applied
    }

    // -----------------------------------------------------------------------
    // Answering and navigation
    // -----------------------------------------------------------------------

    fn require_presenting(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.phase == Phase::Presenting {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Record `option` for the displayed question. The empty string clears
    /// the slot; any other value must be one of the question's options.
    pub fn select_option(&mut self, option: &str) -> Result<(), SessionError> {
        self.require_presenting("select an option")?;
        let question = &self.questions[self.index];

        if option.is_empty() {
            self.answers.set(self.index, None);
            return Ok(());
        }
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                option: option.to_string(),
                question_id: question.id.clone(),
            });
        }
        self.answers.set(self.index, Some(option.to_string()));
        Ok(())
    }

    /// Clear the answer for the displayed question.
    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        self.select_option("")
    }

    /// Move to the next question. Returns `false` at the last question.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        self.require_presenting("advance")?;
        if self.index + 1 < self.questions.len() {
            self.index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Move to the previous question. Returns `false` at the first question.
    pub fn retreat(&mut self) -> Result<bool, SessionError> {
        self.require_presenting("go back")?;
        if self.index > 0 {
            self.index -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Validate `contact`, build the submission payload, and move to
    /// `Submitting`. Only available from the last question.
    pub fn begin_submit(
        &mut self,
        contact: Contact,
    ) -> Result<(RequestToken, SubmissionPayload), SessionError> {
        self.require_presenting("submit")?;
        if !self.is_last() {
            return Err(SessionError::NotAtLastQuestion {
                index: self.index,
                total: self.questions.len(),
            });
        }
        validate_contact(&contact)?;

        let payload = SubmissionPayload::build(&self.questions, &self.answers, &contact);
        let token = self.next_token();
        self.contact = contact;
        self.submit_error = None;
        self.phase = Phase::Submitting;
        self.pending = Some(PendingRequest::Submit(token));
        Ok((token, payload))
    }

    /// Deliver the outcome of the submission identified by `token`.
    ///
    /// A failure, or a count larger than the number of questions, returns
    /// the session to `Presenting` with the answers intact.
    pub fn finish_submit(
        &mut self,
        token: RequestToken,
        outcome: Result<ScoreResponse, String>,
    ) -> Completion {
        if self.pending != Some(PendingRequest::Submit(token)) {
            tracing::debug!(%token, "discarding stale submission response");
            return Completion::Stale;
        }
        self.pending = None;

        let total = self.questions.len() as u32;
        let computed = outcome.and_then(|resp| {
            QuizResult::compute(resp.correct_answers, total).ok_or_else(|| {
                format!(
                    "scoring service reported {} correct answers for {total} questions",
                    resp.correct_answers
                )
            })
        });

        match computed {
            Ok(result) => {
                self.result = Some(result);
                self.phase = Phase::Reported;
            }
            Err(message) => {
                self.submit_error = Some(message);
                self.phase = Phase::Presenting;
            }
        }
        Completion::Applied
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Whether the displayed question is the last one.
    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.index + 1 == self.questions.len()
    }

    /// The question being displayed, while one can be displayed.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Presenting | Phase::Submitting => self.questions.get(self.index),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        let question = self.current_question().cloned();
        let selected = question
            .as_ref()
            .and_then(|_| self.answers.get(self.index))
            .map(str::to_string);

        QuizSnapshot {
            session_id: self.id,
            locale: self.locale,
            phase: self.phase,
            index: self.index,
            total: self.questions.len(),
            question,
            selected,
            answered: self.answers.answered(),
            is_last: self.is_last(),
            load_error: self.load_error.clone(),
            submit_error: self.submit_error.clone(),
            result: self.result.clone(),
        }
    }
}

fn check_unique_ids(questions: Vec<Question>) -> Result<Vec<Question>, String> {
    if let Some(id) = first_duplicate_id(&questions) {
        return Err(format!("duplicate question id: {id}"));
    }
    Ok(questions)
}

fn first_duplicate_id(questions: &[Question]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(questions.len());
    questions
        .iter()
        .map(|q| q.id.as_str())
        .find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{i}"),
                question: format!("Question {i}?"),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            })
            .collect()
    }

    fn contact() -> Contact {
        Contact {
            name: "Meera".into(),
            email: "meera@example.com".into(),
            phone: "9876543210".into(),
        }
    }

    fn presenting(n: usize) -> QuizSession {
        let mut session = QuizSession::new(Locale::English);
        let token = session.begin_load(Locale::English);
        assert_eq!(session.finish_load(token, Ok(questions(n))), Completion::Applied);
        session
    }

    fn at_last(n: usize) -> QuizSession {
        let mut session = presenting(n);
        while session.advance().unwrap() {}
        session
    }

    #[test]
    fn new_session_is_loading() {
        let session = QuizSession::new(Locale::Hindi);
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.locale(), Locale::Hindi);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn load_initializes_unset_answers() {
        let session = presenting(5);
        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(session.index(), 0);
        assert_eq!(session.answers().len(), 5);
        assert_eq!(session.answers().answered(), 0);
        assert_eq!(session.current_question().unwrap().id, "q0");
    }

    #[test]
    fn advance_clamps_at_last_question() {
        for n in 1..=6 {
            let mut session = presenting(n);
            for _ in 0..n - 1 {
                assert!(session.advance().unwrap());
            }
            assert_eq!(session.index(), n - 1);
            for _ in 0..3 {
                assert!(!session.advance().unwrap());
                assert_eq!(session.index(), n - 1);
            }
        }
    }

    #[test]
    fn retreat_at_first_question_is_noop() {
        let mut session = presenting(3);
        assert!(!session.retreat().unwrap());
        assert_eq!(session.index(), 0);

        session.advance().unwrap();
        assert!(session.retreat().unwrap());
        assert_eq!(session.index(), 0);
    }

    #[test]
    fn select_option_only_touches_current_slot() {
        let mut session = presenting(4);
        session.select_option("A").unwrap();
        session.advance().unwrap();
        session.advance().unwrap();
        session.select_option("C").unwrap();

        let before: Vec<_> = session.answers().iter().map(|a| a.map(String::from)).collect();
        session.select_option("D").unwrap();
        let after: Vec<_> = session.answers().iter().map(|a| a.map(String::from)).collect();

        for i in [0, 1, 3] {
            assert_eq!(before[i], after[i], "slot {i} changed");
        }
        assert_eq!(after[2].as_deref(), Some("D"));
        assert_eq!(after[0].as_deref(), Some("A"));
    }

    #[test]
    fn select_unknown_option_is_rejected() {
        let mut session = presenting(2);
        let err = session.select_option("Z").unwrap_err();
        assert_eq!(
            err,
            SessionError::UnknownOption {
                option: "Z".into(),
                question_id: "q0".into()
            }
        );
        assert_eq!(session.answers().answered(), 0);
    }

    #[test]
    fn empty_option_clears_slot() {
        let mut session = presenting(2);
        session.select_option("B").unwrap();
        session.clear_answer().unwrap();
        assert_eq!(session.answers().get(0), None);
    }

    #[test]
    fn navigation_blocked_while_loading() {
        let mut session = QuizSession::new(Locale::English);
        session.begin_load(Locale::English);
        assert!(matches!(
            session.advance(),
            Err(SessionError::InvalidPhase {
                phase: Phase::Loading,
                ..
            })
        ));
        assert!(session.select_option("A").is_err());
        assert!(session.retreat().is_err());
    }

    #[test]
    fn locale_change_resets_state() {
        let mut session = presenting(3);
        session.select_option("A").unwrap();
        session.advance().unwrap();
        let first_id = session.id();

        let token = session.begin_load(Locale::Hindi);
        assert_eq!(session.phase(), Phase::Loading);
        assert_ne!(session.id(), first_id);

        session.finish_load(token, Ok(questions(5)));
        assert_eq!(session.locale(), Locale::Hindi);
        assert_eq!(session.index(), 0);
        assert_eq!(session.answers().len(), 5);
        assert_eq!(session.answers().answered(), 0);
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut session = QuizSession::new(Locale::English);
        let english = session.begin_load(Locale::English);
        let hindi = session.begin_load(Locale::Hindi);
        assert!(hindi > english);

        assert_eq!(session.finish_load(hindi, Ok(questions(2))), Completion::Applied);
        assert_eq!(session.finish_load(english, Ok(questions(9))), Completion::Stale);
        assert_eq!(session.locale(), Locale::Hindi);
        assert_eq!(session.questions().len(), 2);
    }

    #[test]
    fn empty_question_set_has_no_quiz() {
        let mut session = QuizSession::new(Locale::English);
        let token = session.begin_load(Locale::English);
        session.finish_load(token, Ok(vec![]));
        assert_eq!(session.phase(), Phase::NoQuizAvailable);
        assert!(!session.is_last());
        assert!(session.begin_submit(contact()).is_err());
        assert!(session.result().is_none());
    }

    #[test]
    fn load_failure_is_retryable() {
        let mut session = QuizSession::new(Locale::English);
        let token = session.begin_load(Locale::English);
        session.finish_load(token, Err("network error: refused".into()));
        assert_eq!(session.phase(), Phase::LoadFailed);
        assert_eq!(session.load_error(), Some("network error: refused"));

        let retry = session.begin_load(session.locale());
        assert!(session.load_error().is_none());
        session.finish_load(retry, Ok(questions(1)));
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn duplicate_ids_fail_the_load() {
        let mut session = QuizSession::new(Locale::English);
        let token = session.begin_load(Locale::English);
        let mut qs = questions(2);
        qs[1].id = "q0".into();
        session.finish_load(token, Ok(qs));
        assert_eq!(session.phase(), Phase::LoadFailed);
        assert!(session.load_error().unwrap().contains("duplicate"));
    }

    #[test]
    fn submit_requires_last_question() {
        let mut session = presenting(3);
        assert_eq!(
            session.begin_submit(contact()).unwrap_err(),
            SessionError::NotAtLastQuestion { index: 0, total: 3 }
        );
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn submit_validates_contact() {
        let mut session = at_last(2);
        let mut bad = contact();
        bad.email = "not-an-email".into();
        assert!(matches!(
            session.begin_submit(bad),
            Err(SessionError::InvalidContact(_))
        ));
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn skipped_question_submits_empty_answer() {
        let mut session = presenting(3);
        session.select_option("A").unwrap();
        session.advance().unwrap();
        session.select_option("B").unwrap();
        session.advance().unwrap();

        let (_, payload) = session.begin_submit(contact()).unwrap();
        assert_eq!(payload.answers.len(), 3);
        assert_eq!(payload.answers[0].answer, "A");
        assert_eq!(payload.answers[1].answer, "B");
        assert_eq!(payload.answers[2].answer, "");
        assert_eq!(payload.email, "meera@example.com");
        assert_eq!(session.phase(), Phase::Submitting);
    }

    #[test]
    fn successful_submit_reports_percentages() {
        let mut session = at_last(4);
        let (token, _) = session.begin_submit(contact()).unwrap();
        session.finish_submit(token, Ok(ScoreResponse { correct_answers: 2 }));

        assert_eq!(session.phase(), Phase::Reported);
        assert!(session.is_submitted());
        let result = session.result().unwrap();
        assert_eq!(result.percentage_correct, 50.0);
        assert_eq!(result.percentage_wrong, 50.0);
    }

    #[test]
    fn failed_submit_keeps_answers() {
        let mut session = presenting(2);
        session.select_option("C").unwrap();
        session.advance().unwrap();
        session.select_option("D").unwrap();

        let (token, _) = session.begin_submit(contact()).unwrap();
        session.finish_submit(token, Err("request timed out after 30s".into()));

        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(session.submit_error(), Some("request timed out after 30s"));
        assert_eq!(session.index(), 1);
        assert_eq!(session.answers().get(0), Some("C"));
        assert_eq!(session.answers().get(1), Some("D"));
        assert!(!session.is_submitted());

        // And the user can try again.
        let (retry, _) = session.begin_submit(contact()).unwrap();
        assert!(session.submit_error().is_none());
        session.finish_submit(retry, Ok(ScoreResponse { correct_answers: 1 }));
        assert_eq!(session.phase(), Phase::Reported);
    }

    #[test]
    fn impossible_score_is_a_submit_failure() {
        let mut session = at_last(2);
        let (token, _) = session.begin_submit(contact()).unwrap();
        session.finish_submit(token, Ok(ScoreResponse { correct_answers: 3 }));
        assert_eq!(session.phase(), Phase::Presenting);
        assert!(session.submit_error().unwrap().contains("3 correct answers for 2"));
    }

    #[test]
    fn locale_change_during_submit_discards_response() {
        let mut session = at_last(2);
        let (submit, _) = session.begin_submit(contact()).unwrap();
        let load = session.begin_load(Locale::Hindi);

        assert_eq!(
            session.finish_submit(submit, Ok(ScoreResponse { correct_answers: 2 })),
            Completion::Stale
        );
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.finish_load(load, Ok(questions(1))), Completion::Applied);
        assert!(session.result().is_none());
    }

    #[test]
    fn snapshot_reflects_current_question() {
        let mut session = presenting(3);
        session.advance().unwrap();
        session.select_option("B").unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::Presenting);
        assert_eq!(snap.index, 1);
        assert_eq!(snap.total, 3);
        assert_eq!(snap.question.unwrap().id, "q1");
        assert_eq!(snap.selected.as_deref(), Some("B"));
        assert_eq!(snap.answered, 1);
        assert!(!snap.is_last);
    }

    #[test]
    fn snapshot_while_loading_has_no_question() {
        let session = QuizSession::new(Locale::English);
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::Loading);
        assert!(snap.question.is_none());
        assert!(snap.selected.is_none());
    }
}
