use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two answer options, got {got}")]
    TooFewOptions { got: usize },

    #[error("correct answer token does not match any option label")]
    UnknownCorrectAnswer,
}

/// Error returned when parsing a subject or difficulty token fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized {kind}: {raw}")]
pub struct ParseTokenError {
    kind: &'static str,
    raw: String,
}

impl ParseTokenError {
    pub(crate) fn new(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
        }
    }
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// One of the two tracked SAT domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    ReadingWriting,
    Math,
}

impl Subject {
    /// All subjects in display order.
    pub const ALL: [Subject; 2] = [Subject::ReadingWriting, Subject::Math];

    /// Canonical storage/wire token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::ReadingWriting => "reading_writing",
            Subject::Math => "math",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading_writing" => Ok(Subject::ReadingWriting),
            "math" => Ok(Subject::Math),
            other => Err(ParseTokenError {
                kind: "subject",
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ParseTokenError {
                kind: "difficulty",
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice practice question. Immutable once created.
///
/// Options are labeled `A`, `B`, `C`, … in order; `correct_answer` holds one
/// of those labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    subject: Subject,
    topic: String,
    difficulty: Difficulty,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    created_at: DateTime<Utc>,
}

impl Question {
    /// Rehydrate a question from persisted storage, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is empty, fewer than two options
    /// are present, or the correct-answer token matches no option label.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        subject: Subject,
        topic: impl Into<String>,
        difficulty: Difficulty,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { got: options.len() });
        }

        let correct_answer = correct_answer.into();
        if !Self::option_labels(options.len()).any(|label| label == correct_answer) {
            return Err(QuestionError::UnknownCorrectAnswer);
        }

        Ok(Self {
            id,
            subject,
            topic: topic.into(),
            difficulty,
            prompt,
            options,
            correct_answer,
            explanation: explanation.into(),
            created_at,
        })
    }

    /// Labels `A`, `B`, … for the first `count` options.
    fn option_labels(count: usize) -> impl Iterator<Item = String> {
        (0..count.min(26)).map(|i| {
            char::from(b'A' + u8::try_from(i).unwrap_or(0))
                .to_string()
        })
    }

    /// Whether the submitted answer token matches the correct one.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn options() -> Vec<String> {
        vec!["3".into(), "4".into(), "5".into(), "6".into()]
    }

    fn build_question() -> Question {
        Question::from_persisted(
            QuestionId::new(1),
            Subject::Math,
            "algebra",
            Difficulty::Easy,
            "What is 2 + 2?",
            options(),
            "B",
            "2 + 2 = 4.",
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_question() {
        let q = build_question();
        assert_eq!(q.subject(), Subject::Math);
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("A"));
    }

    #[test]
    fn rejects_empty_prompt() {
        let err = Question::from_persisted(
            QuestionId::new(1),
            Subject::Math,
            "algebra",
            Difficulty::Easy,
            "   ",
            options(),
            "A",
            "",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::from_persisted(
            QuestionId::new(1),
            Subject::Math,
            "algebra",
            Difficulty::Easy,
            "Pick one",
            vec!["only".into()],
            "A",
            "",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { got: 1 });
    }

    #[test]
    fn rejects_correct_answer_outside_labels() {
        let err = Question::from_persisted(
            QuestionId::new(1),
            Subject::Math,
            "algebra",
            Difficulty::Easy,
            "Pick one",
            options(),
            "E",
            "",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::UnknownCorrectAnswer);
    }

    #[test]
    fn subject_token_roundtrip() {
        for subject in Subject::ALL {
            let parsed: Subject = subject.as_str().parse().unwrap();
            assert_eq!(parsed, subject);
        }
        assert!("science".parse::<Subject>().is_err());
    }

    #[test]
    fn difficulty_token_roundtrip() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let parsed: Difficulty = difficulty.as_str().parse().unwrap();
            assert_eq!(parsed, difficulty);
        }
    }
}
