use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{SessionId, UserId};
use crate::model::question::{ParseTokenError, Subject};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("correct answers ({correct}) exceed questions answered ({answered})")]
    CountMismatch { correct: u32, answered: u32 },
}

/// Kind of practice activity a session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Ranked,
    Unranked,
    Test,
}

impl SessionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Ranked => "ranked",
            SessionType::Unranked => "unranked",
            SessionType::Test => "test",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ranked" => Ok(SessionType::Ranked),
            "unranked" => Ok(SessionType::Unranked),
            "test" => Ok(SessionType::Test),
            other => Err(ParseTokenError::new("session type", other)),
        }
    }
}

/// Subject scope of a session: a single subject, or the full multi-section
/// test.
///
/// On the wire and in storage this is always the plain token: `"math"`,
/// `"reading_writing"`, or `"full_test"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionScope {
    Subject(Subject),
    FullTest,
}

impl Serialize for SessionScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SessionScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

impl SessionScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionScope::Subject(subject) => subject.as_str(),
            SessionScope::FullTest => "full_test",
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionScope {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "full_test" {
            return Ok(SessionScope::FullTest);
        }
        s.parse::<Subject>()
            .map(SessionScope::Subject)
            .map_err(|_| ParseTokenError::new("session scope", s))
    }
}

/// One bounded practice or test attempt, summarized by aggregate counters.
///
/// Counters are caller-maintained: the backend stores whatever the client
/// reports and does not enforce that they only grow. A completed session is
/// immutable by convention only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSession {
    id: SessionId,
    user_id: UserId,
    session_type: SessionType,
    #[serde(rename = "subject")]
    scope: SessionScope,
    questions_answered: u32,
    correct_answers: u32,
    accuracy: f64,
    time_spent_secs: u32,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl PracticeSession {
    /// Rehydrate a session row from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError::CountMismatch` if more answers are
    /// correct than were given.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        session_type: SessionType,
        scope: SessionScope,
        questions_answered: u32,
        correct_answers: u32,
        accuracy: f64,
        time_spent_secs: u32,
        completed: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionRecordError> {
        if correct_answers > questions_answered {
            return Err(SessionRecordError::CountMismatch {
                correct: correct_answers,
                answered: questions_answered,
            });
        }

        Ok(Self {
            id,
            user_id,
            session_type,
            scope,
            questions_answered,
            correct_answers,
            accuracy,
            time_spent_secs,
            completed,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    #[must_use]
    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    #[must_use]
    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_more_correct_than_answered() {
        let err = PracticeSession::from_persisted(
            SessionId::new(1),
            UserId::new("u1"),
            SessionType::Ranked,
            SessionScope::Subject(Subject::Math),
            3,
            5,
            0.0,
            60,
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionRecordError::CountMismatch { .. }));
    }

    #[test]
    fn session_type_token_roundtrip() {
        for ty in [SessionType::Ranked, SessionType::Unranked, SessionType::Test] {
            let parsed: SessionType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
        assert!("casual".parse::<SessionType>().is_err());
    }

    #[test]
    fn scope_parses_subjects_and_full_test() {
        assert_eq!(
            "math".parse::<SessionScope>().unwrap(),
            SessionScope::Subject(Subject::Math)
        );
        assert_eq!(
            "full_test".parse::<SessionScope>().unwrap(),
            SessionScope::FullTest
        );
        assert!("everything".parse::<SessionScope>().is_err());
    }

    #[test]
    fn session_json_carries_scope_as_a_subject_token() {
        let session = PracticeSession::from_persisted(
            SessionId::new(7),
            UserId::new("u1"),
            SessionType::Ranked,
            SessionScope::Subject(Subject::Math),
            5,
            4,
            80.0,
            300,
            true,
            fixed_now(),
        )
        .unwrap();

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["subject"], "math");
        assert!(json.get("scope").is_none());

        assert_eq!(
            serde_json::from_str::<SessionScope>("\"full_test\"").unwrap(),
            SessionScope::FullTest
        );
        assert!(serde_json::from_str::<SessionScope>("\"history\"").is_err());
    }
}
