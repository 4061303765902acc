use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AnswerId, QuestionId, SessionId, UserId};

/// One submitted answer, with correctness and timing.
///
/// The answer log is append-only: resubmitting the same question within a
/// session adds another row rather than replacing the first, and only
/// derived aggregates treat the latest one as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    id: AnswerId,
    user_id: UserId,
    question_id: QuestionId,
    session_id: Option<SessionId>,
    user_answer: String,
    is_correct: bool,
    time_spent_secs: u32,
    created_at: DateTime<Utc>,
}

impl AnswerRecord {
    /// Rehydrate an answer row from persisted storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AnswerId,
        user_id: UserId,
        question_id: QuestionId,
        session_id: Option<SessionId>,
        user_answer: impl Into<String>,
        is_correct: bool,
        time_spent_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            question_id,
            session_id,
            user_answer: user_answer.into(),
            is_correct,
            time_spent_secs,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    #[must_use]
    pub fn user_answer(&self) -> &str {
        &self.user_answer
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
