//! Answer recording and the rank-progression side effect.

use std::sync::Arc;
use tracing::warn;

use prep_core::Clock;
use prep_core::model::{
    AnswerRecord, QuestionId, SessionId, Subject, SubjectProgress, UserId,
};
use prep_storage::repository::{
    AnswerRepository, NewAnswerRecord, ProgressRepository, QuestionRepository, StorageError,
};

use crate::error::AnswerDeskError;

/// One submitted answer, before correctness is known.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub session_id: Option<SessionId>,
    pub answer: String,
    pub time_spent_secs: u32,
}

/// Records answers and maintains per-subject progress.
#[derive(Clone)]
pub struct AnswerDesk {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl AnswerDesk {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            answers,
            progress,
        }
    }

    /// Record one answer.
    ///
    /// Correctness is computed here by comparing the submitted token against
    /// the stored question; the caller never decides it. The answer row is
    /// appended unconditionally, then progress counters for every subject
    /// are advanced. A progress write failure is logged and swallowed so the
    /// already-recorded answer is never rolled back.
    ///
    /// # Errors
    ///
    /// Returns `AnswerDeskError::UnknownQuestion` for an id with no stored
    /// question, or `Storage` when the answer row cannot be appended.
    pub async fn submit(
        &self,
        user_id: &UserId,
        submission: AnswerSubmission,
    ) -> Result<AnswerRecord, AnswerDeskError> {
        let question = match self.questions.get_question(submission.question_id).await {
            Ok(question) => question,
            Err(StorageError::NotFound) => return Err(AnswerDeskError::UnknownQuestion),
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now();
        let is_correct = question.is_correct(&submission.answer);
        let record = self
            .answers
            .append_answer(NewAnswerRecord {
                user_id: user_id.clone(),
                question_id: question.id(),
                session_id: submission.session_id,
                user_answer: submission.answer,
                is_correct,
                time_spent_secs: submission.time_spent_secs,
                created_at: now,
            })
            .await?;

        self.advance_progress(user_id, is_correct).await;

        Ok(record)
    }

    /// Advance the rank counters for every subject after one answer.
    ///
    /// Both subjects move together regardless of which one the question
    /// belonged to; that is the established progression behavior.
    async fn advance_progress(&self, user_id: &UserId, is_correct: bool) {
        let now = self.clock.now();
        for subject in Subject::ALL {
            let current = match self.progress.get_progress(user_id, subject).await {
                Ok(row) => row,
                Err(e) => {
                    warn!(user = %user_id.as_str(), subject = subject.as_str(), error = %e,
                          "skipping progress update: read failed");
                    continue;
                }
            };
            let mut row = current
                .unwrap_or_else(|| SubjectProgress::initial(user_id.clone(), subject, now));
            row.record_answer(is_correct, now);
            if let Err(e) = self.progress.upsert_progress(&row).await {
                warn!(user = %user_id.as_str(), subject = subject.as_str(), error = %e,
                      "skipping progress update: write failed");
            }
        }
    }

    /// The caller's answer history, newest first, optionally scoped to one
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `AnswerDeskError::Storage` when repository access fails.
    pub async fn history(
        &self,
        user_id: &UserId,
        session_id: Option<SessionId>,
    ) -> Result<Vec<AnswerRecord>, AnswerDeskError> {
        Ok(self.answers.list_answers(user_id, session_id).await?)
    }

    /// All progress rows for the caller, at most one per subject.
    ///
    /// A user who has never answered anything gets an empty list; rows are
    /// created lazily on the first answer.
    ///
    /// # Errors
    ///
    /// Returns `AnswerDeskError::Storage` when repository access fails.
    pub async fn progress_overview(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SubjectProgress>, AnswerDeskError> {
        Ok(self.progress.list_progress(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Difficulty, Rank};
    use prep_core::time::{fixed_clock, fixed_now};
    use prep_storage::repository::{InMemoryRepository, NewQuestionRecord};

    async fn desk_with_question() -> (AnswerDesk, QuestionId) {
        let repo = InMemoryRepository::new();
        let question = repo
            .insert_question(NewQuestionRecord {
                subject: Subject::Math,
                topic: "Algebra".into(),
                difficulty: Difficulty::Easy,
                prompt: "If x + 1 = 2, what is x?".into(),
                options: vec!["0".into(), "1".into(), "2".into(), "3".into()],
                correct_answer: "B".into(),
                explanation: "Subtract 1 from both sides.".into(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let desk = AnswerDesk::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        (desk, question.id())
    }

    fn submission(question_id: QuestionId, answer: &str) -> AnswerSubmission {
        AnswerSubmission {
            question_id,
            session_id: None,
            answer: answer.into(),
            time_spent_secs: 20,
        }
    }

    #[tokio::test]
    async fn correctness_is_decided_by_the_stored_question() {
        let (desk, question_id) = desk_with_question().await;
        let user = UserId::from("u-1");

        let right = desk
            .submit(&user, submission(question_id, "B"))
            .await
            .unwrap();
        assert!(right.is_correct());

        let wrong = desk
            .submit(&user, submission(question_id, "A"))
            .await
            .unwrap();
        assert!(!wrong.is_correct());

        let history = desk.history(&user, None).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn correct_answer_advances_both_subjects() {
        let (desk, question_id) = desk_with_question().await;
        let user = UserId::from("u-1");

        desk.submit(&user, submission(question_id, "B"))
            .await
            .unwrap();

        let rows = desk.progress_overview(&user).await.unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.rank(), Rank::Bronze);
            assert!((row.rank_progress() - 10.0).abs() < f64::EPSILON);
            assert_eq!(row.total_questions(), 1);
            assert_eq!(row.correct_answers(), 1);
        }
    }

    #[tokio::test]
    async fn incorrect_answer_counts_but_does_not_progress() {
        let (desk, question_id) = desk_with_question().await;
        let user = UserId::from("u-1");

        desk.submit(&user, submission(question_id, "D"))
            .await
            .unwrap();

        let rows = desk.progress_overview(&user).await.unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.rank_progress(), 0.0);
            assert_eq!(row.total_questions(), 1);
            assert_eq!(row.correct_answers(), 0);
            assert_eq!(row.average_accuracy(), 0.0);
        }
    }

    #[tokio::test]
    async fn unknown_question_is_rejected_before_logging() {
        let (desk, _) = desk_with_question().await;
        let user = UserId::from("u-1");

        let err = desk
            .submit(&user, submission(QuestionId::new(999), "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerDeskError::UnknownQuestion));
        assert!(desk.history(&user, None).await.unwrap().is_empty());
    }
}
