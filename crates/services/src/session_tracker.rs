//! Practice-session lifecycle: create, patch, and list.

use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{PracticeSession, SessionId, SessionScope, SessionType, UserId};
use prep_storage::repository::{NewSessionRecord, SessionPatch, SessionRepository};

use crate::error::SessionTrackerError;

/// Caller-supplied fields for a new session.
///
/// Counters are taken at face value; completing clients report their own
/// totals and the backend does not recompute them.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub session_type: SessionType,
    pub scope: SessionScope,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub time_spent_secs: u32,
    pub completed: bool,
}

impl SessionDraft {
    /// An empty, in-progress session of the given kind.
    #[must_use]
    pub fn started(session_type: SessionType, scope: SessionScope) -> Self {
        Self {
            session_type,
            scope,
            questions_answered: 0,
            correct_answers: 0,
            accuracy: 0.0,
            time_spent_secs: 0,
            completed: false,
        }
    }
}

/// Tracks per-user practice sessions.
#[derive(Clone)]
pub struct SessionTracker {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionTracker {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { clock, sessions }
    }

    /// Insert a session row for the caller.
    ///
    /// # Errors
    ///
    /// Returns `SessionTrackerError::Storage` when the row cannot be stored.
    pub async fn create(
        &self,
        user_id: &UserId,
        draft: SessionDraft,
    ) -> Result<PracticeSession, SessionTrackerError> {
        let session = self
            .sessions
            .append_session(NewSessionRecord {
                user_id: user_id.clone(),
                session_type: draft.session_type,
                scope: draft.scope,
                questions_answered: draft.questions_answered,
                correct_answers: draft.correct_answers,
                accuracy: draft.accuracy,
                time_spent_secs: draft.time_spent_secs,
                completed: draft.completed,
                created_at: self.clock.now(),
            })
            .await?;
        Ok(session)
    }

    /// Apply a partial update to the caller's own session.
    ///
    /// # Errors
    ///
    /// Returns `SessionTrackerError::Forbidden` when the session exists but
    /// belongs to someone else, `Storage(NotFound)` when it does not exist.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: SessionId,
        patch: &SessionPatch,
    ) -> Result<PracticeSession, SessionTrackerError> {
        let current = self.sessions.get_session(id).await?;
        if current.user_id() != user_id {
            return Err(SessionTrackerError::Forbidden);
        }
        Ok(self.sessions.update_session(id, patch).await?)
    }

    /// The caller's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionTrackerError::Storage` when repository access fails.
    pub async fn recent(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<PracticeSession>, SessionTrackerError> {
        Ok(self.sessions.list_sessions(user_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::Subject;
    use prep_core::time::fixed_clock;
    use prep_storage::repository::{InMemoryRepository, StorageError};

    fn tracker() -> SessionTracker {
        SessionTracker::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn create_then_patch_to_completion() {
        let tracker = tracker();
        let user = UserId::from("u-1");

        let session = tracker
            .create(
                &user,
                SessionDraft::started(SessionType::Ranked, SessionScope::Subject(Subject::Math)),
            )
            .await
            .unwrap();
        assert!(!session.completed());
        assert_eq!(session.questions_answered(), 0);

        let patch = SessionPatch {
            questions_answered: Some(12),
            correct_answers: Some(9),
            accuracy: Some(75.0),
            time_spent_secs: Some(540),
            completed: Some(true),
        };
        let updated = tracker.update(&user, session.id(), &patch).await.unwrap();
        assert!(updated.completed());
        assert_eq!(updated.correct_answers(), 9);
    }

    #[tokio::test]
    async fn update_rejects_other_users_sessions() {
        let tracker = tracker();
        let owner = UserId::from("owner");
        let stranger = UserId::from("stranger");

        let session = tracker
            .create(
                &owner,
                SessionDraft::started(SessionType::Unranked, SessionScope::FullTest),
            )
            .await
            .unwrap();

        let err = tracker
            .update(&stranger, session.id(), &SessionPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionTrackerError::Forbidden));
    }

    #[tokio::test]
    async fn update_missing_session_is_not_found() {
        let tracker = tracker();
        let err = tracker
            .update(
                &UserId::from("u-1"),
                SessionId::new(404),
                &SessionPatch::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionTrackerError::Storage(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn recent_respects_limit() {
        let tracker = tracker();
        let user = UserId::from("u-1");
        for _ in 0..3 {
            tracker
                .create(
                    &user,
                    SessionDraft::started(
                        SessionType::Ranked,
                        SessionScope::Subject(Subject::ReadingWriting),
                    ),
                )
                .await
                .unwrap();
        }

        assert_eq!(tracker.recent(&user, None).await.unwrap().len(), 3);
        assert_eq!(tracker.recent(&user, Some(2)).await.unwrap().len(), 2);
    }
}
