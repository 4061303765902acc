use std::sync::Arc;

use prep_core::Clock;
use prep_storage::repository::Storage;

use crate::answer_desk::AnswerDesk;
use crate::error::AppServicesError;
use crate::question_desk::QuestionDesk;
use crate::session_tracker::SessionTracker;
use crate::study_plan_desk::StudyPlanDesk;
use crate::user_desk::UserDesk;

/// Assembles the application services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    questions: QuestionDesk,
    answers: AnswerDesk,
    sessions: SessionTracker,
    study_plans: StudyPlanDesk,
    users: UserDesk,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let questions = QuestionDesk::new(Arc::clone(&storage.questions));
        let answers = AnswerDesk::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.answers),
            Arc::clone(&storage.progress),
        );
        let sessions = SessionTracker::new(clock, Arc::clone(&storage.sessions));
        let study_plans = StudyPlanDesk::new(clock, Arc::clone(&storage.study_plans));
        let users = UserDesk::new(clock, Arc::clone(&storage.users));

        Self {
            questions,
            answers,
            sessions,
            study_plans,
            users,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionDesk {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerDesk {
        &self.answers
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    #[must_use]
    pub fn study_plans(&self) -> &StudyPlanDesk {
        &self.study_plans
    }

    #[must_use]
    pub fn users(&self) -> &UserDesk {
        &self.users
    }
}
