use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prep_core::model::{
    AnswerId, AnswerRecord, Difficulty, PlanId, PracticeSession, Question, QuestionId, SessionId,
    SessionScope, SessionType, StudyPlan, StudyPlanDraft, Subject, SubjectProgress, UserId,
    UserProfile,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

//
// ─── RECORD SHAPES ─────────────────────────────────────────────────────────────
//

/// Insert shape for a question; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub subject: Subject,
    pub topic: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

impl NewQuestionRecord {
    fn into_question(self, id: QuestionId) -> Result<Question, StorageError> {
        Question::from_persisted(
            id,
            self.subject,
            self.topic,
            self.difficulty,
            self.prompt,
            self.options,
            self.correct_answer,
            self.explanation,
            self.created_at,
        )
        .map_err(ser)
    }
}

/// Insert shape for a practice session; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub user_id: UserId,
    pub session_type: SessionType,
    pub scope: SessionScope,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub time_spent_secs: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl NewSessionRecord {
    fn into_session(self, id: SessionId) -> Result<PracticeSession, StorageError> {
        PracticeSession::from_persisted(
            id,
            self.user_id,
            self.session_type,
            self.scope,
            self.questions_answered,
            self.correct_answers,
            self.accuracy,
            self.time_spent_secs,
            self.completed,
            self.created_at,
        )
        .map_err(ser)
    }
}

/// Partial update for a session's progress counters.
///
/// `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub questions_answered: Option<u32>,
    pub correct_answers: Option<u32>,
    pub accuracy: Option<f64>,
    pub time_spent_secs: Option<u32>,
    pub completed: Option<bool>,
}

impl SessionPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions_answered.is_none()
            && self.correct_answers.is_none()
            && self.accuracy.is_none()
            && self.time_spent_secs.is_none()
            && self.completed.is_none()
    }

    pub(crate) fn apply(
        &self,
        session: &PracticeSession,
    ) -> Result<PracticeSession, StorageError> {
        PracticeSession::from_persisted(
            session.id(),
            session.user_id().clone(),
            session.session_type(),
            session.scope(),
            self.questions_answered
                .unwrap_or_else(|| session.questions_answered()),
            self.correct_answers
                .unwrap_or_else(|| session.correct_answers()),
            self.accuracy.unwrap_or_else(|| session.accuracy()),
            self.time_spent_secs
                .unwrap_or_else(|| session.time_spent_secs()),
            self.completed.unwrap_or_else(|| session.completed()),
            session.created_at(),
        )
        .map_err(ser)
    }
}

/// Insert shape for one answer-log row; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewAnswerRecord {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub session_id: Option<SessionId>,
    pub user_answer: String,
    pub is_correct: bool,
    pub time_spent_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl NewAnswerRecord {
    pub(crate) fn into_answer(self, id: AnswerId) -> AnswerRecord {
        AnswerRecord::from_persisted(
            id,
            self.user_id,
            self.question_id,
            self.session_id,
            self.user_answer,
            self.is_correct,
            self.time_spent_secs,
            self.created_at,
        )
    }
}

/// Partial update for a study plan. `None` fields keep their stored value;
/// the double options distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default)]
pub struct PlanPatch {
    pub name: Option<String>,
    pub target_score: Option<Option<u16>>,
    pub test_date: Option<Option<DateTime<Utc>>>,
    pub daily_goal_minutes: Option<u32>,
    pub subjects: Option<Vec<Subject>>,
    pub is_active: Option<bool>,
}

impl PlanPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.target_score.is_none()
            && self.test_date.is_none()
            && self.daily_goal_minutes.is_none()
            && self.subjects.is_none()
            && self.is_active.is_none()
    }

    pub(crate) fn apply(&self, plan: &StudyPlan) -> Result<StudyPlan, StorageError> {
        StudyPlan::from_persisted(
            plan.id(),
            plan.user_id().clone(),
            self.name.clone().unwrap_or_else(|| plan.name().to_owned()),
            self.target_score.unwrap_or_else(|| plan.target_score()),
            self.test_date.unwrap_or_else(|| plan.test_date()),
            self.daily_goal_minutes
                .unwrap_or_else(|| plan.daily_goal_minutes()),
            self.subjects
                .clone()
                .unwrap_or_else(|| plan.subjects().to_vec()),
            self.is_active.unwrap_or_else(|| plan.is_active()),
            plan.created_at(),
        )
        .map_err(ser)
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist or refresh a user profile mirrored from the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StorageError>;

    /// Fetch a profile by id, `None` if the user has never been seen.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record is invalid or cannot be stored.
    async fn insert_question(&self, record: NewQuestionRecord) -> Result<Question, StorageError>;

    /// Fetch a question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;

    /// All questions for a subject, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self, subject: Subject) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist or update one (user, subject) progress row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<(), StorageError>;

    /// Fetch the progress row for one subject, `None` if the user has not
    /// answered anything yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        user_id: &UserId,
        subject: Subject,
    ) -> Result<Option<SubjectProgress>, StorageError>;

    /// All progress rows for a user, at most one per subject.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<SubjectProgress>, StorageError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a session and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record is invalid or cannot be stored.
    async fn append_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<PracticeSession, StorageError>;

    /// Fetch a session by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or `Serialization` if
    /// the patched row violates session invariants.
    async fn update_session(
        &self,
        id: SessionId,
        patch: &SessionPatch,
    ) -> Result<PracticeSession, StorageError>;

    /// A user's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<PracticeSession>, StorageError>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Append one answer to the log. The log is append-only; resubmitting
    /// the same question adds a second row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn append_answer(&self, record: NewAnswerRecord) -> Result<AnswerRecord, StorageError>;

    /// A user's answers, newest first, optionally restricted to a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_answers(
        &self,
        user_id: &UserId,
        session_id: Option<SessionId>,
    ) -> Result<Vec<AnswerRecord>, StorageError>;
}

#[async_trait]
pub trait StudyPlanRepository: Send + Sync {
    /// Insert a plan built from a validated draft and return it with its
    /// assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the draft is invalid or cannot be stored.
    async fn append_plan(
        &self,
        user_id: &UserId,
        draft: &StudyPlanDraft,
        created_at: DateTime<Utc>,
    ) -> Result<StudyPlan, StorageError>;

    /// Fetch a plan by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError>;

    /// A user's plans, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<StudyPlan>, StorageError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or `Serialization` if
    /// the patched row violates plan invariants.
    async fn update_plan(&self, id: PlanId, patch: &PlanPatch) -> Result<StudyPlan, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, UserProfile>>>,
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    progress: Arc<Mutex<HashMap<(UserId, Subject), SubjectProgress>>>,
    sessions: Arc<Mutex<HashMap<SessionId, PracticeSession>>>,
    answers: Arc<Mutex<Vec<AnswerRecord>>>,
    plans: Arc<Mutex<HashMap<PlanId, StudyPlan>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(1)),
            ..Self::default()
        }
    }

    fn assign_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed).max(1)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, record: NewQuestionRecord) -> Result<Question, StorageError> {
        let question = record.into_question(QuestionId::new(self.assign_id()))?;
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id(), question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_questions(&self, subject: Subject) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Question> = guard
            .values()
            .filter(|q| q.subject() == subject)
            .cloned()
            .collect();
        found.sort_by_key(Question::id);
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (progress.user_id().clone(), progress.subject()),
            progress.clone(),
        );
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        subject: Subject,
    ) -> Result<Option<SubjectProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id.clone(), subject)).cloned())
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<SubjectProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<SubjectProgress> = guard
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.subject().as_str());
        Ok(found)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn append_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<PracticeSession, StorageError> {
        let session = record.into_session(SessionId::new(self.assign_id()))?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(session.id(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn update_session(
        &self,
        id: SessionId,
        patch: &SessionPatch,
    ) -> Result<PracticeSession, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let current = guard.get(&id).ok_or(StorageError::NotFound)?;
        let updated = patch.apply(current)?;
        guard.insert(id, updated.clone());
        Ok(updated)
    }

    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<PracticeSession> = guard
            .values()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });
        if let Some(limit) = limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn append_answer(&self, record: NewAnswerRecord) -> Result<AnswerRecord, StorageError> {
        let answer = record.into_answer(AnswerId::new(self.assign_id()));
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(answer.clone());
        Ok(answer)
    }

    async fn list_answers(
        &self,
        user_id: &UserId,
        session_id: Option<SessionId>,
    ) -> Result<Vec<AnswerRecord>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<AnswerRecord> = guard
            .iter()
            .filter(|a| a.user_id() == user_id)
            .filter(|a| session_id.is_none() || a.session_id() == session_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });
        Ok(found)
    }
}

#[async_trait]
impl StudyPlanRepository for InMemoryRepository {
    async fn append_plan(
        &self,
        user_id: &UserId,
        draft: &StudyPlanDraft,
        created_at: DateTime<Utc>,
    ) -> Result<StudyPlan, StorageError> {
        let plan = StudyPlan::from_persisted(
            PlanId::new(self.assign_id()),
            user_id.clone(),
            draft.name.clone(),
            draft.target_score,
            draft.test_date,
            draft.daily_goal_minutes,
            draft.subjects.clone(),
            true,
            created_at,
        )
        .map_err(ser)?;
        let mut guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(plan.id(), plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        let guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<StudyPlan>, StorageError> {
        let guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<StudyPlan> = guard
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });
        Ok(found)
    }

    async fn update_plan(&self, id: PlanId, patch: &PlanPatch) -> Result<StudyPlan, StorageError> {
        let mut guard = self
            .plans
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let current = guard.get(&id).ok_or(StorageError::NotFound)?;
        let updated = patch.apply(current)?;
        guard.insert(id, updated.clone());
        Ok(updated)
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates all repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub study_plans: Arc<dyn StudyPlanRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            answers: Arc::new(repo.clone()),
            study_plans: Arc::new(repo),
        }
    }
}
