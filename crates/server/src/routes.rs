//! Route handlers and their request/response bodies.
//!
//! Domain models serialize directly as response JSON; request bodies get
//! their own small structs where the wire shape differs from the model.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Deserializer};

use prep_core::model::{
    AnswerRecord, Difficulty, PlanId, PracticeSession, Question, QuestionId, SessionId,
    SessionScope, SessionType, StudyPlan, StudyPlanDraft, Subject, SubjectProgress, UserProfile,
};
use prep_services::{AnswerSubmission, SessionDraft};
use prep_storage::repository::{PlanPatch, SessionPatch};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

//
// ─── USERS & PROGRESS ──────────────────────────────────────────────────────────
//

/// `GET /api/auth/user`. Upserts a bare profile on first sight so a fresh
/// id resolves immediately.
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.services.users().ensure_user(&user).await?))
}

/// `GET /api/user/progress`.
pub async fn user_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SubjectProgress>>, ApiError> {
    Ok(Json(state.services.answers().progress_overview(&user).await?))
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
pub struct QuestionFilter {
    difficulty: Option<Difficulty>,
    limit: Option<u32>,
}

/// `GET /api/practice/questions/{subject}`. Public.
pub async fn questions_by_subject(
    State(state): State<AppState>,
    Path(subject): Path<Subject>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(
        state
            .services
            .questions()
            .by_subject(subject, filter.difficulty, filter.limit)
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct RandomFilter {
    difficulty: Option<Difficulty>,
}

/// `GET /api/practice/random/{subject}/{count}`. Public.
pub async fn random_questions(
    State(state): State<AppState>,
    Path((subject, count)): Path<(Subject, u32)>,
    Query(filter): Query<RandomFilter>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(
        state
            .services
            .questions()
            .random(subject, count, filter.difficulty)
            .await?,
    ))
}

//
// ─── SESSIONS ──────────────────────────────────────────────────────────────────
//

/// Body of `POST /api/practice/session`. Counters default to zero so a
/// client can open a session with just its kind and subject. The `subject`
/// field takes a subject token or `"full_test"`.
#[derive(Deserialize)]
pub struct SessionBody {
    session_type: SessionType,
    subject: SessionScope,
    #[serde(default)]
    questions_answered: u32,
    #[serde(default)]
    correct_answers: u32,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    time_spent_secs: u32,
    #[serde(default)]
    completed: bool,
}

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SessionBody>,
) -> Result<Json<PracticeSession>, ApiError> {
    let draft = SessionDraft {
        session_type: body.session_type,
        scope: body.subject,
        questions_answered: body.questions_answered,
        correct_answers: body.correct_answers,
        accuracy: body.accuracy,
        time_spent_secs: body.time_spent_secs,
        completed: body.completed,
    };
    Ok(Json(state.services.sessions().create(&user, draft).await?))
}

#[derive(Deserialize)]
pub struct SessionPatchBody {
    questions_answered: Option<u32>,
    correct_answers: Option<u32>,
    accuracy: Option<f64>,
    time_spent_secs: Option<u32>,
    completed: Option<bool>,
}

/// `PUT /api/practice/session/{id}`.
pub async fn update_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<SessionId>,
    Json(body): Json<SessionPatchBody>,
) -> Result<Json<PracticeSession>, ApiError> {
    let patch = SessionPatch {
        questions_answered: body.questions_answered,
        correct_answers: body.correct_answers,
        accuracy: body.accuracy,
        time_spent_secs: body.time_spent_secs,
        completed: body.completed,
    };
    if patch.is_empty() {
        return Err(ApiError::Validation("empty update".into()));
    }
    Ok(Json(
        state.services.sessions().update(&user, id, &patch).await?,
    ))
}

#[derive(Deserialize)]
pub struct SessionsQuery {
    limit: Option<u32>,
}

/// `GET /api/practice/sessions`. Newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Vec<PracticeSession>>, ApiError> {
    Ok(Json(
        state.services.sessions().recent(&user, query.limit).await?,
    ))
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
pub struct AnswerBody {
    question_id: QuestionId,
    session_id: Option<SessionId>,
    answer: String,
    #[serde(default)]
    time_spent_secs: u32,
}

/// `POST /api/practice/answer`. Correctness is decided here on the server;
/// recording the answer also advances the caller's rank counters.
pub async fn submit_answer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<AnswerBody>,
) -> Result<Json<AnswerRecord>, ApiError> {
    let submission = AnswerSubmission {
        question_id: body.question_id,
        session_id: body.session_id,
        answer: body.answer,
        time_spent_secs: body.time_spent_secs,
    };
    Ok(Json(state.services.answers().submit(&user, submission).await?))
}

#[derive(Deserialize)]
pub struct AnswersQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<SessionId>,
}

/// `GET /api/user/answers?sessionId=`.
pub async fn list_answers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AnswersQuery>,
) -> Result<Json<Vec<AnswerRecord>>, ApiError> {
    Ok(Json(
        state
            .services
            .answers()
            .history(&user, query.session_id)
            .await?,
    ))
}

//
// ─── STUDY PLANS ───────────────────────────────────────────────────────────────
//

/// `POST /api/study-plan`.
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<StudyPlanDraft>,
) -> Result<Json<StudyPlan>, ApiError> {
    Ok(Json(state.services.study_plans().create(&user, &draft).await?))
}

/// `GET /api/study-plans`.
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<StudyPlan>>, ApiError> {
    Ok(Json(state.services.study_plans().list(&user).await?))
}

/// Distinguishes an absent field from an explicit `null`: `"test_date":
/// null` clears the date, leaving it out keeps the stored value.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize)]
pub struct PlanPatchBody {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    target_score: Option<Option<u16>>,
    #[serde(default, deserialize_with = "double_option")]
    test_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    daily_goal_minutes: Option<u32>,
    subjects: Option<Vec<Subject>>,
    is_active: Option<bool>,
}

/// `PUT /api/study-plan/{id}`.
pub async fn update_plan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PlanId>,
    Json(body): Json<PlanPatchBody>,
) -> Result<Json<StudyPlan>, ApiError> {
    let patch = PlanPatch {
        name: body.name,
        target_score: body.target_score,
        test_date: body.test_date,
        daily_goal_minutes: body.daily_goal_minutes,
        subjects: body.subjects,
        is_active: body.is_active,
    };
    if patch.is_empty() {
        return Err(ApiError::Validation("empty update".into()));
    }
    Ok(Json(
        state.services.study_plans().update(&user, id, &patch).await?,
    ))
}
