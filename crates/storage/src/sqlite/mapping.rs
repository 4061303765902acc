use prep_core::model::{
    AnswerId, AnswerRecord, Difficulty, PlanId, PracticeSession, Question, QuestionId, Rank,
    SessionId, SessionScope, SessionType, StudyPlan, Subject, SubjectProgress, UserId, UserProfile,
};
use sqlx::Row;
use std::str::FromStr;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Option texts and subject lists are stored as JSON arrays in TEXT columns.
pub(crate) fn json_vec<T: serde::de::DeserializeOwned>(
    field: &'static str,
    raw: &str,
) -> Result<Vec<T>, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

pub(crate) fn json_string<T: serde::Serialize>(
    field: &'static str,
    value: &T,
) -> Result<String, StorageError> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, StorageError> {
    Ok(UserProfile {
        id: UserId::new(row.try_get::<String, _>("id").map_err(ser)?),
        email: row.try_get("email").map_err(ser)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        profile_image_url: row.try_get("profile_image_url").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let subject = Subject::from_str(row.try_get::<String, _>("subject").map_err(ser)?.as_str())
        .map_err(ser)?;
    let difficulty = Difficulty::from_str(
        row.try_get::<String, _>("difficulty").map_err(ser)?.as_str(),
    )
    .map_err(ser)?;
    let options: Vec<String> =
        json_vec("options", row.try_get::<String, _>("options").map_err(ser)?.as_str())?;

    Question::from_persisted(
        QuestionId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        subject,
        row.try_get::<String, _>("topic").map_err(ser)?,
        difficulty,
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        row.try_get::<String, _>("correct_answer").map_err(ser)?,
        row.try_get::<String, _>("explanation").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SubjectProgress, StorageError> {
    let subject = Subject::from_str(row.try_get::<String, _>("subject").map_err(ser)?.as_str())
        .map_err(ser)?;
    let rank =
        Rank::from_str(row.try_get::<String, _>("rank").map_err(ser)?.as_str()).map_err(ser)?;

    SubjectProgress::from_persisted(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        subject,
        rank,
        row.try_get("rank_progress").map_err(ser)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PracticeSession, StorageError> {
    let session_type = SessionType::from_str(
        row.try_get::<String, _>("session_type").map_err(ser)?.as_str(),
    )
    .map_err(ser)?;
    let scope = SessionScope::from_str(row.try_get::<String, _>("scope").map_err(ser)?.as_str())
        .map_err(ser)?;

    PracticeSession::from_persisted(
        SessionId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        session_type,
        scope,
        u32_from_i64(
            "questions_answered",
            row.try_get::<i64, _>("questions_answered").map_err(ser)?,
        )?,
        u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        row.try_get("accuracy").map_err(ser)?,
        u32_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?,
        row.try_get::<bool, _>("completed").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerRecord, StorageError> {
    Ok(AnswerRecord::from_persisted(
        AnswerId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        QuestionId::new(row.try_get::<i64, _>("question_id").map_err(ser)?),
        row.try_get::<Option<i64>, _>("session_id")
            .map_err(ser)?
            .map(SessionId::new),
        row.try_get::<String, _>("user_answer").map_err(ser)?,
        row.try_get::<bool, _>("is_correct").map_err(ser)?,
        u32_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_plan_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudyPlan, StorageError> {
    let target_score = row
        .try_get::<Option<i64>, _>("target_score")
        .map_err(ser)?
        .map(|v| {
            u16::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid target_score: {v}")))
        })
        .transpose()?;
    let subjects: Vec<Subject> =
        json_vec("subjects", row.try_get::<String, _>("subjects").map_err(ser)?.as_str())?;

    StudyPlan::from_persisted(
        PlanId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        row.try_get::<String, _>("name").map_err(ser)?,
        target_score,
        row.try_get("test_date").map_err(ser)?,
        u32_from_i64(
            "daily_goal_minutes",
            row.try_get::<i64, _>("daily_goal_minutes").map_err(ser)?,
        )?,
        subjects,
        row.try_get::<bool, _>("is_active").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
