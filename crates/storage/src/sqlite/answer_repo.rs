use prep_core::model::{AnswerId, AnswerRecord, SessionId, UserId};

use super::{SqliteRepository, mapping::map_answer_row};
use crate::repository::{AnswerRepository, NewAnswerRecord, StorageError};

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn append_answer(&self, record: NewAnswerRecord) -> Result<AnswerRecord, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO user_answers (
                    user_id, question_id, session_id, user_answer,
                    is_correct, time_spent_secs, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.question_id.value())
        .bind(record.session_id.map(|s| s.value()))
        .bind(&record.user_answer)
        .bind(record.is_correct)
        .bind(i64::from(record.time_spent_secs))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(record.into_answer(AnswerId::new(res.last_insert_rowid())))
    }

    async fn list_answers(
        &self,
        user_id: &UserId,
        session_id: Option<SessionId>,
    ) -> Result<Vec<AnswerRecord>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT id, user_id, question_id, session_id, user_answer,
                       is_correct, time_spent_secs, created_at
                FROM user_answers
                WHERE user_id = ?1
            ",
        );
        if session_id.is_some() {
            sql.push_str(" AND session_id = ?2");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query(&sql).bind(user_id.as_str());
        if let Some(session_id) = session_id {
            query = query.bind(session_id.value());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_answer_row(&row)?);
        }
        Ok(out)
    }
}
