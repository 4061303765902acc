use prep_core::model::{PracticeSession, SessionId, UserId};

use super::{SqliteRepository, mapping::map_session_row};
use crate::repository::{NewSessionRecord, SessionPatch, SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn append_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<PracticeSession, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO practice_sessions (
                    user_id, session_type, scope, questions_answered,
                    correct_answers, accuracy, time_spent_secs, completed, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.session_type.as_str())
        .bind(record.scope.as_str())
        .bind(i64::from(record.questions_answered))
        .bind(i64::from(record.correct_answers))
        .bind(record.accuracy)
        .bind(i64::from(record.time_spent_secs))
        .bind(record.completed)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.get_session(SessionId::new(res.last_insert_rowid()))
            .await
    }

    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, session_type, scope, questions_answered,
                       correct_answers, accuracy, time_spent_secs, completed, created_at
                FROM practice_sessions
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_session_row(&row)
    }

    async fn update_session(
        &self,
        id: SessionId,
        patch: &SessionPatch,
    ) -> Result<PracticeSession, StorageError> {
        // Read-patch-write keeps invariant checks in one place; the session
        // is only ever updated by its owner, so lost updates are not a
        // concern here.
        let current = self.get_session(id).await?;
        let updated = patch.apply(&current)?;

        sqlx::query(
            r"
                UPDATE practice_sessions SET
                    questions_answered = ?2,
                    correct_answers = ?3,
                    accuracy = ?4,
                    time_spent_secs = ?5,
                    completed = ?6
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .bind(i64::from(updated.questions_answered()))
        .bind(i64::from(updated.correct_answers()))
        .bind(updated.accuracy())
        .bind(i64::from(updated.time_spent_secs()))
        .bind(updated.completed())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(updated)
    }

    async fn list_sessions(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT id, user_id, session_type, scope, questions_answered,
                       correct_answers, accuracy, time_spent_secs, completed, created_at
                FROM practice_sessions
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?2");
        }

        let mut query = sqlx::query(&sql).bind(user_id.as_str());
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_session_row(&row)?);
        }
        Ok(out)
    }
}
