use prep_core::model::{Subject, SubjectProgress, UserId};

use super::{SqliteRepository, mapping::map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(&self, progress: &SubjectProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO user_progress (
                    user_id, subject, rank, rank_progress,
                    total_questions, correct_answers, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, subject) DO UPDATE SET
                    rank = excluded.rank,
                    rank_progress = excluded.rank_progress,
                    total_questions = excluded.total_questions,
                    correct_answers = excluded.correct_answers,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(progress.user_id().as_str())
        .bind(progress.subject().as_str())
        .bind(progress.rank().as_str())
        .bind(progress.rank_progress())
        .bind(i64::from(progress.total_questions()))
        .bind(i64::from(progress.correct_answers()))
        .bind(progress.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        subject: Subject,
    ) -> Result<Option<SubjectProgress>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, subject, rank, rank_progress,
                       total_questions, correct_answers, updated_at
                FROM user_progress
                WHERE user_id = ?1 AND subject = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<SubjectProgress>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, subject, rank, rank_progress,
                       total_questions, correct_answers, updated_at
                FROM user_progress
                WHERE user_id = ?1
                ORDER BY subject ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }
}
