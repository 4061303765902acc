use prep_core::model::{Question, QuestionId, Subject};

use super::SqliteRepository;
use super::mapping::{json_string, map_question_row};
use crate::repository::{NewQuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, record: NewQuestionRecord) -> Result<Question, StorageError> {
        let options = json_string("options", &record.options)?;

        let res = sqlx::query(
            r"
                INSERT INTO questions (
                    subject, topic, difficulty, prompt, options,
                    correct_answer, explanation, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(record.subject.as_str())
        .bind(&record.topic)
        .bind(record.difficulty.as_str())
        .bind(&record.prompt)
        .bind(options)
        .bind(&record.correct_answer)
        .bind(&record.explanation)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.get_question(QuestionId::new(res.last_insert_rowid()))
            .await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, subject, topic, difficulty, prompt, options,
                       correct_answer, explanation, created_at
                FROM questions
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_question_row(&row)
    }

    async fn list_questions(&self, subject: Subject) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, subject, topic, difficulty, prompt, options,
                       correct_answer, explanation, created_at
                FROM questions
                WHERE subject = ?1
                ORDER BY id ASC
            ",
        )
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }
}
