use chrono::{DateTime, Utc};
use prep_core::model::{PlanId, StudyPlan, StudyPlanDraft, UserId};

use super::SqliteRepository;
use super::mapping::{json_string, map_plan_row, ser};
use crate::repository::{PlanPatch, StorageError, StudyPlanRepository};

#[async_trait::async_trait]
impl StudyPlanRepository for SqliteRepository {
    async fn append_plan(
        &self,
        user_id: &UserId,
        draft: &StudyPlanDraft,
        created_at: DateTime<Utc>,
    ) -> Result<StudyPlan, StorageError> {
        draft.validate().map_err(ser)?;
        let subjects = json_string("subjects", &draft.subjects)?;

        let res = sqlx::query(
            r"
                INSERT INTO study_plans (
                    user_id, name, target_score, test_date,
                    daily_goal_minutes, subjects, is_active, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
            ",
        )
        .bind(user_id.as_str())
        .bind(&draft.name)
        .bind(draft.target_score.map(i64::from))
        .bind(draft.test_date)
        .bind(i64::from(draft.daily_goal_minutes))
        .bind(subjects)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.get_plan(PlanId::new(res.last_insert_rowid())).await
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, name, target_score, test_date,
                       daily_goal_minutes, subjects, is_active, created_at
                FROM study_plans
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_plan_row(&row)
    }

    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<StudyPlan>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, name, target_score, test_date,
                       daily_goal_minutes, subjects, is_active, created_at
                FROM study_plans
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_plan_row(&row)?);
        }
        Ok(out)
    }

    async fn update_plan(&self, id: PlanId, patch: &PlanPatch) -> Result<StudyPlan, StorageError> {
        let current = self.get_plan(id).await?;
        let updated = patch.apply(&current)?;
        let subjects = json_string("subjects", &updated.subjects().to_vec())?;

        sqlx::query(
            r"
                UPDATE study_plans SET
                    name = ?2,
                    target_score = ?3,
                    test_date = ?4,
                    daily_goal_minutes = ?5,
                    subjects = ?6,
                    is_active = ?7
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .bind(updated.name())
        .bind(updated.target_score().map(i64::from))
        .bind(updated.test_date())
        .bind(i64::from(updated.daily_goal_minutes()))
        .bind(subjects)
        .bind(updated.is_active())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(updated)
    }
}
