//! Study-plan CRUD, scoped to the owning user.

use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{PlanId, StudyPlan, StudyPlanDraft, UserId};
use prep_storage::repository::{PlanPatch, StudyPlanRepository};

use crate::error::StudyPlanDeskError;

/// Per-user study plans: goal, cadence, and target subjects.
#[derive(Clone)]
pub struct StudyPlanDesk {
    clock: Clock,
    plans: Arc<dyn StudyPlanRepository>,
}

impl StudyPlanDesk {
    #[must_use]
    pub fn new(clock: Clock, plans: Arc<dyn StudyPlanRepository>) -> Self {
        Self { clock, plans }
    }

    /// Validate and store a new plan for the caller. New plans start active.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanDeskError::Plan` for an invalid draft, `Storage`
    /// when the row cannot be stored.
    pub async fn create(
        &self,
        user_id: &UserId,
        draft: &StudyPlanDraft,
    ) -> Result<StudyPlan, StudyPlanDeskError> {
        draft.validate()?;
        Ok(self
            .plans
            .append_plan(user_id, draft, self.clock.now())
            .await?)
    }

    /// The caller's plans, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanDeskError::Storage` when repository access fails.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<StudyPlan>, StudyPlanDeskError> {
        Ok(self.plans.list_plans(user_id).await?)
    }

    /// Apply a partial update to the caller's own plan.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanDeskError::Forbidden` when the plan belongs to
    /// someone else, `Storage(NotFound)` when it does not exist, or
    /// `Storage(Serialization)` when the patched plan is invalid.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: PlanId,
        patch: &PlanPatch,
    ) -> Result<StudyPlan, StudyPlanDeskError> {
        let current = self.plans.get_plan(id).await?;
        if current.user_id() != user_id {
            return Err(StudyPlanDeskError::Forbidden);
        }
        Ok(self.plans.update_plan(id, patch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{StudyPlanError, Subject};
    use prep_core::time::fixed_clock;
    use prep_storage::repository::InMemoryRepository;

    fn desk() -> StudyPlanDesk {
        StudyPlanDesk::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    fn draft(name: &str, target_score: Option<u16>) -> StudyPlanDraft {
        StudyPlanDraft {
            name: name.into(),
            target_score,
            test_date: None,
            daily_goal_minutes: 30,
            subjects: vec![Subject::Math],
        }
    }

    #[tokio::test]
    async fn create_validates_target_score_range() {
        let desk = desk();
        let user = UserId::from("u-1");

        let err = desk
            .create(&user, &draft("Too ambitious", Some(1700)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudyPlanDeskError::Plan(StudyPlanError::TargetScoreOutOfRange { provided: 1700 })
        ));

        let ok = desk.create(&user, &draft("Realistic", Some(1500))).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn plans_list_newest_first_per_user() {
        let desk = desk();
        let user = UserId::from("u-1");
        let other = UserId::from("u-2");

        desk.create(&user, &draft("First", None)).await.unwrap();
        desk.create(&user, &draft("Second", None)).await.unwrap();
        desk.create(&other, &draft("Theirs", None)).await.unwrap();

        let mine = desk.list(&user).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.user_id() == &user));
    }

    #[tokio::test]
    async fn updates_enforce_ownership() {
        let desk = desk();
        let owner = UserId::from("owner");
        let stranger = UserId::from("stranger");

        let plan = desk.create(&owner, &draft("Mine", None)).await.unwrap();

        let err = desk
            .update(&stranger, plan.id(), &PlanPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyPlanDeskError::Forbidden));

        // Retiring a plan is deactivation, not removal.
        let patch = PlanPatch {
            is_active: Some(false),
            ..PlanPatch::default()
        };
        let updated = desk.update(&owner, plan.id(), &patch).await.unwrap();
        assert!(!updated.is_active());
        assert_eq!(desk.list(&owner).await.unwrap().len(), 1);
    }
}
