use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{PlanId, UserId};
use crate::model::question::Subject;

/// Lowest score the SAT composite scale can produce.
pub const MIN_TARGET_SCORE: u16 = 400;
/// Highest score the SAT composite scale can produce.
pub const MAX_TARGET_SCORE: u16 = 1600;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyPlanError {
    #[error("study plan name cannot be empty")]
    EmptyName,

    #[error("target score must be within {MIN_TARGET_SCORE}..={MAX_TARGET_SCORE}, got {provided}")]
    TargetScoreOutOfRange { provided: u16 },

    #[error("daily goal must be > 0 minutes")]
    InvalidDailyGoal,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Caller-supplied fields for creating a study plan, validated before the
/// storage layer ever sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlanDraft {
    pub name: String,
    pub target_score: Option<u16>,
    pub test_date: Option<DateTime<Utc>>,
    pub daily_goal_minutes: u32,
    pub subjects: Vec<Subject>,
}

impl StudyPlanDraft {
    /// Check the draft's invariants.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanError` for an empty name, a target score outside
    /// the SAT scale, or a zero daily goal.
    pub fn validate(&self) -> Result<(), StudyPlanError> {
        if self.name.trim().is_empty() {
            return Err(StudyPlanError::EmptyName);
        }
        if let Some(score) = self.target_score
            && !(MIN_TARGET_SCORE..=MAX_TARGET_SCORE).contains(&score)
        {
            return Err(StudyPlanError::TargetScoreOutOfRange { provided: score });
        }
        if self.daily_goal_minutes == 0 {
            return Err(StudyPlanError::InvalidDailyGoal);
        }
        Ok(())
    }
}

//
// ─── STUDY PLAN ────────────────────────────────────────────────────────────────
//

/// A user's study plan: goal, cadence, and target subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    id: PlanId,
    user_id: UserId,
    name: String,
    target_score: Option<u16>,
    test_date: Option<DateTime<Utc>>,
    daily_goal_minutes: u32,
    subjects: Vec<Subject>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl StudyPlan {
    /// Rehydrate a plan from persisted storage, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `StudyPlanError` if the stored fields violate draft rules.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: PlanId,
        user_id: UserId,
        name: impl Into<String>,
        target_score: Option<u16>,
        test_date: Option<DateTime<Utc>>,
        daily_goal_minutes: u32,
        subjects: Vec<Subject>,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudyPlanError> {
        let draft = StudyPlanDraft {
            name: name.into(),
            target_score,
            test_date,
            daily_goal_minutes,
            subjects,
        };
        draft.validate()?;

        Ok(Self {
            id,
            user_id,
            name: draft.name,
            target_score: draft.target_score,
            test_date: draft.test_date,
            daily_goal_minutes: draft.daily_goal_minutes,
            subjects: draft.subjects,
            is_active,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> PlanId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target_score(&self) -> Option<u16> {
        self.target_score
    }

    #[must_use]
    pub fn test_date(&self) -> Option<DateTime<Utc>> {
        self.test_date
    }

    #[must_use]
    pub fn daily_goal_minutes(&self) -> u32 {
        self.daily_goal_minutes
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> StudyPlanDraft {
        StudyPlanDraft {
            name: "October push".into(),
            target_score: Some(1450),
            test_date: None,
            daily_goal_minutes: 30,
            subjects: vec![Subject::Math],
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let mut d = draft();
        d.name = "  ".into();
        assert_eq!(d.validate().unwrap_err(), StudyPlanError::EmptyName);
    }

    #[test]
    fn rejects_target_score_outside_sat_scale() {
        for score in [399, 1601, 0] {
            let mut d = draft();
            d.target_score = Some(score);
            assert!(matches!(
                d.validate().unwrap_err(),
                StudyPlanError::TargetScoreOutOfRange { .. }
            ));
        }
    }

    #[test]
    fn accepts_boundary_target_scores() {
        for score in [MIN_TARGET_SCORE, MAX_TARGET_SCORE] {
            let mut d = draft();
            d.target_score = Some(score);
            assert!(d.validate().is_ok());
        }
    }

    #[test]
    fn missing_target_score_is_fine() {
        let mut d = draft();
        d.target_score = None;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn rejects_zero_daily_goal() {
        let mut d = draft();
        d.daily_goal_minutes = 0;
        assert_eq!(d.validate().unwrap_err(), StudyPlanError::InvalidDailyGoal);
    }

    #[test]
    fn from_persisted_revalidates() {
        let err = StudyPlan::from_persisted(
            PlanId::new(1),
            UserId::new("u1"),
            "Plan",
            Some(2000),
            None,
            30,
            vec![Subject::Math],
            true,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StudyPlanError::TargetScoreOutOfRange { provided: 2000 }
        ));
    }
}
