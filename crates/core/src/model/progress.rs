use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::question::{ParseTokenError, Subject};
use crate::ranking;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("rank progress must be within 0..=100, got {provided}")]
    InvalidRankProgress { provided: f64 },
}

//
// ─── RANK ──────────────────────────────────────────────────────────────────────
//

/// One of five ordered proficiency tiers, per subject.
///
/// This is the single definition of the tier sequence; the progression
/// engine and any rendering layer both consume it, so the order cannot
/// drift between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Diamond,
    Emerald,
}

impl Rank {
    /// All ranks, lowest tier first.
    pub const ALL: [Rank; 5] = [
        Rank::Bronze,
        Rank::Silver,
        Rank::Gold,
        Rank::Diamond,
        Rank::Emerald,
    ];

    /// The next tier up, or `None` at the top.
    #[must_use]
    pub fn successor(self) -> Option<Rank> {
        match self {
            Rank::Bronze => Some(Rank::Silver),
            Rank::Silver => Some(Rank::Gold),
            Rank::Gold => Some(Rank::Diamond),
            Rank::Diamond => Some(Rank::Emerald),
            Rank::Emerald => None,
        }
    }

    /// Progress awarded for one correct answer at this tier.
    ///
    /// Higher tiers award less, so each tier takes longer to clear.
    #[must_use]
    pub fn progress_increment(self) -> f64 {
        match self {
            Rank::Bronze => 10.0,
            Rank::Silver => 8.0,
            Rank::Gold => 6.0,
            Rank::Diamond => 4.0,
            Rank::Emerald => 2.0,
        }
    }

    #[must_use]
    pub fn is_top(self) -> bool {
        self.successor().is_none()
    }

    /// Canonical storage/wire token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Bronze => "bronze",
            Rank::Silver => "silver",
            Rank::Gold => "gold",
            Rank::Diamond => "diamond",
            Rank::Emerald => "emerald",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Rank::Bronze),
            "silver" => Ok(Rank::Silver),
            "gold" => Ok(Rank::Gold),
            "diamond" => Ok(Rank::Diamond),
            "emerald" => Ok(Rank::Emerald),
            other => Err(ParseTokenError::new("rank", other)),
        }
    }
}

/// Rank plus progress toward the next tier, the state the progression
/// engine transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankState {
    pub rank: Rank,
    pub progress: f64,
}

impl RankState {
    #[must_use]
    pub fn new(rank: Rank, progress: f64) -> Self {
        Self { rank, progress }
    }

    /// Starting state for a fresh subject: bronze with zero progress.
    #[must_use]
    pub fn initial() -> Self {
        Self::new(Rank::Bronze, 0.0)
    }
}

impl Default for RankState {
    fn default() -> Self {
        Self::initial()
    }
}

//
// ─── SUBJECT PROGRESS ──────────────────────────────────────────────────────────
//

/// Per-user, per-subject aggregate counters and rank state.
///
/// One row per (user, subject); created lazily on the first answer and
/// mutated after every answer thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    user_id: UserId,
    subject: Subject,
    rank: Rank,
    rank_progress: f64,
    total_questions: u32,
    correct_answers: u32,
    average_accuracy: f64,
    updated_at: DateTime<Utc>,
}

impl SubjectProgress {
    /// Fresh bronze/zero progress for a subject the user has never practiced.
    #[must_use]
    pub fn initial(user_id: UserId, subject: Subject, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            subject,
            rank: Rank::Bronze,
            rank_progress: 0.0,
            total_questions: 0,
            correct_answers: 0,
            average_accuracy: 0.0,
            updated_at: now,
        }
    }

    /// Rehydrate a progress row from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if counters are inconsistent or rank progress
    /// is outside 0..=100.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        subject: Subject,
        rank: Rank,
        rank_progress: f64,
        total_questions: u32,
        correct_answers: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if correct_answers > total_questions {
            return Err(ProgressError::CountMismatch {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if !(0.0..=100.0).contains(&rank_progress) {
            return Err(ProgressError::InvalidRankProgress {
                provided: rank_progress,
            });
        }

        Ok(Self {
            user_id,
            subject,
            rank,
            rank_progress,
            total_questions,
            correct_answers,
            average_accuracy: accuracy(correct_answers, total_questions),
            updated_at,
        })
    }

    /// Fold one answer into the counters and run the rank progression engine.
    pub fn record_answer(&mut self, correct: bool, now: DateTime<Utc>) {
        self.total_questions = self.total_questions.saturating_add(1);
        if correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        self.average_accuracy = accuracy(self.correct_answers, self.total_questions);

        let next = ranking::apply_answer(RankState::new(self.rank, self.rank_progress), correct);
        self.rank = next.rank;
        self.rank_progress = next.progress;
        self.updated_at = now;
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[must_use]
    pub fn rank_progress(&self) -> f64 {
        self.rank_progress
    }

    #[must_use]
    pub fn rank_state(&self) -> RankState {
        RankState::new(self.rank, self.rank_progress)
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn average_accuracy(&self) -> f64 {
        self.average_accuracy
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Percentage accuracy from running counters; 0/0 is defined as 0.
#[must_use]
pub fn accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total) * 100.0
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rank_order_is_bronze_to_emerald() {
        assert!(Rank::Bronze < Rank::Silver);
        assert!(Rank::Silver < Rank::Gold);
        assert!(Rank::Gold < Rank::Diamond);
        assert!(Rank::Diamond < Rank::Emerald);
    }

    #[test]
    fn successor_chain_terminates_at_emerald() {
        let mut rank = Rank::Bronze;
        let mut seen = vec![rank];
        while let Some(next) = rank.successor() {
            seen.push(next);
            rank = next;
        }
        assert_eq!(seen, Rank::ALL);
        assert!(Rank::Emerald.is_top());
    }

    #[test]
    fn increments_decrease_with_tier() {
        let increments: Vec<f64> = Rank::ALL.iter().map(|r| r.progress_increment()).collect();
        assert_eq!(increments, vec![10.0, 8.0, 6.0, 4.0, 2.0]);
    }

    #[test]
    fn rank_token_roundtrip() {
        for rank in Rank::ALL {
            let parsed: Rank = rank.as_str().parse().unwrap();
            assert_eq!(parsed, rank);
        }
        assert!("platinum".parse::<Rank>().is_err());
    }

    #[test]
    fn accuracy_of_no_answers_is_zero() {
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn accuracy_stays_within_bounds() {
        for (correct, total) in [(0, 1), (1, 2), (3, 4), (7, 7)] {
            let acc = accuracy(correct, total);
            assert!((0.0..=100.0).contains(&acc), "accuracy {acc} out of range");
        }
        assert_eq!(accuracy(7, 7), 100.0);
    }

    #[test]
    fn record_answer_updates_counters_and_accuracy() {
        let mut progress =
            SubjectProgress::initial(UserId::new("u1"), Subject::Math, fixed_now());
        progress.record_answer(true, fixed_now());
        progress.record_answer(false, fixed_now());

        assert_eq!(progress.total_questions(), 2);
        assert_eq!(progress.correct_answers(), 1);
        assert_eq!(progress.average_accuracy(), 50.0);
        assert_eq!(progress.rank(), Rank::Bronze);
        assert_eq!(progress.rank_progress(), 10.0);
    }

    #[test]
    fn from_persisted_rejects_inconsistent_counters() {
        let err = SubjectProgress::from_persisted(
            UserId::new("u1"),
            Subject::Math,
            Rank::Bronze,
            0.0,
            2,
            3,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ProgressError::CountMismatch { .. }));
    }

    #[test]
    fn from_persisted_rejects_out_of_range_progress() {
        let err = SubjectProgress::from_persisted(
            UserId::new("u1"),
            Subject::Math,
            Rank::Bronze,
            120.0,
            1,
            1,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ProgressError::InvalidRankProgress { .. }));
    }
}
