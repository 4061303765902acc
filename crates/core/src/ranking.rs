//! Rank progression engine.
//!
//! Pure function from (current rank, current progress, correctness of the
//! latest answer) to the next (rank, progress). Each tier awards a fixed
//! progress increment per correct answer ([`Rank::progress_increment`]);
//! crossing 100 advances to the next tier with progress reset to 0, and the
//! top tier clamps at exactly 100.

use crate::model::{Rank, RankState};

/// Threshold at which a tier is cleared.
pub const RANK_UP_THRESHOLD: f64 = 100.0;

/// Apply one answer to a rank state.
///
/// Incorrect answers leave the state untouched; progress never decreases.
/// A correct answer adds the current tier's increment. When the result
/// reaches [`RANK_UP_THRESHOLD`]:
///
/// - below the top tier, the state advances to the successor with progress
///   reset to 0; any surplus above the threshold is discarded, not carried
///   into the next tier;
/// - at the top tier (emerald), progress is clamped to exactly the
///   threshold and never overflows.
#[must_use]
pub fn apply_answer(state: RankState, correct: bool) -> RankState {
    if !correct {
        return state;
    }

    let raised = state.progress + state.rank.progress_increment();
    if raised < RANK_UP_THRESHOLD {
        return RankState::new(state.rank, raised);
    }

    match state.rank.successor() {
        Some(next) => RankState::new(next, 0.0),
        None => RankState::new(state.rank, RANK_UP_THRESHOLD),
    }
}

/// Number of consecutive correct answers needed to clear a tier from zero.
///
/// Convenience for UIs that want to render "N to go"; derived from the
/// increment table rather than duplicated.
#[must_use]
pub fn answers_to_clear(rank: Rank) -> u32 {
    let increment = rank.progress_increment();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (RANK_UP_THRESHOLD / increment).ceil() as u32
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
