//! Timed practice-test orchestrator.
//!
//! [`MockExam`] is a pure state machine for a multi-section, timed exam:
//! `Setup → Active ⇄ Paused → Completed`. It owns two countdown counters,
//! one for the whole test and one for the current section, both decremented
//! together by [`MockExam::tick`]. The caller supplies the tick source (one
//! call per second while active); pausing simply means not ticking, so
//! wall-clock time spent paused is never counted against the remaining time.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::Subject;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam has no sections")]
    NoSections,

    #[error("section {index} has a zero question count or time budget")]
    InvalidSection { index: usize },

    #[error("operation requires phase {required:?}, exam is {actual:?}")]
    WrongPhase {
        required: ExamPhase,
        actual: ExamPhase,
    },

    #[error("question index {index} outside current section (0..{count})")]
    QuestionOutOfRange { index: usize, count: usize },
}

//
// ─── SECTIONS ──────────────────────────────────────────────────────────────────
//

/// Fixed description of one exam section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSpec {
    pub name: &'static str,
    pub subject: Subject,
    pub question_count: usize,
    pub time_limit_secs: u32,
}

/// The two sections of the digital SAT: Reading & Writing (54 questions in
/// 64 minutes) followed by Math (44 questions in 70 minutes).
#[must_use]
pub fn digital_sat_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec {
            name: "Reading & Writing",
            subject: Subject::ReadingWriting,
            question_count: 54,
            time_limit_secs: 64 * 60,
        },
        SectionSpec {
            name: "Math",
            subject: Subject::Math,
            question_count: 44,
            time_limit_secs: 70 * 60,
        },
    ]
}

//
// ─── PHASES AND EVENTS ─────────────────────────────────────────────────────────
//

/// Lifecycle phase of an exam. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamPhase {
    Setup,
    Active,
    Paused,
    Completed,
}

/// What a single tick did beyond decrementing the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Both counters decreased, nothing else happened.
    Ticked,
    /// The section timer ran out; the exam moved to the section at this
    /// index with a fresh section budget.
    SectionAdvanced { section: usize },
    /// The exam finished, either because the overall timer ran out or the
    /// last section's timer did.
    Completed,
}

/// Position of a question within the exam: (section index, question index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionSlot {
    pub section: usize,
    pub question: usize,
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Per-section mock score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionScore {
    pub name: &'static str,
    pub score: u32,
}

/// Summary computed when the exam completes.
///
/// The score formulas are an acknowledged placeholder scaled by the fraction
/// of questions answered, not a real SAT conversion table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamResults {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub estimated_score: u32,
    pub section_scores: Vec<SectionScore>,
}

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

/// State machine for one timed practice test.
#[derive(Debug, Clone)]
pub struct MockExam {
    sections: Vec<SectionSpec>,
    phase: ExamPhase,
    current_section: usize,
    current_question: usize,
    time_remaining_secs: u32,
    section_time_remaining_secs: u32,
    answers: HashMap<QuestionSlot, String>,
    flagged: HashSet<QuestionSlot>,
}

impl MockExam {
    /// Build an exam over the given sections, starting in `Setup`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoSections` for an empty section list, or
    /// `ExamError::InvalidSection` when a section has no questions or no
    /// time budget.
    pub fn new(sections: Vec<SectionSpec>) -> Result<Self, ExamError> {
        if sections.is_empty() {
            return Err(ExamError::NoSections);
        }
        for (index, section) in sections.iter().enumerate() {
            if section.question_count == 0 || section.time_limit_secs == 0 {
                return Err(ExamError::InvalidSection { index });
            }
        }

        Ok(Self {
            sections,
            phase: ExamPhase::Setup,
            current_section: 0,
            current_question: 0,
            time_remaining_secs: 0,
            section_time_remaining_secs: 0,
            answers: HashMap::new(),
            flagged: HashSet::new(),
        })
    }

    /// A standard two-section digital SAT exam.
    ///
    /// # Panics
    ///
    /// Never panics; the standard sections are statically valid.
    #[must_use]
    pub fn digital_sat() -> Self {
        Self::new(digital_sat_sections()).expect("standard sections are valid")
    }

    fn require_phase(&self, required: ExamPhase) -> Result<(), ExamError> {
        if self.phase == required {
            Ok(())
        } else {
            Err(ExamError::WrongPhase {
                required,
                actual: self.phase,
            })
        }
    }

    /// Begin the exam: load the first section and arm both timers.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless the exam is in `Setup`.
    pub fn start(&mut self) -> Result<(), ExamError> {
        self.require_phase(ExamPhase::Setup)?;
        self.current_section = 0;
        self.current_question = 0;
        self.section_time_remaining_secs = self.sections[0].time_limit_secs;
        self.time_remaining_secs = self.sections.iter().map(|s| s.time_limit_secs).sum();
        self.phase = ExamPhase::Active;
        Ok(())
    }

    /// Advance both countdowns by one second.
    ///
    /// The overall and section counters always move together; the overall
    /// timer hitting zero completes the exam no matter how much section
    /// time is nominally left, while the section timer hitting zero either
    /// advances to the next section with a fresh budget or completes the
    /// exam on the last one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless the exam is `Active`; a
    /// paused exam does not tick.
    pub fn tick(&mut self) -> Result<TickEvent, ExamError> {
        self.require_phase(ExamPhase::Active)?;

        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        self.section_time_remaining_secs = self.section_time_remaining_secs.saturating_sub(1);

        if self.time_remaining_secs == 0 {
            self.phase = ExamPhase::Completed;
            return Ok(TickEvent::Completed);
        }

        if self.section_time_remaining_secs == 0 {
            let next = self.current_section + 1;
            if next >= self.sections.len() {
                self.phase = ExamPhase::Completed;
                return Ok(TickEvent::Completed);
            }
            self.current_section = next;
            self.current_question = 0;
            self.section_time_remaining_secs = self.sections[next].time_limit_secs;
            return Ok(TickEvent::SectionAdvanced { section: next });
        }

        Ok(TickEvent::Ticked)
    }

    /// Freeze the countdown without resetting it.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless the exam is `Active`.
    pub fn pause(&mut self) -> Result<(), ExamError> {
        self.require_phase(ExamPhase::Active)?;
        self.phase = ExamPhase::Paused;
        Ok(())
    }

    /// Resume ticking from where the countdown stopped.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless the exam is `Paused`.
    pub fn resume(&mut self) -> Result<(), ExamError> {
        self.require_phase(ExamPhase::Paused)?;
        self.phase = ExamPhase::Active;
        Ok(())
    }

    /// End the exam early, forfeiting unanswered questions.
    ///
    /// Legal from `Active` or `Paused`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` from `Setup` or `Completed`.
    pub fn finish(&mut self) -> Result<(), ExamError> {
        match self.phase {
            ExamPhase::Active | ExamPhase::Paused => {
                self.phase = ExamPhase::Completed;
                Ok(())
            }
            actual => Err(ExamError::WrongPhase {
                required: ExamPhase::Active,
                actual,
            }),
        }
    }

    fn check_question_index(&self, index: usize) -> Result<(), ExamError> {
        let count = self.sections[self.current_section].question_count;
        if index >= count {
            return Err(ExamError::QuestionOutOfRange { index, count });
        }
        Ok(())
    }

    /// Record an answer for a question in the current section.
    ///
    /// Last write wins: re-answering a question replaces the earlier choice
    /// in the exam's local state.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless `Active`, or
    /// `ExamError::QuestionOutOfRange` for an index past the section.
    pub fn select_answer(
        &mut self,
        question: usize,
        answer: impl Into<String>,
    ) -> Result<(), ExamError> {
        self.require_phase(ExamPhase::Active)?;
        self.check_question_index(question)?;
        self.answers.insert(
            QuestionSlot {
                section: self.current_section,
                question,
            },
            answer.into(),
        );
        Ok(())
    }

    /// Flag or unflag a question for review. Independent of answer state.
    ///
    /// Returns the new flagged state.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless `Active`, or
    /// `ExamError::QuestionOutOfRange` for an index past the section.
    pub fn toggle_flag(&mut self, question: usize) -> Result<bool, ExamError> {
        self.require_phase(ExamPhase::Active)?;
        self.check_question_index(question)?;
        let slot = QuestionSlot {
            section: self.current_section,
            question,
        };
        if self.flagged.remove(&slot) {
            Ok(false)
        } else {
            self.flagged.insert(slot);
            Ok(true)
        }
    }

    /// Jump to any question in the current section; answering order is not
    /// enforced.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless `Active`, or
    /// `ExamError::QuestionOutOfRange` for an index past the section.
    pub fn goto_question(&mut self, question: usize) -> Result<(), ExamError> {
        self.require_phase(ExamPhase::Active)?;
        self.check_question_index(question)?;
        self.current_question = question;
        Ok(())
    }

    /// Compute the end-of-test summary.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::WrongPhase` unless the exam is `Completed`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn results(&self) -> Result<ExamResults, ExamError> {
        self.require_phase(ExamPhase::Completed)?;

        let total_questions: usize = self.sections.iter().map(|s| s.question_count).sum();
        let answered_questions = self.answers.len();
        let fraction = if total_questions == 0 {
            0.0
        } else {
            answered_questions as f64 / total_questions as f64
        };

        // Placeholder scale: 800 base + up to 800 overall, 200 + up to 600
        // per section, both driven by the answered fraction.
        let estimated_score = 800 + (fraction * 800.0).floor() as u32;
        let section_scores = self
            .sections
            .iter()
            .map(|section| SectionScore {
                name: section.name,
                score: 200 + (fraction * 600.0).floor() as u32,
            })
            .collect();

        Ok(ExamResults {
            total_questions,
            answered_questions,
            estimated_score,
            section_scores,
        })
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    #[must_use]
    pub fn current_section(&self) -> usize {
        self.current_section
    }

    #[must_use]
    pub fn current_section_spec(&self) -> &SectionSpec {
        &self.sections[self.current_section]
    }

    #[must_use]
    pub fn current_question(&self) -> usize {
        self.current_question
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    #[must_use]
    pub fn section_time_remaining_secs(&self) -> u32 {
        self.section_time_remaining_secs
    }

    /// The answer currently recorded for a slot, if any.
    #[must_use]
    pub fn answer(&self, slot: QuestionSlot) -> Option<&str> {
        self.answers.get(&slot).map(String::as_str)
    }

    #[must_use]
    pub fn is_flagged(&self, slot: QuestionSlot) -> bool {
        self.flagged.contains(&slot)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
