//! Drives a timed mock exam on a one-second tick.
//!
//! The state machine itself lives in `prep_core::exam` and is purely
//! synchronous; this runner supplies the tick source. The ticker task is
//! held through an aborting guard that is dropped on every path out of the
//! Active phase, so a paused or abandoned exam can never keep counting in
//! the background.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::warn;

use prep_core::exam::{ExamPhase, ExamResults, MockExam, QuestionSlot, TickEvent};
use prep_core::model::{Question, UserId};

use crate::answer_desk::{AnswerDesk, AnswerSubmission};
use crate::error::ExamRunnerError;
use crate::question_desk::QuestionDesk;

/// Aborts the ticker task when dropped.
struct TickerGuard {
    handle: AbortHandle,
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read-only view of the running exam for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamSnapshot {
    pub phase: ExamPhase,
    pub current_section: usize,
    pub current_question: usize,
    pub time_remaining_secs: u32,
    pub section_time_remaining_secs: u32,
    pub answered: usize,
}

/// One user's in-progress mock exam.
///
/// Not persisted across sessions; dropping the runner abandons the exam and
/// stops its timer.
pub struct ExamRunner {
    user_id: UserId,
    question_desk: QuestionDesk,
    answer_desk: AnswerDesk,
    exam: Arc<Mutex<MockExam>>,
    section_questions: Arc<Mutex<Vec<Vec<Question>>>>,
    ticker: Option<TickerGuard>,
}

impl ExamRunner {
    /// A runner over the standard digital SAT sections.
    #[must_use]
    pub fn digital_sat(user_id: UserId, questions: QuestionDesk, answers: AnswerDesk) -> Self {
        Self::with_exam(user_id, questions, answers, MockExam::digital_sat())
    }

    /// A runner over a caller-supplied exam shape.
    #[must_use]
    pub fn with_exam(
        user_id: UserId,
        questions: QuestionDesk,
        answers: AnswerDesk,
        exam: MockExam,
    ) -> Self {
        let section_count = exam.sections().len();
        Self {
            user_id,
            question_desk: questions,
            answer_desk: answers,
            exam: Arc::new(Mutex::new(exam)),
            section_questions: Arc::new(Mutex::new(vec![Vec::new(); section_count])),
            ticker: None,
        }
    }

    /// Begin the exam: load the first section's questions and start ticking.
    ///
    /// A question-load failure is logged and the exam starts anyway; the
    /// timer does not wait for content.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless the exam is in Setup.
    pub async fn start(&mut self) -> Result<(), ExamRunnerError> {
        self.exam.lock().await.start()?;
        self.load_section(0).await;
        self.spawn_ticker().await;
        Ok(())
    }

    /// Freeze the countdown and release the tick source.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless the exam is Active.
    pub async fn pause(&mut self) -> Result<(), ExamRunnerError> {
        self.exam.lock().await.pause()?;
        self.ticker = None;
        Ok(())
    }

    /// Resume ticking from where the countdown stopped.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless the exam is Paused.
    pub async fn resume(&mut self) -> Result<(), ExamRunnerError> {
        self.exam.lock().await.resume()?;
        self.spawn_ticker().await;
        Ok(())
    }

    /// End the exam early and compute results.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless the exam is Active or Paused.
    pub async fn finish(&mut self) -> Result<ExamResults, ExamRunnerError> {
        let results = {
            let mut exam = self.exam.lock().await;
            exam.finish()?;
            exam.results()?
        };
        self.ticker = None;
        Ok(results)
    }

    /// Results after the exam completed, by timeout or by finishing early.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` while the exam is still running.
    pub async fn results(&self) -> Result<ExamResults, ExamRunnerError> {
        Ok(self.exam.lock().await.results()?)
    }

    /// Record an answer for a question in the current section and persist it
    /// through the answer log.
    ///
    /// The local selection always sticks; a persistence failure is logged
    /// and the exam keeps going.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless Active, or for an index past
    /// the current section.
    pub async fn select_answer(
        &self,
        question: usize,
        answer: &str,
        time_spent_secs: u32,
    ) -> Result<(), ExamRunnerError> {
        let section = {
            let mut exam = self.exam.lock().await;
            exam.select_answer(question, answer)?;
            exam.current_section()
        };

        let question_id = {
            let loaded = self.section_questions.lock().await;
            loaded
                .get(section)
                .and_then(|qs| qs.get(question))
                .map(Question::id)
        };
        let Some(question_id) = question_id else {
            // Content never loaded for this slot; nothing to log.
            return Ok(());
        };

        let submission = AnswerSubmission {
            question_id,
            session_id: None,
            answer: answer.to_owned(),
            time_spent_secs,
        };
        if let Err(e) = self.answer_desk.submit(&self.user_id, submission).await {
            warn!(user = %self.user_id, error = %e, "exam answer not persisted");
        }
        Ok(())
    }

    /// Flag or unflag a question for review; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless Active, or for an index past
    /// the current section.
    pub async fn toggle_flag(&self, question: usize) -> Result<bool, ExamRunnerError> {
        Ok(self.exam.lock().await.toggle_flag(question)?)
    }

    /// Jump to a question in the current section.
    ///
    /// # Errors
    ///
    /// Returns `ExamRunnerError::Exam` unless Active, or for an index past
    /// the current section.
    pub async fn goto_question(&self, question: usize) -> Result<(), ExamRunnerError> {
        Ok(self.exam.lock().await.goto_question(question)?)
    }

    /// Whether a slot is currently flagged.
    pub async fn is_flagged(&self, slot: QuestionSlot) -> bool {
        self.exam.lock().await.is_flagged(slot)
    }

    /// Current phase, counters, and position.
    pub async fn snapshot(&self) -> ExamSnapshot {
        let exam = self.exam.lock().await;
        ExamSnapshot {
            phase: exam.phase(),
            current_section: exam.current_section(),
            current_question: exam.current_question(),
            time_remaining_secs: exam.time_remaining_secs(),
            section_time_remaining_secs: exam.section_time_remaining_secs(),
            answered: exam.answered_count(),
        }
    }

    /// Loaded questions for a section, empty if loading failed.
    pub async fn questions_for_section(&self, section: usize) -> Vec<Question> {
        let loaded = self.section_questions.lock().await;
        loaded.get(section).cloned().unwrap_or_default()
    }

    async fn load_section(&self, section: usize) {
        let spec = {
            let exam = self.exam.lock().await;
            match exam.sections().get(section) {
                Some(spec) => spec.clone(),
                None => return,
            }
        };
        let count = u32::try_from(spec.question_count).unwrap_or(u32::MAX);
        match self.question_desk.random(spec.subject, count, None).await {
            Ok(questions) => {
                self.section_questions.lock().await[section] = questions;
            }
            Err(e) => {
                warn!(section = spec.name, error = %e,
                      "section questions failed to load; timer continues");
            }
        }
    }

    async fn spawn_ticker(&mut self) {
        let exam = Arc::clone(&self.exam);
        let section_questions = Arc::clone(&self.section_questions);
        let desk = self.question_desk.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a fresh interval fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let event = exam.lock().await.tick();
                match event {
                    Ok(TickEvent::Ticked) => {}
                    Ok(TickEvent::SectionAdvanced { section }) => {
                        let spec = {
                            let exam = exam.lock().await;
                            exam.sections().get(section).cloned()
                        };
                        let Some(spec) = spec else { continue };
                        let count = u32::try_from(spec.question_count).unwrap_or(u32::MAX);
                        match desk.random(spec.subject, count, None).await {
                            Ok(questions) => {
                                section_questions.lock().await[section] = questions;
                            }
                            Err(e) => {
                                warn!(section = spec.name, error = %e,
                                      "section questions failed to load; timer continues");
                            }
                        }
                    }
                    // Completed, or the phase changed under us.
                    Ok(TickEvent::Completed) | Err(_) => break,
                }
            }
        });

        self.ticker = Some(TickerGuard {
            handle: handle.abort_handle(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::exam::SectionSpec;
    use prep_core::model::{Difficulty, Subject};
    use prep_core::time::{fixed_clock, fixed_now};
    use prep_storage::repository::{InMemoryRepository, NewQuestionRecord, QuestionRepository};

    async fn seeded_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for subject in Subject::ALL {
            for i in 0..5 {
                repo.insert_question(NewQuestionRecord {
                    subject,
                    topic: "Mixed".into(),
                    difficulty: Difficulty::Medium,
                    prompt: format!("{:?} question {i}", subject),
                    options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                    correct_answer: "A".into(),
                    explanation: String::new(),
                    created_at: fixed_now(),
                })
                .await
                .unwrap();
            }
        }
        repo
    }

    fn short_exam() -> MockExam {
        MockExam::new(vec![
            SectionSpec {
                name: "First",
                subject: Subject::ReadingWriting,
                question_count: 3,
                time_limit_secs: 3,
            },
            SectionSpec {
                name: "Second",
                subject: Subject::Math,
                question_count: 3,
                time_limit_secs: 4,
            },
        ])
        .unwrap()
    }

    async fn runner() -> ExamRunner {
        let repo = seeded_repo().await;
        let questions = QuestionDesk::new(Arc::new(repo.clone()));
        let answers = AnswerDesk::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        ExamRunner::with_exam(UserId::from("examinee"), questions, answers, short_exam())
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_decrements_once_per_second() {
        let mut runner = runner().await;
        runner.start().await.unwrap();
        // Let the ticker task run once so its interval is anchored at start.
        settle().await;

        let before = runner.snapshot().await;
        assert_eq!(before.time_remaining_secs, 7);
        assert_eq!(before.section_time_remaining_secs, 3);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        let after = runner.snapshot().await;
        assert_eq!(after.time_remaining_secs, 5);
        assert_eq!(after.section_time_remaining_secs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn section_timeout_loads_next_section_questions() {
        let mut runner = runner().await;
        runner.start().await.unwrap();
        settle().await;
        assert_eq!(runner.questions_for_section(0).await.len(), 3);
        assert!(runner.questions_for_section(1).await.is_empty());

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;

        let snapshot = runner.snapshot().await;
        assert_eq!(snapshot.phase, ExamPhase::Active);
        assert_eq!(snapshot.current_section, 1);
        assert_eq!(snapshot.section_time_remaining_secs, 4);
        assert_eq!(runner.questions_for_section(1).await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pausing_stops_the_clock() {
        let mut runner = runner().await;
        runner.start().await.unwrap();
        settle().await;

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        runner.pause().await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;

        let snapshot = runner.snapshot().await;
        assert_eq!(snapshot.phase, ExamPhase::Paused);
        assert_eq!(snapshot.time_remaining_secs, 6);

        runner.resume().await.unwrap();
        settle().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(runner.snapshot().await.time_remaining_secs, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_completes_the_exam() {
        let mut runner = runner().await;
        runner.start().await.unwrap();
        settle().await;

        tokio::time::advance(Duration::from_secs(7)).await;
        settle().await;

        assert_eq!(runner.snapshot().await.phase, ExamPhase::Completed);
        let results = runner.results().await.unwrap();
        assert_eq!(results.total_questions, 6);
        assert_eq!(results.estimated_score, 800);
    }

    #[tokio::test(start_paused = true)]
    async fn selected_answers_reach_the_answer_log() {
        let mut runner = runner().await;
        runner.start().await.unwrap();

        runner.select_answer(0, "A", 10).await.unwrap();
        runner.select_answer(1, "C", 15).await.unwrap();

        let history = runner
            .answer_desk
            .history(&UserId::from("examinee"), None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        // "A" is always correct in the seeded bank, "C" never is.
        assert!(history.iter().any(|a| a.is_correct()));
        assert!(history.iter().any(|a| !a.is_correct()));
        assert_eq!(runner.snapshot().await.answered, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_early_scores_answered_fraction() {
        let mut runner = runner().await;
        runner.start().await.unwrap();
        runner.select_answer(0, "A", 5).await.unwrap();

        let results = runner.finish().await.unwrap();
        assert_eq!(results.answered_questions, 1);
        // 800 + floor(1/6 * 800)
        assert_eq!(results.estimated_score, 933);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(runner.snapshot().await.phase, ExamPhase::Completed);
    }
}
