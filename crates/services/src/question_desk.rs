//! Question retrieval: filtered listing and random sampling.

use rand::rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

use prep_core::model::{Difficulty, Question, Subject};
use prep_storage::repository::QuestionRepository;

use crate::error::QuestionDeskError;

/// Read-side access to the question bank.
#[derive(Clone)]
pub struct QuestionDesk {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionDesk {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Questions for a subject, optionally narrowed by difficulty and capped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionDeskError::Storage` when repository access fails.
    pub async fn by_subject(
        &self,
        subject: Subject,
        difficulty: Option<Difficulty>,
        limit: Option<u32>,
    ) -> Result<Vec<Question>, QuestionDeskError> {
        let mut pool = self.filtered_pool(subject, difficulty).await?;
        if let Some(limit) = limit {
            pool.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(pool)
    }

    /// A random sample of `count` questions for a subject.
    ///
    /// A pool smaller than `count` returns the whole pool.
    ///
    /// # Errors
    ///
    /// Returns `QuestionDeskError::Storage` when repository access fails.
    pub async fn random(
        &self,
        subject: Subject,
        count: u32,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, QuestionDeskError> {
        let mut pool = self.filtered_pool(subject, difficulty).await?;
        pool.shuffle(&mut rng());
        pool.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        Ok(pool)
    }

    async fn filtered_pool(
        &self,
        subject: Subject,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, QuestionDeskError> {
        let mut pool = self.questions.list_questions(subject).await?;
        if let Some(difficulty) = difficulty {
            pool.retain(|q| q.difficulty() == difficulty);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_now;
    use prep_storage::repository::{InMemoryRepository, NewQuestionRecord};
    use std::collections::HashSet;

    async fn seeded_desk(count: u32) -> QuestionDesk {
        let repo = InMemoryRepository::new();
        for i in 0..count {
            let difficulty = match i % 3 {
                0 => Difficulty::Easy,
                1 => Difficulty::Medium,
                _ => Difficulty::Hard,
            };
            repo.insert_question(NewQuestionRecord {
                subject: Subject::Math,
                topic: "Algebra".into(),
                difficulty,
                prompt: format!("Question {i}"),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_answer: "A".into(),
                explanation: String::new(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        }
        QuestionDesk::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn by_subject_honors_difficulty_and_limit() {
        let desk = seeded_desk(9).await;

        let easy = desk
            .by_subject(Subject::Math, Some(Difficulty::Easy), None)
            .await
            .unwrap();
        assert_eq!(easy.len(), 3);
        assert!(easy.iter().all(|q| q.difficulty() == Difficulty::Easy));

        let capped = desk.by_subject(Subject::Math, None, Some(4)).await.unwrap();
        assert_eq!(capped.len(), 4);

        let other = desk
            .by_subject(Subject::ReadingWriting, None, None)
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn random_returns_distinct_questions() {
        let desk = seeded_desk(10).await;
        let sample = desk.random(Subject::Math, 5, None).await.unwrap();
        assert_eq!(sample.len(), 5);

        let ids: HashSet<_> = sample.iter().map(|q| q.id()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn random_with_short_pool_returns_everything() {
        let desk = seeded_desk(3).await;
        let sample = desk.random(Subject::Math, 10, None).await.unwrap();
        assert_eq!(sample.len(), 3);
    }
}
