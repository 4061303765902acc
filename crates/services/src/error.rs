//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::exam::ExamError;
use prep_core::model::StudyPlanError;
use prep_storage::repository::StorageError;
use prep_storage::sqlite::SqliteInitError;

/// Errors emitted by `QuestionDesk`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionDeskError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnswerDesk`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnswerDeskError {
    #[error("question not found")]
    UnknownQuestion,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionTrackerError {
    #[error("session belongs to another user")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyPlanDesk`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyPlanDeskError {
    #[error("study plan belongs to another user")]
    Forbidden,
    #[error(transparent)]
    Plan(#[from] StudyPlanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserDesk`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserDeskError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExamRunner`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamRunnerError {
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
