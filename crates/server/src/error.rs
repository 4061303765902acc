//! HTTP error surface.
//!
//! Service and storage errors are folded into a small `ApiError` enum here,
//! at the edge, so handlers stay a straight line of `?`s. Internal failures
//! are logged server-side and reported to the client with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use prep_services::{
    AnswerDeskError, QuestionDeskError, SessionTrackerError, StudyPlanDeskError, UserDeskError,
};
use prep_storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing x-user-id header")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Storage errors reach the client as 404 or 400 where they carry meaning;
/// everything else is logged and collapsed to a generic 500.
fn from_storage(e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound => ApiError::NotFound,
        StorageError::Serialization(msg) => ApiError::Validation(msg),
        other => {
            error!(error = %other, "storage failure");
            ApiError::Internal
        }
    }
}

impl From<QuestionDeskError> for ApiError {
    fn from(e: QuestionDeskError) -> Self {
        match e {
            QuestionDeskError::Storage(e) => from_storage(e),
            other => {
                error!(error = %other, "question desk failure");
                ApiError::Internal
            }
        }
    }
}

impl From<AnswerDeskError> for ApiError {
    fn from(e: AnswerDeskError) -> Self {
        match e {
            AnswerDeskError::UnknownQuestion => ApiError::NotFound,
            AnswerDeskError::Storage(e) => from_storage(e),
            other => {
                error!(error = %other, "answer desk failure");
                ApiError::Internal
            }
        }
    }
}

impl From<SessionTrackerError> for ApiError {
    fn from(e: SessionTrackerError) -> Self {
        match e {
            SessionTrackerError::Forbidden => ApiError::Forbidden,
            SessionTrackerError::Storage(e) => from_storage(e),
            other => {
                error!(error = %other, "session tracker failure");
                ApiError::Internal
            }
        }
    }
}

impl From<StudyPlanDeskError> for ApiError {
    fn from(e: StudyPlanDeskError) -> Self {
        match e {
            StudyPlanDeskError::Forbidden => ApiError::Forbidden,
            StudyPlanDeskError::Plan(e) => ApiError::Validation(e.to_string()),
            StudyPlanDeskError::Storage(e) => from_storage(e),
            other => {
                error!(error = %other, "study plan desk failure");
                ApiError::Internal
            }
        }
    }
}

impl From<UserDeskError> for ApiError {
    fn from(e: UserDeskError) -> Self {
        match e {
            UserDeskError::Storage(e) => from_storage(e),
            other => {
                error!(error = %other, "user desk failure");
                ApiError::Internal
            }
        }
    }
}
