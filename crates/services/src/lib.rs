#![forbid(unsafe_code)]

pub mod answer_desk;
pub mod app_services;
pub mod error;
pub mod exam_runner;
pub mod question_desk;
pub mod session_tracker;
pub mod study_plan_desk;
pub mod user_desk;

pub use prep_core::Clock;

pub use answer_desk::{AnswerDesk, AnswerSubmission};
pub use app_services::AppServices;
pub use error::{
    AnswerDeskError, AppServicesError, ExamRunnerError, QuestionDeskError, SessionTrackerError,
    StudyPlanDeskError, UserDeskError,
};
pub use exam_runner::{ExamRunner, ExamSnapshot};
pub use question_desk::QuestionDesk;
pub use session_tracker::{SessionDraft, SessionTracker};
pub use study_plan_desk::StudyPlanDesk;
pub use user_desk::UserDesk;
