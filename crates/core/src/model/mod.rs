mod answer;
mod ids;
mod progress;
mod question;
mod session;
mod study_plan;
mod user;

pub use ids::{AnswerId, ParseIdError, PlanId, QuestionId, SessionId, UserId};

pub use answer::AnswerRecord;
pub use progress::{ProgressError, Rank, RankState, SubjectProgress, accuracy};
pub use question::{Difficulty, ParseTokenError, Question, QuestionError, Subject};
pub use session::{
    PracticeSession, SessionRecordError, SessionScope, SessionType,
};
pub use study_plan::{
    MAX_TARGET_SCORE, MIN_TARGET_SCORE, StudyPlan, StudyPlanDraft, StudyPlanError,
};
pub use user::UserProfile;
