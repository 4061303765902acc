//! End-to-end practice flow over in-memory storage: answer questions in a
//! ranked session, watch the rank counters move, and close the session out.

use prep_core::model::{
    Difficulty, Rank, SessionScope, SessionType, StudyPlanDraft, Subject, UserId,
};
use prep_core::time::{fixed_clock, fixed_now};
use prep_storage::repository::{NewQuestionRecord, SessionPatch, Storage};
use prep_services::{AnswerSubmission, AppServices, SessionDraft};

async fn seeded_services() -> (AppServices, Vec<prep_core::model::Question>) {
    let storage = Storage::in_memory();
    let mut questions = Vec::new();
    for i in 0..12 {
        let question = storage
            .questions
            .insert_question(NewQuestionRecord {
                subject: Subject::Math,
                topic: "Algebra".into(),
                difficulty: Difficulty::Easy,
                prompt: format!("Math question {i}"),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_answer: "A".into(),
                explanation: String::new(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        questions.push(question);
    }
    (AppServices::from_storage(&storage, fixed_clock()), questions)
}

#[tokio::test]
async fn ranked_session_carries_a_user_from_bronze_to_silver() {
    let (services, questions) = seeded_services().await;
    let user = UserId::from("student-1");

    services.users().ensure_user(&user).await.unwrap();

    let session = services
        .sessions()
        .create(
            &user,
            SessionDraft::started(SessionType::Ranked, SessionScope::Subject(Subject::Math)),
        )
        .await
        .unwrap();

    // Ten correct answers at ten points each clears the bronze bar exactly.
    for question in questions.iter().take(10) {
        let record = services
            .answers()
            .submit(
                &user,
                AnswerSubmission {
                    question_id: question.id(),
                    session_id: Some(session.id()),
                    answer: "A".into(),
                    time_spent_secs: 30,
                },
            )
            .await
            .unwrap();
        assert!(record.is_correct());
    }

    let progress = services.answers().progress_overview(&user).await.unwrap();
    assert_eq!(progress.len(), 2);
    for row in &progress {
        assert_eq!(row.rank(), Rank::Silver);
        assert_eq!(row.rank_progress(), 0.0);
        assert_eq!(row.total_questions(), 10);
        assert!((row.average_accuracy() - 100.0).abs() < f64::EPSILON);
    }

    let closed = services
        .sessions()
        .update(
            &user,
            session.id(),
            &SessionPatch {
                questions_answered: Some(10),
                correct_answers: Some(10),
                accuracy: Some(100.0),
                time_spent_secs: Some(300),
                completed: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(closed.completed());

    let in_session = services
        .answers()
        .history(&user, Some(session.id()))
        .await
        .unwrap();
    assert_eq!(in_session.len(), 10);

    let recent = services.sessions().recent(&user, None).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert!(recent[0].completed());
}

#[tokio::test]
async fn wrong_answers_fill_history_but_not_rank() {
    let (services, questions) = seeded_services().await;
    let user = UserId::from("student-2");

    for question in questions.iter().take(4) {
        services
            .answers()
            .submit(
                &user,
                AnswerSubmission {
                    question_id: question.id(),
                    session_id: None,
                    answer: "D".into(),
                    time_spent_secs: 20,
                },
            )
            .await
            .unwrap();
    }

    let progress = services.answers().progress_overview(&user).await.unwrap();
    for row in &progress {
        assert_eq!(row.rank(), Rank::Bronze);
        assert_eq!(row.rank_progress(), 0.0);
        assert_eq!(row.total_questions(), 4);
        assert_eq!(row.correct_answers(), 0);
    }
    assert_eq!(services.answers().history(&user, None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn study_plans_live_alongside_practice() {
    let (services, _) = seeded_services().await;
    let user = UserId::from("student-3");

    let plan = services
        .study_plans()
        .create(
            &user,
            &StudyPlanDraft {
                name: "Eight weeks out".into(),
                target_score: Some(1300),
                test_date: Some(fixed_now() + chrono::Duration::days(56)),
                daily_goal_minutes: 40,
                subjects: vec![Subject::Math, Subject::ReadingWriting],
            },
        )
        .await
        .unwrap();
    assert!(plan.is_active());

    let listed = services.study_plans().list(&user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "Eight weeks out");
}
