use chrono::Duration;
use prep_core::model::{
    Difficulty, Rank, SessionScope, SessionType, StudyPlanDraft, Subject, SubjectProgress, UserId,
    UserProfile,
};
use prep_core::time::fixed_now;
use prep_storage::repository::{
    AnswerRepository, NewAnswerRecord, NewQuestionRecord, NewSessionRecord, PlanPatch,
    ProgressRepository, QuestionRepository, SessionPatch, SessionRepository, StudyPlanRepository,
    UserRepository,
};
use prep_storage::sqlite::SqliteRepository;

async fn fresh_repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn question_record(subject: Subject) -> NewQuestionRecord {
    NewQuestionRecord {
        subject,
        topic: "Algebra".into(),
        difficulty: Difficulty::Medium,
        prompt: "If 3x = 12, what is x?".into(),
        options: vec!["2".into(), "3".into(), "4".into(), "6".into()],
        correct_answer: "C".into(),
        explanation: "Divide both sides by 3.".into(),
        created_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_roundtrip_persists_questions() {
    let repo = fresh_repo("memdb_questions").await;

    let inserted = repo
        .insert_question(question_record(Subject::Math))
        .await
        .unwrap();
    repo.insert_question(question_record(Subject::ReadingWriting))
        .await
        .unwrap();

    let fetched = repo.get_question(inserted.id()).await.expect("fetch");
    assert_eq!(fetched.subject(), Subject::Math);
    assert_eq!(fetched.options().len(), 4);
    assert_eq!(fetched.correct_answer(), "C");
    assert!(fetched.is_correct("C"));

    let math_only = repo.list_questions(Subject::Math).await.unwrap();
    assert_eq!(math_only.len(), 1);
    assert_eq!(math_only[0].id(), inserted.id());
}

#[tokio::test]
async fn sqlite_upserts_progress_per_subject() {
    let repo = fresh_repo("memdb_progress").await;
    let user = UserId::from("user-1");

    let mut progress = SubjectProgress::initial(user.clone(), Subject::Math, fixed_now());
    for _ in 0..3 {
        progress.record_answer(true, fixed_now());
    }
    repo.upsert_progress(&progress).await.unwrap();

    // Second upsert replaces, never duplicates.
    progress.record_answer(false, fixed_now());
    repo.upsert_progress(&progress).await.unwrap();

    let fetched = repo
        .get_progress(&user, Subject::Math)
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(fetched.total_questions(), 4);
    assert_eq!(fetched.correct_answers(), 3);
    assert_eq!(fetched.rank(), Rank::Bronze);
    assert!((fetched.rank_progress() - 30.0).abs() < f64::EPSILON);

    let all = repo.list_progress(&user).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn sqlite_sessions_update_and_list_newest_first() {
    let repo = fresh_repo("memdb_sessions").await;
    let user = UserId::from("user-1");

    let first = repo
        .append_session(NewSessionRecord {
            user_id: user.clone(),
            session_type: SessionType::Ranked,
            scope: SessionScope::Subject(Subject::Math),
            questions_answered: 0,
            correct_answers: 0,
            accuracy: 0.0,
            time_spent_secs: 0,
            completed: false,
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let second = repo
        .append_session(NewSessionRecord {
            user_id: user.clone(),
            session_type: SessionType::Test,
            scope: SessionScope::FullTest,
            questions_answered: 98,
            correct_answers: 70,
            accuracy: 71.4,
            time_spent_secs: 8040,
            completed: true,
            created_at: fixed_now() + Duration::hours(1),
        })
        .await
        .unwrap();

    let updated = repo
        .update_session(
            first.id(),
            &SessionPatch {
                questions_answered: Some(10),
                correct_answers: Some(8),
                accuracy: Some(80.0),
                time_spent_secs: Some(600),
                completed: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(updated.completed());
    assert_eq!(updated.session_type(), SessionType::Ranked);

    let listed = repo.list_sessions(&user, None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), second.id());

    let limited = repo.list_sessions(&user, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn sqlite_answer_log_appends_and_filters_by_session() {
    let repo = fresh_repo("memdb_answers").await;
    let user = UserId::from("user-1");

    let question = repo
        .insert_question(question_record(Subject::Math))
        .await
        .unwrap();
    let session = repo
        .append_session(NewSessionRecord {
            user_id: user.clone(),
            session_type: SessionType::Unranked,
            scope: SessionScope::Subject(Subject::Math),
            questions_answered: 0,
            correct_answers: 0,
            accuracy: 0.0,
            time_spent_secs: 0,
            completed: false,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

    let in_session = NewAnswerRecord {
        user_id: user.clone(),
        question_id: question.id(),
        session_id: Some(session.id()),
        user_answer: "C".into(),
        is_correct: true,
        time_spent_secs: 40,
        created_at: fixed_now(),
    };
    repo.append_answer(in_session.clone()).await.unwrap();
    repo.append_answer(in_session).await.unwrap();
    repo.append_answer(NewAnswerRecord {
        user_id: user.clone(),
        question_id: question.id(),
        session_id: None,
        user_answer: "A".into(),
        is_correct: false,
        time_spent_secs: 25,
        created_at: fixed_now() + Duration::minutes(1),
    })
    .await
    .unwrap();

    let all = repo.list_answers(&user, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(!all[0].is_correct());

    let scoped = repo.list_answers(&user, Some(session.id())).await.unwrap();
    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|a| a.session_id() == Some(session.id())));
}

#[tokio::test]
async fn sqlite_study_plan_lifecycle() {
    let repo = fresh_repo("memdb_plans").await;
    let user = UserId::from("user-1");

    let plan = repo
        .append_plan(
            &user,
            &StudyPlanDraft {
                name: "Spring test prep".into(),
                target_score: Some(1350),
                test_date: Some(fixed_now() + Duration::days(90)),
                daily_goal_minutes: 30,
                subjects: vec![Subject::Math, Subject::ReadingWriting],
            },
            fixed_now(),
        )
        .await
        .unwrap();
    assert!(plan.is_active());

    let updated = repo
        .update_plan(
            plan.id(),
            &PlanPatch {
                target_score: Some(Some(1450)),
                is_active: Some(false),
                ..PlanPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.target_score(), Some(1450));
    assert!(!updated.is_active());
    assert_eq!(updated.name(), "Spring test prep");

    // Deactivated plans stay on record.
    let stored = repo.get_plan(plan.id()).await.unwrap();
    assert!(!stored.is_active());
    assert_eq!(repo.list_plans(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_user_profile_upsert_is_idempotent() {
    let repo = fresh_repo("memdb_users").await;
    let id = UserId::from("user-1");

    assert!(repo.get_user(&id).await.unwrap().is_none());

    let mut profile = UserProfile::bare(id.clone(), fixed_now());
    profile.email = Some("student@example.com".into());
    repo.upsert_user(&profile).await.unwrap();

    profile.first_name = Some("Ada".into());
    repo.upsert_user(&profile).await.unwrap();

    let fetched = repo.get_user(&id).await.unwrap().expect("profile exists");
    assert_eq!(fetched.email.as_deref(), Some("student@example.com"));
    assert_eq!(fetched.first_name.as_deref(), Some("Ada"));
    assert_eq!(fetched.created_at, fixed_now());
}
