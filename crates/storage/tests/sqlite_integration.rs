use chrono::Duration;
use storage::repository::ProgressRepository;
use storage::sqlite::SqliteRepository;
use tutor_core::model::{FactId, FactProgressDelta, LessonId, LessonProgressPatch, Score};
use tutor_core::time::fixed_now;

async fn connect(name: &str, learner: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url, learner)
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_fact_progress_is_additive() {
    let repo = connect("memdb_additive", "learner-a").await;
    let lesson = LessonId::new(1);
    let fact = FactId::from_operands(2, 1);
    let delta = FactProgressDelta {
        attempts: 1,
        correct: 1,
        time_ms: 1_000,
    };

    repo.update_fact_progress(lesson, &fact, delta, fixed_now())
        .await
        .unwrap();
    repo.update_fact_progress(lesson, &fact, delta, fixed_now() + Duration::seconds(5))
        .await
        .unwrap();

    let stored = repo.lesson_progress(lesson).await.unwrap().expect("record");
    let counters = &stored.facts[&fact];
    assert_eq!(counters.attempts, 2);
    assert_eq!(counters.correct, 2);
    assert_eq!(counters.total_time_ms, 2_000);
    assert_eq!(
        counters.last_practiced_at,
        Some(fixed_now() + Duration::seconds(5))
    );
    assert_eq!(stored.current_step, 1);
    assert!(!stored.completed);
}

#[tokio::test]
async fn sqlite_patch_and_complete_roundtrip() {
    let repo = connect("memdb_complete", "learner-a").await;
    let lesson = LessonId::new(2);

    let updated = repo
        .update_lesson_progress(lesson, &LessonProgressPatch::step(4), fixed_now())
        .await
        .unwrap();
    assert_eq!(updated.current_step, 4);
    assert_eq!(updated.started_at, fixed_now());

    let score = Score::from_counts(7, 8).unwrap();
    let done = repo
        .complete_lesson(lesson, score, score.passed(), fixed_now())
        .await
        .unwrap();
    assert!(done.completed);
    assert!(done.passed);
    assert_eq!(done.quiz_score, Some(score));
    assert_eq!(done.completed_at, Some(fixed_now()));
    assert_eq!(done.current_step, 4);

    let reset = repo
        .update_lesson_progress(lesson, &LessonProgressPatch::restart_at(1), fixed_now())
        .await
        .unwrap();
    assert!(!reset.completed);
    assert!(reset.quiz_score.is_none());
}

#[tokio::test]
async fn sqlite_completed_and_export_only_count_passed_lessons() {
    let repo = connect("memdb_export", "learner-a").await;
    let shared = FactId::from_operands(2, 1);
    let hit = FactProgressDelta::answer(true, 800);
    let miss = FactProgressDelta::answer(false, 1_200);

    repo.update_fact_progress(LessonId::new(1), &shared, hit, fixed_now())
        .await
        .unwrap();
    repo.update_fact_progress(LessonId::new(2), &shared, miss, fixed_now())
        .await
        .unwrap();
    repo.update_fact_progress(LessonId::new(3), &FactId::from_operands(6, 1), hit, fixed_now())
        .await
        .unwrap();

    let full = Score::from_counts(4, 4).unwrap();
    let low = Score::from_counts(2, 4).unwrap();
    repo.complete_lesson(LessonId::new(1), full, true, fixed_now())
        .await
        .unwrap();
    repo.complete_lesson(LessonId::new(2), full, true, fixed_now())
        .await
        .unwrap();
    repo.complete_lesson(LessonId::new(3), low, false, fixed_now())
        .await
        .unwrap();

    assert_eq!(
        repo.completed_lessons().await.unwrap(),
        vec![LessonId::new(1), LessonId::new(2)]
    );

    let export = repo.export_facts_for_sync().await.unwrap();
    assert_eq!(export.len(), 1);
    let counters = export[&shared];
    assert_eq!(counters.attempts, 2);
    assert_eq!(counters.correct, 1);
    assert_eq!(counters.time_spent, 2_000);
}

#[tokio::test]
async fn sqlite_learners_are_isolated() {
    let alice = connect("memdb_learners", "alice").await;
    let bob = alice.for_learner("bob");
    let lesson = LessonId::new(5);

    alice
        .complete_lesson(lesson, Score::from_counts(4, 4).unwrap(), true, fixed_now())
        .await
        .unwrap();

    assert_eq!(alice.completed_lessons().await.unwrap(), vec![lesson]);
    assert!(bob.completed_lessons().await.unwrap().is_empty());
    assert!(bob.lesson_progress(lesson).await.unwrap().is_none());

    let all = alice.user_progress().await.unwrap();
    assert_eq!(all.lessons.len(), 1);
}

#[tokio::test]
async fn sqlite_rejects_blank_learner() {
    let result = SqliteRepository::connect("sqlite::memory:", "  ").await;
    assert!(result.is_err());
}
