//! Tests for `src/repo/answers.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use factcheck::repo::Repository;
use factcheck::types::{Answer, Topic};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6)
        .single()
        .expect("valid date")
}

fn answer(topic: &Topic, text: &str, at: DateTime<Utc>) -> Answer {
    Answer {
        id: Uuid::new_v4(),
        topic_id: topic.id,
        user_id: "admin-1".to_owned(),
        text: text.to_owned(),
        created_at: at,
    }
}

#[tokio::test]
async fn history_is_newest_first() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let mut conn = repo.acquire().await.expect("acquire");
    let topic = Topic::new(Uuid::new_v4(), "t".into(), String::new(), t0());
    repo.topics.create(&mut conn, &topic).await.expect("topic");

    let old = answer(&topic, "draft", t0());
    let new = answer(&topic, "final", t0() + Duration::days(1));
    for a in [&old, &new] {
        repo.answers.create(&mut conn, a).await.expect("create");
    }

    let latest = repo
        .answers
        .latest_by_topic(&mut conn, topic.id)
        .await
        .expect("latest");
    assert_eq!(latest, new);

    let history = repo
        .answers
        .list_by_topic(&mut conn, topic.id)
        .await
        .expect("history");
    assert_eq!(history, vec![new.clone(), old.clone()]);

    let loaded = repo
        .answers
        .get_by_id(&mut conn, old.id)
        .await
        .expect("by id");
    assert_eq!(loaded, old);
}

#[tokio::test]
async fn topic_without_answers_has_no_latest() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let mut conn = repo.acquire().await.expect("acquire");

    let err = repo
        .answers
        .latest_by_topic(&mut conn, Uuid::new_v4())
        .await
        .expect_err("none");

    assert!(err.is_not_found());
    assert!(repo
        .answers
        .list_by_topic(&mut conn, Uuid::new_v4())
        .await
        .expect("empty")
        .is_empty());
}

#[tokio::test]
async fn answer_requires_existing_topic() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let mut conn = repo.acquire().await.expect("acquire");
    let ghost = Topic::new(Uuid::new_v4(), "ghost".into(), String::new(), t0());

    let err = repo
        .answers
        .create(&mut conn, &answer(&ghost, "x", t0()))
        .await
        .expect_err("fk");

    assert_eq!(err.kind(), factcheck::ErrorKind::Storage);
}
