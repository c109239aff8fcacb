//! Tests for `src/repo/messages.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use factcheck::fingerprint::Fingerprint;
use factcheck::repo::Repository;
use factcheck::types::{GroupStatus, Message, MessageGroup, MessageType, Topic, UserType};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6)
        .single()
        .expect("valid date")
}

fn message(group: &MessageGroup, at: DateTime<Utc>) -> Message {
    Message {
        id: Uuid::new_v4(),
        user_id: "U1".to_owned(),
        user_type: UserType::LineChat,
        topic_id: group.topic_id,
        group_id: group.id,
        message_type: MessageType::Text,
        text: group.text.clone(),
        metadata: serde_json::json!({ "type": "META_USERINFO", "data": { "user_id": "U1" } }),
        created_at: at,
        updated_at: None,
    }
}

async fn setup_group(repo: &Repository) -> MessageGroup {
    let group = MessageGroup {
        id: Uuid::new_v4(),
        status: GroupStatus::Pending,
        topic_id: None,
        name: String::new(),
        text: "msg".to_owned(),
        fingerprint: Fingerprint::of("msg"),
        language: None,
        created_at: t0(),
        updated_at: None,
    };
    let mut conn = repo.acquire().await.expect("acquire");
    repo.message_groups
        .create(&mut conn, &group)
        .await
        .expect("group")
}

#[tokio::test]
async fn create_get_round_trips_metadata() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let group = setup_group(&repo).await;
    let mut conn = repo.acquire().await.expect("acquire");

    let m = message(&group, t0());
    repo.messages.create(&mut conn, &m).await.expect("create");
    let loaded = repo
        .messages
        .get_by_id(&mut conn, m.id)
        .await
        .expect("get");

    assert_eq!(loaded, m);
}

#[tokio::test]
async fn message_requires_existing_group() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let mut conn = repo.acquire().await.expect("acquire");
    let orphan_group = MessageGroup {
        id: Uuid::new_v4(),
        status: GroupStatus::Pending,
        topic_id: None,
        name: String::new(),
        text: "orphan".to_owned(),
        fingerprint: Fingerprint::of("orphan"),
        language: None,
        created_at: t0(),
        updated_at: None,
    };

    let err = repo
        .messages
        .create(&mut conn, &message(&orphan_group, t0()))
        .await
        .expect_err("fk");

    assert_eq!(err.kind(), factcheck::ErrorKind::Storage);
}

#[tokio::test]
async fn lists_follow_submission_order_and_topic_moves() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let group = setup_group(&repo).await;
    let mut conn = repo.acquire().await.expect("acquire");
    let topic = Topic::new(Uuid::new_v4(), "t".into(), String::new(), t0());
    repo.topics.create(&mut conn, &topic).await.expect("topic");

    let first = message(&group, t0());
    let second = message(&group, t0() + Duration::seconds(3));
    // Same timestamp as `second`: insertion order breaks the tie.
    let third = message(&group, t0() + Duration::seconds(3));
    for m in [&first, &second, &third] {
        repo.messages.create(&mut conn, m).await.expect("create");
    }

    let by_group = repo
        .messages
        .list_by_group(&mut conn, group.id)
        .await
        .expect("by group");
    assert_eq!(
        by_group.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![first.id, second.id, third.id]
    );
    assert!(repo
        .messages
        .list_by_topic(&mut conn, topic.id)
        .await
        .expect("by topic")
        .is_empty());

    let moved = repo
        .messages
        .set_topic_for_group(&mut conn, group.id, Some(topic.id), t0())
        .await
        .expect("move");
    assert_eq!(moved, 3);
    let by_topic = repo
        .messages
        .list_by_topic(&mut conn, topic.id)
        .await
        .expect("by topic");
    assert_eq!(by_topic.len(), 3);
    assert!(by_topic.iter().all(|m| m.updated_at == Some(t0())));
}

#[tokio::test]
async fn missing_message_is_not_found() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let mut conn = repo.acquire().await.expect("acquire");

    let err = repo
        .messages
        .get_by_id(&mut conn, Uuid::new_v4())
        .await
        .expect_err("absent");

    assert!(err.is_not_found());
}

#[tokio::test]
async fn assign_group_moves_one_message() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let repo = Repository::new(pool);
    let from = setup_group(&repo).await;
    let mut conn = repo.acquire().await.expect("acquire");
    let to = MessageGroup {
        id: Uuid::new_v4(),
        text: "other".to_owned(),
        fingerprint: Fingerprint::of("other"),
        ..from.clone()
    };
    repo.message_groups
        .create(&mut conn, &to)
        .await
        .expect("group");
    let m = message(&from, t0());
    repo.messages.create(&mut conn, &m).await.expect("create");

    let later = t0() + Duration::minutes(1);
    let moved = repo
        .messages
        .assign_group(&mut conn, m.id, to.id, None, later)
        .await
        .expect("move");
    assert_eq!(moved.group_id, to.id);
    assert_eq!(moved.updated_at, Some(later));

    let err = repo
        .messages
        .assign_group(&mut conn, Uuid::new_v4(), to.id, None, later)
        .await
        .expect_err("absent");
    assert!(err.is_not_found());
}
