//! Tests for `Service::submit`.

use uuid::Uuid;

use factcheck::error::{Error, ErrorKind};
use factcheck::fingerprint::Fingerprint;
use factcheck::types::{GroupStatus, MessageType, TopicStatus, UserType};

use crate::support::{admin, chat_user, count, setup, t0};

#[tokio::test]
async fn same_text_twice_shares_one_group() {
    let (service, _clock) = setup().await;

    let first = service
        .submit(&admin(), "vaccines cause X", None)
        .await
        .expect("first submit");
    let second = service
        .submit(&admin(), "vaccines cause X", None)
        .await
        .expect("second submit");

    assert!(first.group_created);
    assert!(!second.group_created);
    assert_eq!(first.group.id, second.group.id);
    assert_eq!(first.group.fingerprint, second.group.fingerprint);
    assert_eq!(first.group.status, GroupStatus::Pending);
    assert_ne!(first.message.id, second.message.id);
    assert!(first.topic.is_none());
    assert!(second.topic.is_none());

    assert_eq!(count(&service, "message_groups").await, 1);
    assert_eq!(count(&service, "messages").await, 2);
}

#[tokio::test]
async fn distinct_texts_get_distinct_groups() {
    let (service, _clock) = setup().await;

    let a = service.submit(&admin(), "claim A", None).await.expect("a");
    let b = service.submit(&admin(), "claim B", None).await.expect("b");

    assert_ne!(a.group.id, b.group.id);
    assert_ne!(a.group.fingerprint, b.group.fingerprint);
    assert_eq!(a.group.fingerprint, Fingerprint::of("claim A"));
}

#[tokio::test]
async fn new_group_is_pending_and_unassigned() {
    let (service, _clock) = setup().await;

    let sub = service
        .submit(&chat_user(), "drinking bleach cures flu", None)
        .await
        .expect("submit");

    assert_eq!(sub.group.status, GroupStatus::Pending);
    assert_eq!(sub.group.topic_id, None);
    assert_eq!(sub.group.text, "drinking bleach cures flu");
    assert_eq!(sub.group.created_at, t0());
}

#[tokio::test]
async fn message_carries_submitter_and_metadata() {
    let (service, _clock) = setup().await;
    let user = chat_user();

    let sub = service
        .submit(&user, "the moon is hollow", None)
        .await
        .expect("submit");

    assert_eq!(sub.message.user_id, user.user_id);
    assert_eq!(sub.message.user_type, UserType::LineChat);
    assert_eq!(sub.message.message_type, MessageType::Text);
    assert_eq!(sub.message.group_id, sub.group.id);
    assert_eq!(sub.message.text, "the moon is hollow");
    assert_eq!(sub.message.created_at, t0());
    assert_eq!(
        sub.message.metadata,
        serde_json::json!({
            "type": "META_USERINFO",
            "data": { "user_type": "line_chat", "user_id": "U4af4980629" }
        })
    );

    let repo = service.repository();
    let mut conn = repo.acquire().await.expect("acquire");
    let stored = repo
        .messages
        .get_by_id(&mut conn, sub.message.id)
        .await
        .expect("stored message");
    assert_eq!(stored, sub.message);
}

#[tokio::test]
async fn empty_text_is_rejected_without_writes() {
    let (service, _clock) = setup().await;

    let err = service
        .submit(&admin(), "", None)
        .await
        .expect_err("empty text");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("empty text"));
    assert_eq!(count(&service, "message_groups").await, 0);
    assert_eq!(count(&service, "messages").await, 0);
}

#[tokio::test]
async fn empty_user_id_is_rejected() {
    let (service, _clock) = setup().await;

    let err = service
        .submit(&factcheck::types::UserInfo::admin(""), "text", None)
        .await
        .expect_err("empty user");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(count(&service, "messages").await, 0);
}

#[tokio::test]
async fn unknown_topic_hint_is_not_found_without_writes() {
    let (service, _clock) = setup().await;
    let missing = Uuid::new_v4();

    let err = service
        .submit(&admin(), "t", Some(missing))
        .await
        .expect_err("missing topic");

    match &err {
        Error::NotFound { entity, filter } => {
            assert_eq!(*entity, "topic");
            assert_eq!(filter.get("id"), Some(missing.to_string().as_str()));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(count(&service, "message_groups").await, 0);
    assert_eq!(count(&service, "messages").await, 0);
}

#[tokio::test]
async fn resolved_topic_rejects_submissions() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("closed", "").await.expect("topic");
    service
        .resolve(&admin(), topic.id, "false")
        .await
        .expect("resolve");

    let err = service
        .submit(&admin(), "late claim", Some(topic.id))
        .await
        .expect_err("resolved topic");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(count(&service, "messages").await, 0);
}

#[tokio::test]
async fn hint_does_not_assign_unassigned_group() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("5G", "").await.expect("topic");

    let sub = service
        .submit(&chat_user(), "5G towers spread illness", Some(topic.id))
        .await
        .expect("submit");

    let returned = sub.topic.expect("topic returned");
    assert_eq!(returned.id, topic.id);
    assert_eq!(returned.status, TopicStatus::Pending);
    assert_eq!(sub.group.topic_id, None);
    assert_eq!(sub.message.topic_id, None);
}

#[tokio::test]
async fn matching_hint_inherits_group_topic() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("5G", "").await.expect("topic");
    let first = service
        .submit(&admin(), "5G towers spread illness", None)
        .await
        .expect("first");
    service
        .assign_group_topic(first.group.id, topic.id)
        .await
        .expect("assign");

    let sub = service
        .submit(&chat_user(), "5G towers spread illness", Some(topic.id))
        .await
        .expect("matching hint");

    assert_eq!(sub.group.id, first.group.id);
    assert_eq!(sub.message.topic_id, Some(topic.id));
}

#[tokio::test]
async fn mismatched_hint_conflicts_and_writes_nothing() {
    let (service, _clock) = setup().await;
    let t1 = service.create_topic("t1", "").await.expect("t1");
    let t2 = service.create_topic("t2", "").await.expect("t2");
    let first = service
        .submit(&admin(), "shared text", None)
        .await
        .expect("first");
    service
        .assign_group_topic(first.group.id, t1.id)
        .await
        .expect("assign");

    let err = service
        .submit(&admin(), "shared text", Some(t2.id))
        .await
        .expect_err("mismatch");

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains(&t2.id.to_string()));
    assert_eq!(count(&service, "message_groups").await, 1);
    assert_eq!(count(&service, "messages").await, 1);
}

#[tokio::test]
async fn message_without_hint_inherits_assigned_topic() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("t", "").await.expect("topic");
    let first = service.submit(&admin(), "x", None).await.expect("first");
    service
        .assign_group_topic(first.group.id, topic.id)
        .await
        .expect("assign");

    let sub = service.submit(&admin(), "x", None).await.expect("second");

    assert_eq!(sub.group.topic_id, Some(topic.id));
    assert_eq!(sub.message.topic_id, Some(topic.id));
}
