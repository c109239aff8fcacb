//! Tests for `Service::resolve`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use factcheck::error::{ErrorKind, Result};
use factcheck::repo::topics::SqliteTopics;
use factcheck::repo::{ListOptions, Repository, Topics};
use factcheck::types::{Topic, TopicStatus};

use crate::support::{admin, count, service_with, setup, t0};

#[tokio::test]
async fn resolve_publishes_answer_and_lists_attached_messages() {
    let (service, clock) = setup().await;
    let topic = service.create_topic("T1", "").await.expect("topic");
    let first = service.submit(&admin(), "claim", None).await.expect("first");
    service
        .assign_group_topic(first.group.id, topic.id)
        .await
        .expect("assign");
    service.submit(&admin(), "claim", None).await.expect("second");
    service
        .submit(&admin(), "unrelated", None)
        .await
        .expect("unrelated");

    clock.advance(Duration::minutes(5));
    let res = service
        .resolve(&admin(), topic.id, "confirmed false")
        .await
        .expect("resolve");

    assert_eq!(res.answer.topic_id, topic.id);
    assert_eq!(res.answer.user_id, "admin-1");
    assert_eq!(res.answer.text, "confirmed false");
    assert_eq!(res.answer.created_at, t0() + Duration::minutes(5));
    assert_eq!(res.topic.id, topic.id);
    assert_eq!(res.topic.status, TopicStatus::Resolved);
    assert_eq!(res.topic.result.as_deref(), Some("confirmed false"));
    assert_eq!(res.topic.updated_at, Some(t0() + Duration::minutes(5)));
    assert_eq!(res.messages.len(), 2);
    assert!(res.messages.iter().all(|m| m.topic_id == Some(topic.id)));
}

#[tokio::test]
async fn resolve_topic_without_messages_returns_empty_list() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("quiet", "").await.expect("topic");

    let res = service
        .resolve(&admin(), topic.id, "nothing to see")
        .await
        .expect("resolve");

    assert!(res.messages.is_empty());
    assert_eq!(count(&service, "answers").await, 1);
}

#[tokio::test]
async fn resolving_twice_conflicts_and_keeps_one_answer() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("T1", "").await.expect("topic");
    service
        .resolve(&admin(), topic.id, "first verdict")
        .await
        .expect("first resolve");

    let err = service
        .resolve(&admin(), topic.id, "second verdict")
        .await
        .expect_err("re-resolution");

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(count(&service, "answers").await, 1);
    let answers = service.topic_answers(topic.id).await.expect("history");
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].text, "first verdict");
}

#[tokio::test]
async fn resolving_missing_topic_is_not_found() {
    let (service, _clock) = setup().await;

    let err = service
        .resolve(&admin(), Uuid::new_v4(), "x")
        .await
        .expect_err("missing");

    assert!(err.is_not_found());
    assert_eq!(count(&service, "answers").await, 0);
}

#[tokio::test]
async fn empty_answer_is_rejected() {
    let (service, _clock) = setup().await;
    let topic = service.create_topic("T1", "").await.expect("topic");

    let err = service
        .resolve(&admin(), topic.id, "")
        .await
        .expect_err("empty answer");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(count(&service, "answers").await, 0);
}

/// Delegates to SQLite but fails every status transition.
struct BrokenResolve;

#[async_trait]
impl Topics for BrokenResolve {
    async fn create(&self, conn: &mut SqliteConnection, topic: &Topic) -> Result<Topic> {
        SqliteTopics.create(conn, topic).await
    }

    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Topic> {
        SqliteTopics.get_by_id(conn, id).await
    }

    async fn list(
        &self,
        conn: &mut SqliteConnection,
        options: &ListOptions<TopicStatus>,
    ) -> Result<Vec<Topic>> {
        SqliteTopics.list(conn, options).await
    }

    async fn count_by_status(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<HashMap<TopicStatus, i64>> {
        SqliteTopics.count_by_status(conn).await
    }

    async fn resolve(
        &self,
        _conn: &mut SqliteConnection,
        _id: Uuid,
        _result: &str,
        _at: DateTime<Utc>,
    ) -> Result<Topic> {
        Err(sqlx::Error::Protocol("injected failure".into()).into())
    }
}

#[tokio::test]
async fn failed_transition_leaves_no_orphan_answer() {
    let pool = factcheck::db::open_in_memory().await.expect("open db");
    let mut repo = Repository::new(pool);
    repo.topics = Arc::new(BrokenResolve);
    let service = service_with(repo);
    let topic = service.create_topic("T1", "").await.expect("topic");

    let err = service
        .resolve(&admin(), topic.id, "verdict")
        .await
        .expect_err("injected failure");

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(count(&service, "answers").await, 0);
    let repo = service.repository();
    let mut conn = repo.acquire().await.expect("acquire");
    let stored = repo
        .topics
        .get_by_id(&mut conn, topic.id)
        .await
        .expect("topic");
    assert_eq!(stored.status, TopicStatus::Pending);
}
