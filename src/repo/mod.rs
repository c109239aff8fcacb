//! Persistence ports and their SQLite adapters.
//!
//! Each port takes the connection to run on as an explicit
//! `&mut SqliteConnection`: pass [`Tx::conn`] to take part in a transaction,
//! or a pooled connection from [`Repository::acquire`] for a standalone read.
//! Ports never open or commit transactions themselves.

pub mod answers;
pub mod message_groups;
pub mod messages;
pub mod options;
pub mod topics;
pub mod tx;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::types::{Answer, GroupStatus, Message, MessageGroup, Topic, TopicStatus};

pub use self::options::ListOptions;
pub use self::tx::{IsoLevel, Tx};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Topic persistence.
#[async_trait]
pub trait Topics: Send + Sync {
    /// Insert a new topic.
    async fn create(&self, conn: &mut SqliteConnection, topic: &Topic) -> Result<Topic>;

    /// Load a topic; [`Error::NotFound`] if absent.
    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Topic>;

    /// List topics matching `options`, oldest first.
    async fn list(
        &self,
        conn: &mut SqliteConnection,
        options: &ListOptions<TopicStatus>,
    ) -> Result<Vec<Topic>>;

    /// Number of topics per status.
    async fn count_by_status(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<HashMap<TopicStatus, i64>>;

    /// Transition a pending topic to resolved, recording `result`.
    ///
    /// [`Error::NotFound`] if the topic does not exist and
    /// [`Error::Conflict`] if it is not pending.
    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        result: &str,
        at: DateTime<Utc>,
    ) -> Result<Topic>;
}

/// Message group persistence.
#[async_trait]
pub trait MessageGroups: Send + Sync {
    /// Insert a new group. A duplicate fingerprint surfaces as a storage
    /// error for which [`Error::is_unique_violation`] holds.
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        group: &MessageGroup,
    ) -> Result<MessageGroup>;

    /// Load a group; [`Error::NotFound`] if absent.
    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<MessageGroup>;

    /// Load the group owning `fingerprint`; [`Error::NotFound`] if absent.
    async fn get_by_fingerprint(
        &self,
        conn: &mut SqliteConnection,
        fingerprint: &Fingerprint,
    ) -> Result<MessageGroup>;

    /// Groups assigned to a topic, oldest first.
    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<MessageGroup>>;

    /// List groups matching `options`, oldest first.
    async fn list(
        &self,
        conn: &mut SqliteConnection,
        options: &ListOptions<GroupStatus>,
    ) -> Result<Vec<MessageGroup>>;

    /// Set the group's topic.
    async fn assign_topic(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        topic_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup>;

    /// Clear the group's topic.
    async fn unassign_topic(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup>;

    /// Change the triage status.
    async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        status: GroupStatus,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup>;
}

/// Message persistence.
#[async_trait]
pub trait Messages: Send + Sync {
    /// Insert a new message.
    async fn create(&self, conn: &mut SqliteConnection, message: &Message) -> Result<Message>;

    /// Load a message; [`Error::NotFound`] if absent.
    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Message>;

    /// Messages attached to a topic, in submission order.
    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<Message>>;

    /// Messages in a group, in submission order.
    async fn list_by_group(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
    ) -> Result<Vec<Message>>;

    /// Point every message of a group at `topic_id`. Returns the number of
    /// messages changed.
    async fn set_topic_for_group(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
        topic_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Move one message into `group_id`, taking `topic_id` as its topic.
    /// [`Error::NotFound`] if the message is absent.
    async fn assign_group(
        &self,
        conn: &mut SqliteConnection,
        message_id: Uuid,
        group_id: Uuid,
        topic_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<Message>;
}

/// Answer persistence.
#[async_trait]
pub trait Answers: Send + Sync {
    /// Insert a new answer.
    async fn create(&self, conn: &mut SqliteConnection, answer: &Answer) -> Result<Answer>;

    /// Load an answer; [`Error::NotFound`] if absent.
    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Answer>;

    /// Most recent answer for a topic; [`Error::NotFound`] if none.
    async fn latest_by_topic(&self, conn: &mut SqliteConnection, topic_id: Uuid)
        -> Result<Answer>;

    /// Answer history for a topic, newest first.
    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<Answer>>;
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// All ports plus the pool they run against.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    /// Topic port.
    pub topics: Arc<dyn Topics>,
    /// Message group port.
    pub message_groups: Arc<dyn MessageGroups>,
    /// Message port.
    pub messages: Arc<dyn Messages>,
    /// Answer port.
    pub answers: Arc<dyn Answers>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// SQLite-backed repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            topics: Arc::new(topics::SqliteTopics),
            message_groups: Arc::new(message_groups::SqliteMessageGroups),
            messages: Arc::new(messages::SqliteMessages),
            answers: Arc::new(answers::SqliteAnswers),
        }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction at `level`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transaction`] if the transaction cannot be started.
    pub async fn begin(&self, level: IsoLevel) -> Result<Tx> {
        Tx::begin(&self.pool, level).await
    }

    /// Check out a connection for reads outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if no connection can be acquired.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

// ---------------------------------------------------------------------------
// Column codecs shared by the adapters
// ---------------------------------------------------------------------------

pub(crate) fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode_opt_time(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(encode_time)
}

pub(crate) fn decode_time(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidColumn {
            field,
            value: value.to_owned(),
        })
}

pub(crate) fn decode_opt_time(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| decode_time(field, &v)).transpose()
}

pub(crate) fn decode_id(field: &'static str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| Error::InvalidColumn {
        field,
        value: value.to_owned(),
    })
}

pub(crate) fn decode_opt_id(field: &'static str, value: Option<String>) -> Result<Option<Uuid>> {
    value.map(|v| decode_id(field, &v)).transpose()
}
