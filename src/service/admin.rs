//! Admin workflow: topic creation, group triage and message moves.

use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::Service;
use crate::error::{Error, Result};
use crate::repo::IsoLevel;
use crate::types::{Answer, GroupStatus, Message, MessageGroup, Topic};

impl Service {
    /// Create a pending topic.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty name; storage and transaction
    /// errors otherwise.
    pub async fn create_topic(&self, name: &str, description: &str) -> Result<Topic> {
        if name.trim().is_empty() {
            return Err(Error::Validation("empty topic name".to_string()));
        }
        self.bounded("create_topic", async {
            let mut tx = self.repo.begin(IsoLevel::ReadCommitted).await?;
            let topic = Topic::new(
                Uuid::new_v4(),
                name.to_owned(),
                description.to_owned(),
                self.clock.now(),
            );
            let result = self.repo.topics.create(tx.conn(), &topic).await;
            tx.finish(result).await
        })
        .await
    }

    /// Assign a group, and every message in it, to a topic.
    ///
    /// Re-assigning to the same topic is a no-op. A group that already
    /// belongs to another topic must be unassigned first. Resolved topics
    /// take no new groups, matching the rule for submissions.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing topic or group, [`Error::Conflict`]
    /// if the group has a different topic, [`Error::Validation`] if the
    /// topic is resolved.
    pub async fn assign_group_topic(&self, group_id: Uuid, topic_id: Uuid) -> Result<MessageGroup> {
        self.bounded("assign_group_topic", async {
            let mut tx = self.repo.begin(IsoLevel::Serializable).await?;
            let result = self.assign_in(tx.conn(), group_id, topic_id).await;
            tx.finish(result).await
        })
        .await
    }

    async fn assign_in(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
        topic_id: Uuid,
    ) -> Result<MessageGroup> {
        let topic = self.repo.topics.get_by_id(&mut *conn, topic_id).await?;
        let group = self.repo.message_groups.get_by_id(&mut *conn, group_id).await?;
        match group.topic_id {
            Some(current) if current == topic_id => return Ok(group),
            Some(current) => {
                return Err(Error::Conflict(format!(
                    "group {group_id} already belongs to topic {current}"
                )));
            }
            None => {}
        }
        if !topic.status.accepts_submissions() {
            return Err(Error::Validation(format!(
                "topic {topic_id} is {} and takes no new groups",
                topic.status.as_str()
            )));
        }

        let now = self.clock.now();
        let group = self
            .repo
            .message_groups
            .assign_topic(&mut *conn, group_id, topic_id, now)
            .await?;
        let moved = self
            .repo
            .messages
            .set_topic_for_group(&mut *conn, group_id, Some(topic_id), now)
            .await?;
        info!(gid = %group_id, tid = %topic_id, messages = moved, "group assigned to topic");
        Ok(group)
    }

    /// Detach a group, and every message in it, from its topic.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing group.
    pub async fn unassign_group_topic(&self, group_id: Uuid) -> Result<MessageGroup> {
        self.bounded("unassign_group_topic", async {
            let mut tx = self.repo.begin(IsoLevel::Serializable).await?;
            let result = self.unassign_in(tx.conn(), group_id).await;
            tx.finish(result).await
        })
        .await
    }

    async fn unassign_in(&self, conn: &mut SqliteConnection, group_id: Uuid) -> Result<MessageGroup> {
        let now = self.clock.now();
        let group = self
            .repo
            .message_groups
            .unassign_topic(&mut *conn, group_id, now)
            .await?;
        let moved = self
            .repo
            .messages
            .set_topic_for_group(&mut *conn, group_id, None, now)
            .await?;
        info!(gid = %group_id, messages = moved, "group unassigned from topic");
        Ok(group)
    }

    /// Move a single message into another group.
    ///
    /// The message takes the target group's topic, so its topic always
    /// agrees with its group. Moving into the current group is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing message or group.
    pub async fn move_message_to_group(&self, message_id: Uuid, group_id: Uuid) -> Result<Message> {
        self.bounded("move_message_to_group", async {
            let mut tx = self.repo.begin(IsoLevel::Serializable).await?;
            let result = self.move_message_in(tx.conn(), message_id, group_id).await;
            tx.finish(result).await
        })
        .await
    }

    async fn move_message_in(
        &self,
        conn: &mut SqliteConnection,
        message_id: Uuid,
        group_id: Uuid,
    ) -> Result<Message> {
        let message = self.repo.messages.get_by_id(&mut *conn, message_id).await?;
        let group = self.repo.message_groups.get_by_id(&mut *conn, group_id).await?;
        if message.group_id == group.id {
            return Ok(message);
        }

        let moved = self
            .repo
            .messages
            .assign_group(&mut *conn, message_id, group.id, group.topic_id, self.clock.now())
            .await?;
        info!(
            mid = %message_id,
            from = %message.group_id,
            gid = %group.id,
            "message moved to group"
        );
        Ok(moved)
    }

    /// Set a group's triage status.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing group.
    pub async fn review_group(&self, group_id: Uuid, status: GroupStatus) -> Result<MessageGroup> {
        self.bounded("review_group", async {
            let mut tx = self.repo.begin(IsoLevel::Serializable).await?;
            let now = self.clock.now();
            let result = self
                .repo
                .message_groups
                .update_status(tx.conn(), group_id, status, now)
                .await;
            tx.finish(result).await
        })
        .await
    }

    /// Answer history for a topic, newest first.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing topic.
    pub async fn topic_answers(&self, topic_id: Uuid) -> Result<Vec<Answer>> {
        self.bounded("topic_answers", async {
            let mut tx = self.repo.begin(IsoLevel::ReadCommitted).await?;
            let result = async {
                self.repo.topics.get_by_id(tx.conn(), topic_id).await?;
                self.repo.answers.list_by_topic(tx.conn(), topic_id).await
            }
            .await;
            tx.finish(result).await
        })
        .await
    }
}
