use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use super::{grouping, Service, Submission};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::repo::IsoLevel;
use crate::types::{Message, MessageType, Metadata, UserInfo};

impl Service {
    /// File a submission under the group for its text.
    ///
    /// Always stores one new message. The group is found or created by
    /// fingerprint; the message takes the group's topic, never the hint.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for empty text or user id, or a hinted topic
    ///   that no longer accepts submissions.
    /// - [`Error::NotFound`] if the hinted topic does not exist.
    /// - [`Error::Conflict`] if the group already belongs to another topic.
    /// - Storage and transaction errors. Nothing is written on any error.
    pub async fn submit(
        &self,
        user: &UserInfo,
        text: &str,
        topic_id: Option<Uuid>,
    ) -> Result<Submission> {
        if text.is_empty() {
            return Err(Error::Validation("empty text".to_string()));
        }
        if user.user_id.is_empty() {
            return Err(Error::Validation("empty user id".to_string()));
        }

        self.bounded("submit", async {
            let mut tx = self.repo.begin(IsoLevel::RepeatableRead).await?;
            let result = self.submit_in(tx.conn(), user, text, topic_id).await;
            tx.finish(result).await
        })
        .await
    }

    async fn submit_in(
        &self,
        conn: &mut SqliteConnection,
        user: &UserInfo,
        text: &str,
        topic_id: Option<Uuid>,
    ) -> Result<Submission> {
        let topic = match topic_id {
            Some(id) => {
                let topic = self.repo.topics.get_by_id(&mut *conn, id).await?;
                if !topic.status.accepts_submissions() {
                    return Err(Error::Validation(format!(
                        "topic {id} is {} and no longer accepts submissions",
                        topic.status.as_str()
                    )));
                }
                Some(topic)
            }
            None => None,
        };

        let fingerprint = Fingerprint::of(text);
        let now = self.clock.now();
        let (group, group_created) =
            grouping::get_or_create(&self.repo, &mut *conn, &fingerprint, text, now).await?;

        if let (Some(hint), Some(current)) = (topic_id, group.topic_id) {
            if hint != current {
                return Err(Error::Conflict(format!(
                    "mismatch topic {hint}: group {} ({fingerprint}) has topic {current}",
                    group.id
                )));
            }
        }

        let metadata = serde_json::to_value(Metadata::user_info(user.clone()))?;
        let message = Message {
            id: Uuid::new_v4(),
            user_id: user.user_id.clone(),
            user_type: user.user_type,
            topic_id: group.topic_id,
            group_id: group.id,
            message_type: MessageType::Text,
            text: text.to_owned(),
            metadata,
            created_at: now,
            updated_at: None,
        };
        let message = self.repo.messages.create(&mut *conn, &message).await?;
        debug!(mid = %message.id, gid = %group.id, group_created, "submission stored");

        Ok(Submission {
            message,
            group,
            topic,
            group_created,
        })
    }
}
