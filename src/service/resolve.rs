use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::{Resolution, Service};
use crate::error::{Error, Result};
use crate::repo::IsoLevel;
use crate::types::{Answer, UserInfo};

impl Service {
    /// Publish an answer and resolve the topic in one unit of work.
    ///
    /// Resolution is one-way: a topic that is already resolved is left
    /// untouched and no answer is stored.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for empty answer text or user id.
    /// - [`Error::NotFound`] if the topic does not exist.
    /// - [`Error::Conflict`] if the topic is already resolved.
    /// - Storage and transaction errors. Nothing is written on any error.
    pub async fn resolve(
        &self,
        user: &UserInfo,
        topic_id: Uuid,
        answer_text: &str,
    ) -> Result<Resolution> {
        if answer_text.is_empty() {
            return Err(Error::Validation("empty answer text".to_string()));
        }
        if user.user_id.is_empty() {
            return Err(Error::Validation("empty user id".to_string()));
        }

        self.bounded("resolve", async {
            let mut tx = self.repo.begin(IsoLevel::RepeatableRead).await?;
            let result = self
                .resolve_in(tx.conn(), user, topic_id, answer_text)
                .await;
            tx.finish(result).await
        })
        .await
    }

    async fn resolve_in(
        &self,
        conn: &mut SqliteConnection,
        user: &UserInfo,
        topic_id: Uuid,
        answer_text: &str,
    ) -> Result<Resolution> {
        let current = self.repo.topics.get_by_id(&mut *conn, topic_id).await?;
        if !current.status.is_pending() {
            return Err(Error::Conflict(format!(
                "topic {topic_id} is already {}",
                current.status.as_str()
            )));
        }

        let now = self.clock.now();
        let answer = Answer {
            id: Uuid::new_v4(),
            topic_id,
            user_id: user.user_id.clone(),
            text: answer_text.to_owned(),
            created_at: now,
        };
        let answer = self.repo.answers.create(&mut *conn, &answer).await?;
        let topic = self
            .repo
            .topics
            .resolve(&mut *conn, topic_id, answer_text, now)
            .await?;
        let messages = self
            .repo
            .messages
            .list_by_topic(&mut *conn, topic_id)
            .await?;

        info!(
            tid = %topic_id,
            aid = %answer.id,
            messages = messages.len(),
            "topic resolved"
        );
        Ok(Resolution {
            answer,
            topic,
            messages,
        })
    }
}
