//! SQLite adapter for [`Messages`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{
    decode_id, decode_opt_id, decode_opt_time, decode_time, encode_opt_time, encode_time,
    Messages,
};
use crate::error::{Error, Filter, Result};
use crate::types::{Message, MessageType, UserType};

/// Row tuple for `messages`.
type MessageRow = (
    String,         // id
    String,         // user_id
    String,         // user_type
    Option<String>, // topic_id
    String,         // group_id
    String,         // message_type
    String,         // text
    String,         // metadata
    String,         // created_at
    Option<String>, // updated_at
);

const SELECT_MESSAGE: &str = "SELECT id, user_id, user_type, topic_id, group_id, message_type, \
                              text, metadata, created_at, updated_at FROM messages";

fn message_row_into_record(row: MessageRow) -> Result<Message> {
    let (
        id,
        user_id,
        user_type,
        topic_id,
        group_id,
        message_type,
        text,
        metadata,
        created_at,
        updated_at,
    ) = row;
    Ok(Message {
        id: decode_id("messages.id", &id)?,
        user_id,
        user_type: UserType::parse(&user_type)?,
        topic_id: decode_opt_id("messages.topic_id", topic_id)?,
        group_id: decode_id("messages.group_id", &group_id)?,
        message_type: MessageType::parse(&message_type)?,
        text,
        metadata: serde_json::from_str(&metadata)?,
        created_at: decode_time("messages.created_at", &created_at)?,
        updated_at: decode_opt_time("messages.updated_at", updated_at)?,
    })
}

/// [`Messages`] backed by the `messages` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMessages;

impl SqliteMessages {
    async fn fetch_where(
        &self,
        conn: &mut SqliteConnection,
        column: &'static str,
        value: String,
    ) -> Result<Vec<Message>> {
        let sql = format!("{SELECT_MESSAGE} WHERE {column} = ?1 ORDER BY created_at ASC, rowid ASC");
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(value)
            .fetch_all(&mut *conn)
            .await?;
        rows.into_iter().map(message_row_into_record).collect()
    }
}

#[async_trait]
impl Messages for SqliteMessages {
    async fn create(&self, conn: &mut SqliteConnection, message: &Message) -> Result<Message> {
        let metadata = serde_json::to_string(&message.metadata)?;
        sqlx::query(
            "INSERT INTO messages \
             (id, user_id, user_type, topic_id, group_id, message_type, text, metadata, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(message.id.to_string())
        .bind(&message.user_id)
        .bind(message.user_type.as_str())
        .bind(message.topic_id.map(|id| id.to_string()))
        .bind(message.group_id.to_string())
        .bind(message.message_type.as_str())
        .bind(&message.text)
        .bind(metadata)
        .bind(encode_time(message.created_at))
        .bind(encode_opt_time(message.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(message.clone())
    }

    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Message> {
        let sql = format!("{SELECT_MESSAGE} WHERE id = ?1");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => message_row_into_record(row),
            None => Err(Error::not_found("message", Filter::by("id", id))),
        }
    }

    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<Message>> {
        self.fetch_where(conn, "topic_id", topic_id.to_string())
            .await
    }

    async fn list_by_group(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
    ) -> Result<Vec<Message>> {
        self.fetch_where(conn, "group_id", group_id.to_string())
            .await
    }

    async fn set_topic_for_group(
        &self,
        conn: &mut SqliteConnection,
        group_id: Uuid,
        topic_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let updated =
            sqlx::query("UPDATE messages SET topic_id = ?2, updated_at = ?3 WHERE group_id = ?1")
                .bind(group_id.to_string())
                .bind(topic_id.map(|id| id.to_string()))
                .bind(encode_time(at))
                .execute(&mut *conn)
                .await?;
        Ok(updated.rows_affected())
    }

    async fn assign_group(
        &self,
        conn: &mut SqliteConnection,
        message_id: Uuid,
        group_id: Uuid,
        topic_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        let updated = sqlx::query(
            "UPDATE messages SET group_id = ?2, topic_id = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(message_id.to_string())
        .bind(group_id.to_string())
        .bind(topic_id.map(|id| id.to_string()))
        .bind(encode_time(at))
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("message", Filter::by("id", message_id)));
        }
        self.get_by_id(conn, message_id).await
    }
}
