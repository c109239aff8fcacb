//! SQLite adapter for [`MessageGroups`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::options::ListOptions;
use super::{
    decode_id, decode_opt_id, decode_opt_time, decode_time, encode_opt_time, encode_time,
    MessageGroups,
};
use crate::error::{Error, Filter, Result};
use crate::fingerprint::Fingerprint;
use crate::types::{GroupStatus, MessageGroup};

/// Row tuple for `message_groups`.
type GroupRow = (
    String,         // id
    String,         // status
    Option<String>, // topic_id
    String,         // name
    String,         // text
    String,         // text_fingerprint
    Option<String>, // language
    String,         // created_at
    Option<String>, // updated_at
);

const SELECT_GROUP: &str = "SELECT id, status, topic_id, name, text, text_fingerprint, \
                            language, created_at, updated_at FROM message_groups";

fn group_row_into_record(row: GroupRow) -> Result<MessageGroup> {
    let (id, status, topic_id, name, text, fingerprint, language, created_at, updated_at) = row;
    Ok(MessageGroup {
        id: decode_id("message_groups.id", &id)?,
        status: GroupStatus::parse(&status)?,
        topic_id: decode_opt_id("message_groups.topic_id", topic_id)?,
        name,
        text,
        fingerprint: Fingerprint::from_stored(fingerprint),
        language,
        created_at: decode_time("message_groups.created_at", &created_at)?,
        updated_at: decode_opt_time("message_groups.updated_at", updated_at)?,
    })
}

/// [`MessageGroups`] backed by the `message_groups` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMessageGroups;

impl SqliteMessageGroups {
    async fn fetch_one(
        &self,
        conn: &mut SqliteConnection,
        column: &'static str,
        value: String,
    ) -> Result<MessageGroup> {
        let sql = format!("{SELECT_GROUP} WHERE {column} = ?1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(&value)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => group_row_into_record(row),
            None => Err(Error::not_found("message group", Filter::by(column, value))),
        }
    }
}

#[async_trait]
impl MessageGroups for SqliteMessageGroups {
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        group: &MessageGroup,
    ) -> Result<MessageGroup> {
        sqlx::query(
            "INSERT INTO message_groups \
             (id, status, topic_id, name, text, text_fingerprint, language, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(group.id.to_string())
        .bind(group.status.as_str())
        .bind(group.topic_id.map(|id| id.to_string()))
        .bind(&group.name)
        .bind(&group.text)
        .bind(group.fingerprint.as_str())
        .bind(&group.language)
        .bind(encode_time(group.created_at))
        .bind(encode_opt_time(group.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(group.clone())
    }

    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<MessageGroup> {
        self.fetch_one(conn, "id", id.to_string()).await
    }

    async fn get_by_fingerprint(
        &self,
        conn: &mut SqliteConnection,
        fingerprint: &Fingerprint,
    ) -> Result<MessageGroup> {
        self.fetch_one(conn, "text_fingerprint", fingerprint.to_string())
            .await
    }

    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<MessageGroup>> {
        let sql = format!("{SELECT_GROUP} WHERE topic_id = ?1 ORDER BY created_at ASC, rowid ASC");
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(topic_id.to_string())
            .fetch_all(&mut *conn)
            .await?;
        rows.into_iter().map(group_row_into_record).collect()
    }

    async fn list(
        &self,
        conn: &mut SqliteConnection,
        options: &ListOptions<GroupStatus>,
    ) -> Result<Vec<MessageGroup>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_GROUP);
        qb.push(" WHERE 1 = 1");
        options.push_filters(&mut qb, &["name", "text"]);
        options.push_order_and_page(&mut qb);
        let rows = qb
            .build_query_as::<GroupRow>()
            .fetch_all(&mut *conn)
            .await?;
        rows.into_iter().map(group_row_into_record).collect()
    }

    async fn assign_topic(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        topic_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup> {
        let updated =
            sqlx::query("UPDATE message_groups SET topic_id = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id.to_string())
                .bind(topic_id.to_string())
                .bind(encode_time(at))
                .execute(&mut *conn)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("message group", Filter::by("id", id)));
        }
        self.get_by_id(conn, id).await
    }

    async fn unassign_topic(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup> {
        let updated = sqlx::query(
            "UPDATE message_groups SET topic_id = NULL, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id.to_string())
        .bind(encode_time(at))
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("message group", Filter::by("id", id)));
        }
        self.get_by_id(conn, id).await
    }

    async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        status: GroupStatus,
        at: DateTime<Utc>,
    ) -> Result<MessageGroup> {
        let updated =
            sqlx::query("UPDATE message_groups SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id.to_string())
                .bind(status.as_str())
                .bind(encode_time(at))
                .execute(&mut *conn)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("message group", Filter::by("id", id)));
        }
        self.get_by_id(conn, id).await
    }
}
