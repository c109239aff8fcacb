//! SQLite adapter for [`Topics`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::options::ListOptions;
use super::{decode_id, decode_opt_time, decode_time, encode_opt_time, encode_time, Topics};
use crate::error::{Error, Filter, Result};
use crate::types::{Topic, TopicStatus};

/// Row tuple for `topics`.
type TopicRow = (
    String,         // id
    String,         // name
    String,         // description
    String,         // status
    Option<String>, // result
    String,         // created_at
    Option<String>, // updated_at
);

const SELECT_TOPIC: &str =
    "SELECT id, name, description, status, result, created_at, updated_at FROM topics";

fn topic_row_into_record(row: TopicRow) -> Result<Topic> {
    let (id, name, description, status, result, created_at, updated_at) = row;
    Ok(Topic {
        id: decode_id("topics.id", &id)?,
        name,
        description,
        status: TopicStatus::parse(&status)?,
        result,
        created_at: decode_time("topics.created_at", &created_at)?,
        updated_at: decode_opt_time("topics.updated_at", updated_at)?,
    })
}

/// [`Topics`] backed by the `topics` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTopics;

#[async_trait]
impl Topics for SqliteTopics {
    async fn create(&self, conn: &mut SqliteConnection, topic: &Topic) -> Result<Topic> {
        sqlx::query(
            "INSERT INTO topics \
             (id, name, description, status, result, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(topic.id.to_string())
        .bind(&topic.name)
        .bind(&topic.description)
        .bind(topic.status.as_str())
        .bind(&topic.result)
        .bind(encode_time(topic.created_at))
        .bind(encode_opt_time(topic.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(topic.clone())
    }

    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Topic> {
        let sql = format!("{SELECT_TOPIC} WHERE id = ?1");
        let row = sqlx::query_as::<_, TopicRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => topic_row_into_record(row),
            None => Err(Error::not_found("topic", Filter::by("id", id))),
        }
    }

    async fn list(
        &self,
        conn: &mut SqliteConnection,
        options: &ListOptions<TopicStatus>,
    ) -> Result<Vec<Topic>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_TOPIC);
        qb.push(" WHERE 1 = 1");
        options.push_filters(&mut qb, &["name", "description"]);
        options.push_order_and_page(&mut qb);
        let rows = qb
            .build_query_as::<TopicRow>()
            .fetch_all(&mut *conn)
            .await?;
        rows.into_iter().map(topic_row_into_record).collect()
    }

    async fn count_by_status(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<HashMap<TopicStatus, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM topics GROUP BY status")
                .fetch_all(&mut *conn)
                .await?;
        let mut counts = HashMap::new();
        for (status, count) in rows {
            counts.insert(TopicStatus::parse(&status)?, count);
        }
        Ok(counts)
    }

    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        result: &str,
        at: DateTime<Utc>,
    ) -> Result<Topic> {
        let updated = sqlx::query(
            "UPDATE topics SET status = ?2, result = ?3, updated_at = ?4 \
             WHERE id = ?1 AND status = ?5",
        )
        .bind(id.to_string())
        .bind(TopicStatus::Resolved.as_str())
        .bind(result)
        .bind(encode_time(at))
        .bind(TopicStatus::Pending.as_str())
        .execute(&mut *conn)
        .await?;

        let topic = self.get_by_id(&mut *conn, id).await?;
        if updated.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "topic {id} is {}, not pending",
                topic.status.as_str()
            )));
        }
        Ok(topic)
    }
}
