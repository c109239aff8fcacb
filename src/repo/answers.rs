//! SQLite adapter for [`Answers`].

use async_trait::async_trait;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{decode_id, decode_time, encode_time, Answers};
use crate::error::{Error, Filter, Result};
use crate::types::Answer;

/// Row tuple for `answers`: id, topic_id, user_id, text, created_at.
type AnswerRow = (String, String, String, String, String);

fn answer_row_into_record(row: AnswerRow) -> Result<Answer> {
    let (id, topic_id, user_id, text, created_at) = row;
    Ok(Answer {
        id: decode_id("answers.id", &id)?,
        topic_id: decode_id("answers.topic_id", &topic_id)?,
        user_id,
        text,
        created_at: decode_time("answers.created_at", &created_at)?,
    })
}

/// [`Answers`] backed by the `answers` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAnswers;

#[async_trait]
impl Answers for SqliteAnswers {
    async fn create(&self, conn: &mut SqliteConnection, answer: &Answer) -> Result<Answer> {
        sqlx::query(
            "INSERT INTO answers (id, topic_id, user_id, text, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(answer.id.to_string())
        .bind(answer.topic_id.to_string())
        .bind(&answer.user_id)
        .bind(&answer.text)
        .bind(encode_time(answer.created_at))
        .execute(&mut *conn)
        .await?;
        Ok(answer.clone())
    }

    async fn get_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Answer> {
        let row: Option<AnswerRow> = sqlx::query_as(
            "SELECT id, topic_id, user_id, text, created_at FROM answers WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => answer_row_into_record(row),
            None => Err(Error::not_found("answer", Filter::by("id", id))),
        }
    }

    async fn latest_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Answer> {
        let row: Option<AnswerRow> = sqlx::query_as(
            "SELECT id, topic_id, user_id, text, created_at FROM answers \
             WHERE topic_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(topic_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => answer_row_into_record(row),
            None => Err(Error::not_found("answer", Filter::by("topic_id", topic_id))),
        }
    }

    async fn list_by_topic(
        &self,
        conn: &mut SqliteConnection,
        topic_id: Uuid,
    ) -> Result<Vec<Answer>> {
        let rows: Vec<AnswerRow> = sqlx::query_as(
            "SELECT id, topic_id, user_id, text, created_at FROM answers \
             WHERE topic_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(topic_id.to_string())
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter().map(answer_row_into_record).collect()
    }
}
