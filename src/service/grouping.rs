//! Message group resolution: one group per text fingerprint.
//!
//! Lookup and create run on the caller's transaction. Submit opens it with
//! `BEGIN IMMEDIATE`, so two submitters of the same new text are serialized
//! by the write lock and the second sees the first one's group. The UNIQUE
//! index on the fingerprint is a backstop: a writer that still reaches the
//! insert after another committed gets a unique violation and refetches the
//! existing group on the same transaction. A deferred transaction whose
//! snapshot predates that commit fails with a busy-snapshot storage error
//! instead and never reaches the refetch.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::repo::Repository;
use crate::types::{GroupStatus, MessageGroup};

/// Find the group for `fingerprint`, creating a pending, unassigned one if
/// none exists. Returns the group and whether it was created.
///
/// # Errors
///
/// Storage errors propagate unchanged.
pub async fn get_or_create(
    repo: &Repository,
    conn: &mut SqliteConnection,
    fingerprint: &Fingerprint,
    text: &str,
    now: DateTime<Utc>,
) -> Result<(MessageGroup, bool)> {
    match repo
        .message_groups
        .get_by_fingerprint(&mut *conn, fingerprint)
        .await
    {
        Ok(group) => return Ok((group, false)),
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }

    let group = MessageGroup {
        id: Uuid::new_v4(),
        status: GroupStatus::Pending,
        topic_id: None,
        name: String::new(),
        text: text.to_owned(),
        fingerprint: fingerprint.clone(),
        language: None,
        created_at: now,
        updated_at: None,
    };
    create_or_refetch(repo, conn, group).await
}

/// Insert `group`; if another writer already holds its fingerprint, return
/// that writer's group instead.
///
/// # Errors
///
/// Storage errors other than the fingerprint uniqueness violation
/// propagate unchanged.
pub async fn create_or_refetch(
    repo: &Repository,
    conn: &mut SqliteConnection,
    group: MessageGroup,
) -> Result<(MessageGroup, bool)> {
    match repo.message_groups.create(&mut *conn, &group).await {
        Ok(created) => {
            info!(
                gid = %created.id,
                fingerprint = %created.fingerprint,
                "created message group without topic"
            );
            Ok((created, true))
        }
        Err(err) if err.is_unique_violation() => {
            warn!(
                gid = %group.id,
                fingerprint = %group.fingerprint,
                "message group already created concurrently, refetching"
            );
            let existing = repo
                .message_groups
                .get_by_fingerprint(&mut *conn, &group.fingerprint)
                .await?;
            Ok((existing, false))
        }
        Err(err) => Err(err),
    }
}
