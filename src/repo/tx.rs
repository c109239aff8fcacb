//! Transaction boundary.
//!
//! SQLite runs every transaction serializably, so the isolation level only
//! decides when the write lock is taken. `ReadCommitted` opens a deferred
//! transaction. `RepeatableRead` and `Serializable` open `BEGIN IMMEDIATE`:
//! a read-then-write unit of work holds the write lock from its first
//! statement and can never fail later on a stale snapshot. Concurrent
//! writers queue on the busy timeout instead.
//!
//! A [`Tx`] that is dropped without [`Tx::commit`] or [`Tx::finish`] is
//! rolled back by the driver, which covers cancellation of the enclosing
//! future.

use std::ops::{Deref, DerefMut};

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, trace};

use crate::error::{Error, Result, TxOp};

/// Requested isolation for a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsoLevel {
    /// Plain reads.
    ReadCommitted,
    /// Snapshot for the whole unit of work; used by submit and resolve.
    RepeatableRead,
    /// Full conflict protection; used for admin updates to shared rows.
    Serializable,
}

impl IsoLevel {
    /// Human-readable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "read committed",
            Self::RepeatableRead => "repeatable read",
            Self::Serializable => "serializable",
        }
    }

    fn begin_statement(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "BEGIN DEFERRED",
            Self::RepeatableRead | Self::Serializable => "BEGIN IMMEDIATE",
        }
    }
}

/// An open database transaction.
pub struct Tx {
    inner: Transaction<'static, Sqlite>,
    level: IsoLevel,
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx").field("level", &self.level).finish()
    }
}

impl Tx {
    /// Begin a transaction on a connection from `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transaction`] with [`TxOp::Begin`] on failure.
    pub async fn begin(pool: &SqlitePool, level: IsoLevel) -> Result<Self> {
        let inner = pool
            .begin_with(level.begin_statement())
            .await
            .map_err(|source| Error::Transaction {
                op: TxOp::Begin,
                source,
            })?;
        trace!(level = level.as_str(), "transaction started");
        Ok(Self { inner, level })
    }

    /// Isolation level this transaction was opened with.
    pub fn level(&self) -> IsoLevel {
        self.level
    }

    /// Connection to hand to port calls.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.inner
    }

    /// Commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transaction`] with [`TxOp::Commit`] on failure; the
    /// transaction is rolled back by the driver in that case.
    pub async fn commit(self) -> Result<()> {
        self.inner.commit().await.map_err(|source| Error::Transaction {
            op: TxOp::Commit,
            source,
        })?;
        debug!(level = self.level.as_str(), "transaction committed");
        Ok(())
    }

    /// Roll back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transaction`] with [`TxOp::Rollback`] on failure.
    pub async fn rollback(self) -> Result<()> {
        self.inner
            .rollback()
            .await
            .map_err(|source| Error::Transaction {
                op: TxOp::Rollback,
                source,
            })
    }

    /// Commit if `result` is `Ok`, otherwise roll back and return the
    /// original error. A failed rollback is logged and never replaces it.
    ///
    /// # Errors
    ///
    /// Returns the error in `result`, or the commit failure.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let level = self.level;
                if let Err(rollback_err) = self.rollback().await {
                    error!(
                        level = level.as_str(),
                        error = %rollback_err,
                        cause = %err,
                        "rollback failed"
                    );
                }
                Err(err)
            }
        }
    }
}

impl Deref for Tx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.inner
    }
}

impl DerefMut for Tx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.inner
    }
}
