//! Error taxonomy shared by the persistence ports and the coordinators.
//!
//! Every failure a coordinator can return falls into one of the five
//! [`ErrorKind`]s. Transport layers map on the kind; the variants carry the
//! detail needed for diagnostics.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Transaction lifecycle step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOp {
    /// Opening the transaction.
    Begin,
    /// Committing the transaction.
    Commit,
    /// Rolling the transaction back.
    Rollback,
}

impl TxOp {
    /// Returns a short lowercase name for logs and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

/// Lookup filter attached to [`Error::NotFound`] for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter(Vec<(&'static str, String)>);

impl Filter {
    /// Filter on a single field.
    pub fn by(field: &'static str, value: impl fmt::Display) -> Self {
        Self(vec![(field, value.to_string())])
    }

    /// Add another field to the filter.
    #[must_use]
    pub fn and(mut self, field: &'static str, value: impl fmt::Display) -> Self {
        self.0.push((field, value.to_string()));
        self
    }

    /// Value recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        Ok(())
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-correctable input or state problem.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request disagrees with existing state.
    Conflict,
    /// Underlying persistence failure.
    Storage,
    /// Transaction begin/commit/rollback failure or timeout.
    Transaction,
}

/// Errors returned by persistence ports and coordinators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input or entity state rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found for filter {filter}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Lookup filter used.
        filter: Filter,
    },

    /// The request disagrees with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Beginning, committing or rolling back a transaction failed.
    #[error("transaction {} failed: {source}", .op.as_str())]
    Transaction {
        /// Which step failed.
        op: TxOp,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The unit of work exceeded its deadline and was rolled back.
    #[error("transaction timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// A stored column held a value that cannot be decoded.
    #[error("invalid {field} value in storage: {value:?}")]
    InvalidColumn {
        /// Column that contained the bad value.
        field: &'static str,
        /// The unexpected value.
        value: String,
    },

    /// Message metadata could not be encoded or decoded.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, filter: Filter) -> Self {
        Self::NotFound { entity, filter }
    }

    /// Classify into one of the five error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) | Self::InvalidColumn { .. } | Self::Metadata(_) => {
                ErrorKind::Storage
            }
            Self::Transaction { .. } | Self::TimedOut(_) => ErrorKind::Transaction,
        }
    }

    /// Returns `true` for a storage uniqueness-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Storage(err) => err
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation()),
            _ => false,
        }
    }

    /// Returns `true` if this is a [`ErrorKind::NotFound`] error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
