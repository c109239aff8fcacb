//! Filters for list queries.

use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::types::{GroupStatus, TopicStatus};

/// A status enum that can be used as a list filter.
pub trait StatusColumn: Copy + Send + Sync {
    /// Stored text value.
    fn as_column(&self) -> &'static str;
}

impl StatusColumn for TopicStatus {
    fn as_column(&self) -> &'static str {
        self.as_str()
    }
}

impl StatusColumn for GroupStatus {
    fn as_column(&self) -> &'static str {
        self.as_str()
    }
}

/// Pagination and filtering for `list` queries.
///
/// Empty vectors and `None` mean "no filter".
#[derive(Debug, Clone)]
pub struct ListOptions<S> {
    /// Maximum rows returned.
    pub limit: Option<u32>,
    /// Rows skipped before the first returned.
    pub offset: u32,
    /// Case-insensitive substring match on the entity's text columns.
    pub like_text: Option<String>,
    /// Keep only rows in one of these states.
    pub statuses: Vec<S>,
    /// Keep only these ids.
    pub id_in: Vec<Uuid>,
    /// Drop these ids.
    pub id_not_in: Vec<Uuid>,
}

impl<S> Default for ListOptions<S> {
    fn default() -> Self {
        Self {
            limit: None,
            offset: 0,
            like_text: None,
            statuses: Vec::new(),
            id_in: Vec::new(),
            id_not_in: Vec::new(),
        }
    }
}

impl<S: StatusColumn> ListOptions<S> {
    /// No filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page window.
    #[must_use]
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Substring match on text.
    #[must_use]
    pub fn like(mut self, text: impl Into<String>) -> Self {
        self.like_text = Some(text.into());
        self
    }

    /// Restrict to `statuses`.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    /// Restrict to `ids`.
    #[must_use]
    pub fn only(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.id_in.extend(ids);
        self
    }

    /// Exclude `ids`.
    #[must_use]
    pub fn excluding(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.id_not_in.extend(ids);
        self
    }

    /// Append `AND ...` clauses to a query that already has a `WHERE`.
    /// `text_columns` are OR-ed for the `like_text` filter.
    pub(crate) fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>, text_columns: &[&str]) {
        if let Some(text) = self.like_text.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (");
            for (i, column) in text_columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column)
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }
        if !self.statuses.is_empty() {
            qb.push(" AND status IN (");
            let mut list = qb.separated(", ");
            for status in &self.statuses {
                list.push_bind(status.as_column());
            }
            list.push_unseparated(")");
        }
        if !self.id_in.is_empty() {
            qb.push(" AND id IN (");
            let mut list = qb.separated(", ");
            for id in &self.id_in {
                list.push_bind(id.to_string());
            }
            list.push_unseparated(")");
        }
        if !self.id_not_in.is_empty() {
            qb.push(" AND id NOT IN (");
            let mut list = qb.separated(", ");
            for id in &self.id_not_in {
                list.push_bind(id.to_string());
            }
            list.push_unseparated(")");
        }
    }

    /// Append `ORDER BY` and the page window.
    pub(crate) fn push_order_and_page(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" ORDER BY created_at ASC, rowid ASC");
        if self.limit.is_some() || self.offset > 0 {
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
            let limit = self.limit.map_or(-1, i64::from);
            qb.push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(i64::from(self.offset));
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
