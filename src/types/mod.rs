//! Domain types: topics, message groups, messages and answers.
//!
//! Enum values round-trip through SQLite as lowercase text via `as_str` and
//! `parse`; an unknown stored value is reported as [`Error::InvalidColumn`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::fingerprint::Fingerprint;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`Topic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    /// Open fact-check work.
    Pending,
    /// An answer has been published.
    Resolved,
}

impl TopicStatus {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised status.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            other => Err(Error::InvalidColumn {
                field: "topics.status",
                value: other.to_owned(),
            }),
        }
    }

    /// Whether new submissions may still reference a topic in this state.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the topic is still open for resolution.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Triage state of a [`MessageGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Awaiting admin triage.
    Pending,
    /// Accepted as fact-check work.
    Approved,
    /// Dismissed by an admin.
    Rejected,
}

impl GroupStatus {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised status.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::InvalidColumn {
                field: "message_groups.status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Who submitted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Backoffice administrator.
    Admin,
    /// End user chatting through LINE.
    LineChat,
}

impl UserType {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::LineChat => "line_chat",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised user type.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "admin" => Ok(Self::Admin),
            "line_chat" => Ok(Self::LineChat),
            other => Err(Error::InvalidColumn {
                field: "messages.user_type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Payload kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text.
    Text,
}

impl MessageType {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised message type.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "text" => Ok(Self::Text),
            other => Err(Error::InvalidColumn {
                field: "messages.message_type",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A unit of fact-check work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic id.
    pub id: Uuid,
    /// Short admin-facing name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Lifecycle state.
    pub status: TopicStatus,
    /// Text of the most recent answer, once resolved.
    pub result: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// A new pending topic.
    pub fn new(id: Uuid, name: String, description: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            description,
            status: TopicStatus::Pending,
            result: None,
            created_at,
            updated_at: None,
        }
    }
}

/// Deduplication bucket for identical message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageGroup {
    /// Group id.
    pub id: Uuid,
    /// Triage state.
    pub status: GroupStatus,
    /// Topic the group is assigned to, if any.
    pub topic_id: Option<Uuid>,
    /// Admin-facing label.
    pub name: String,
    /// The shared message text.
    pub text: String,
    /// Fingerprint of `text`; unique across groups.
    pub fingerprint: Fingerprint,
    /// Detected language, when known.
    pub language: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// One submission from a user or admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: Uuid,
    /// Submitting user.
    pub user_id: String,
    /// Kind of submitting user.
    pub user_type: UserType,
    /// Topic, always equal to the owning group's topic.
    pub topic_id: Option<Uuid>,
    /// Owning group.
    pub group_id: Uuid,
    /// Payload kind.
    pub message_type: MessageType,
    /// Raw submitted text.
    pub text: String,
    /// Opaque JSON metadata.
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A published resolution for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer id.
    pub id: Uuid,
    /// Topic answered.
    pub topic_id: Uuid,
    /// Author.
    pub user_id: String,
    /// Answer text.
    pub text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Submitter info and metadata
// ---------------------------------------------------------------------------

/// Identity of the caller, captured into message metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Kind of user.
    pub user_type: UserType,
    /// User id within that kind.
    pub user_id: String,
}

impl UserInfo {
    /// An admin user.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_type: UserType::Admin,
            user_id: user_id.into(),
        }
    }

    /// A LINE chat user.
    pub fn line_chat(user_id: impl Into<String>) -> Self {
        Self {
            user_type: UserType::LineChat,
            user_id: user_id.into(),
        }
    }
}

/// Discriminator for [`Metadata`] payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataType {
    /// Payload is a [`UserInfo`].
    #[serde(rename = "META_USERINFO")]
    UserInfo,
}

/// Typed envelope stored in [`Message::metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata<T> {
    /// Payload discriminator.
    #[serde(rename = "type")]
    pub kind: MetadataType,
    /// Payload.
    pub data: T,
}

impl Metadata<UserInfo> {
    /// Wrap the submitting user's info.
    pub fn user_info(user: UserInfo) -> Self {
        Self {
            kind: MetadataType::UserInfo,
            data: user,
        }
    }
}
