//! A reference links a poll to one place where its message was delivered:
//! the admin's chat message, a voter's private chat message, or an inline
//! message.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use teloxide::types::{ChatId, MessageId};
use thiserror::Error;

use crate::db::{DbMessageId, DbPollId, DbReferenceId, DbUserId};
use crate::models::{NewReferenceRow, ReferenceRow};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("unknown reference type {0:?}")]
    UnknownType(String),
    #[error("reference has no type")]
    MissingType,
    #[error("wrong type or missing parameters for reference type {0}")]
    MissingParameters(ReferenceType),
    #[error("unexpected parameters for reference type {0}")]
    UnexpectedParameters(ReferenceType),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReferenceType {
    Inline,
    Admin,
    PrivateVote,
}

impl ReferenceType {
    /// The value stored in the `type` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Admin => "admin",
            Self::PrivateVote => "private_vote",
        }
    }
}

impl FromStr for ReferenceType {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Self::Inline),
            "admin" => Ok(Self::Admin),
            "private_vote" => Ok(Self::PrivateVote),
            _ => Err(ConstructionError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the referenced message lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReferenceKind {
    Inline { inline_message_id: String },
    Admin { user_id: DbUserId, message_id: DbMessageId },
    PrivateVote { user_id: DbUserId, message_id: DbMessageId },
}

impl ReferenceKind {
    /// Pick the addressing fields required by `reference_type`.
    /// Fields that belong to the other shape are ignored.
    pub fn new(
        reference_type: ReferenceType,
        user_id: Option<DbUserId>,
        message_id: Option<DbMessageId>,
        inline_message_id: Option<String>,
    ) -> Result<Self, ConstructionError> {
        match (reference_type, user_id, message_id, inline_message_id) {
            (ReferenceType::Admin, Some(user_id), Some(message_id), _) => {
                Ok(Self::Admin { user_id, message_id })
            }
            (ReferenceType::PrivateVote, Some(user_id), Some(message_id), _) => {
                Ok(Self::PrivateVote { user_id, message_id })
            }
            (ReferenceType::Inline, _, _, Some(inline_message_id)) => {
                Ok(Self::Inline { inline_message_id })
            }
            (reference_type, ..) => {
                Err(ConstructionError::MissingParameters(reference_type))
            }
        }
    }

    pub const fn reference_type(&self) -> ReferenceType {
        match self {
            Self::Inline { .. } => ReferenceType::Inline,
            Self::Admin { .. } => ReferenceType::Admin,
            Self::PrivateVote { .. } => ReferenceType::PrivateVote,
        }
    }

    pub const fn user_id(&self) -> Option<DbUserId> {
        match self {
            Self::Inline { .. } => None,
            Self::Admin { user_id, .. } | Self::PrivateVote { user_id, .. } => {
                Some(*user_id)
            }
        }
    }

    pub const fn message_id(&self) -> Option<DbMessageId> {
        match self {
            Self::Inline { .. } => None,
            Self::Admin { message_id, .. }
            | Self::PrivateVote { message_id, .. } => Some(*message_id),
        }
    }

    pub fn inline_message_id(&self) -> Option<&str> {
        match self {
            Self::Inline { inline_message_id } => Some(inline_message_id.as_str()),
            Self::Admin { .. } | Self::PrivateVote { .. } => None,
        }
    }
}

/// A reference that is not stored yet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewReference {
    pub poll_id: DbPollId,
    pub kind: ReferenceKind,
}

impl NewReference {
    /// Build a reference from a type tag and whatever parameters the caller
    /// has. Fails if the tag is unknown or the parameters required by it are
    /// missing.
    pub fn new(
        poll_id: DbPollId,
        reference_type: &str,
        user_id: Option<DbUserId>,
        message_id: Option<DbMessageId>,
        inline_message_id: Option<String>,
    ) -> Result<Self, ConstructionError> {
        let kind = ReferenceKind::new(
            reference_type.parse()?,
            user_id,
            message_id,
            inline_message_id,
        )?;
        Ok(Self { poll_id, kind })
    }

    pub fn inline(poll_id: DbPollId, inline_message_id: String) -> Self {
        Self { poll_id, kind: ReferenceKind::Inline { inline_message_id } }
    }

    pub const fn admin(
        poll_id: DbPollId,
        user_id: DbUserId,
        message_id: DbMessageId,
    ) -> Self {
        Self { poll_id, kind: ReferenceKind::Admin { user_id, message_id } }
    }

    pub const fn private_vote(
        poll_id: DbPollId,
        user_id: DbUserId,
        message_id: DbMessageId,
    ) -> Self {
        Self {
            poll_id,
            kind: ReferenceKind::PrivateVote { user_id, message_id },
        }
    }

    pub fn as_row(&self) -> NewReferenceRow<'_> {
        NewReferenceRow {
            type_: Some(self.kind.reference_type().as_str()),
            bot_inline_message_id: self.kind.inline_message_id(),
            message_id: self.kind.message_id(),
            user_id: self.kind.user_id(),
            poll_id: self.poll_id,
        }
    }
}

/// A stored reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference {
    pub id: DbReferenceId,
    pub poll_id: DbPollId,
    pub kind: ReferenceKind,
    pub message_dc_id: Option<i64>,
    pub message_access_hash: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A message the bot can edit through the Bot API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageTarget<'a> {
    Chat { chat_id: ChatId, message_id: MessageId },
    Inline(&'a str),
}

impl Reference {
    pub fn target(&self) -> Result<MessageTarget<'_>, std::num::TryFromIntError> {
        match &self.kind {
            ReferenceKind::Inline { inline_message_id } => {
                Ok(MessageTarget::Inline(inline_message_id.as_str()))
            }
            ReferenceKind::Admin { user_id, message_id }
            | ReferenceKind::PrivateVote { user_id, message_id } => {
                Ok(MessageTarget::Chat {
                    chat_id: (*user_id).into(),
                    message_id: (*message_id).try_into()?,
                })
            }
        }
    }
}

impl TryFrom<ReferenceRow> for Reference {
    type Error = ConstructionError;

    fn try_from(row: ReferenceRow) -> Result<Self, Self::Error> {
        let reference_type: ReferenceType =
            row.type_.as_deref().ok_or(ConstructionError::MissingType)?.parse()?;

        let kind = match reference_type {
            ReferenceType::Inline => {
                if row.user_id.is_some() || row.message_id.is_some() {
                    return Err(ConstructionError::UnexpectedParameters(
                        reference_type,
                    ));
                }
                ReferenceKind::new(
                    reference_type,
                    None,
                    None,
                    row.bot_inline_message_id,
                )?
            }
            ReferenceType::Admin | ReferenceType::PrivateVote => {
                if row.bot_inline_message_id.is_some() {
                    return Err(ConstructionError::UnexpectedParameters(
                        reference_type,
                    ));
                }
                ReferenceKind::new(
                    reference_type,
                    row.user_id,
                    row.message_id,
                    None,
                )?
            }
        };

        Ok(Self {
            id: row.id,
            poll_id: row.poll_id,
            kind,
            message_dc_id: row.message_dc_id,
            message_access_hash: row.message_access_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            // Inline messages have no chat message id, the slot shows the
            // inline message id instead.
            ReferenceKind::Inline { inline_message_id } => {
                write!(f, "Reference {}: message_id {inline_message_id}", self.id)
            }
            ReferenceKind::Admin { user_id, message_id } => write!(
                f,
                "Reference {}: message_id {message_id}, admin: {user_id}",
                self.id
            ),
            ReferenceKind::PrivateVote { user_id, message_id } => write!(
                f,
                "Reference {}: message_id {message_id}, user: {user_id}",
                self.id
            ),
        }
    }
}
