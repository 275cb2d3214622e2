//! Reflection (journal entry) and reaction records.
//!
//! # Responsibility
//! - Define the three-field journal entry and its single sharing audience.
//! - Define the per-user reaction attached to a reflection.
//!
//! # Invariants
//! - A reflection has exactly one audience; a target id exists iff the
//!   audience is not `self`. `ShareTarget` makes the violating states
//!   unrepresentable.
//! - Reflections are immutable after creation except for appended reactions.
//! - At most one reaction exists per `(reflection_id, user_id)`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::herd::HerdId;
use super::now_epoch_ms;
use super::user::UserId;

pub type ReflectionId = Uuid;
pub type ReactionId = Uuid;

/// Reaction tag used when the caller does not provide one.
pub const DEFAULT_REACTION_TYPE: &str = "tell_me_more";

/// Audience discriminator, stored and serialized as `self|friend|herd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    #[serde(rename = "self")]
    SelfOnly,
    Friend,
    Herd,
}

impl ShareKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfOnly => "self",
            Self::Friend => "friend",
            Self::Herd => "herd",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "self" => Some(Self::SelfOnly),
            "friend" => Some(Self::Friend),
            "herd" => Some(Self::Herd),
            _ => None,
        }
    }
}

/// Who a reflection is shared with.
///
/// `Friend` is a directed share to one user id; it is not checked against the
/// friend graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    SelfOnly,
    Friend(UserId),
    Herd(HerdId),
}

impl ShareTarget {
    pub fn kind(self) -> ShareKind {
        match self {
            Self::SelfOnly => ShareKind::SelfOnly,
            Self::Friend(_) => ShareKind::Friend,
            Self::Herd(_) => ShareKind::Herd,
        }
    }

    pub fn target_id(self) -> Option<Uuid> {
        match self {
            Self::SelfOnly => None,
            Self::Friend(id) | Self::Herd(id) => Some(id),
        }
    }

    /// Rebuilds a target from its wire/storage pair.
    ///
    /// An empty or whitespace id counts as absent.
    pub fn from_parts(kind: &str, target_id: Option<&str>) -> Result<Self, ShareTargetError> {
        let kind = ShareKind::parse(kind.trim())
            .ok_or_else(|| ShareTargetError::UnknownKind(kind.to_string()))?;
        let target_id = target_id.map(str::trim).filter(|value| !value.is_empty());

        match (kind, target_id) {
            (ShareKind::SelfOnly, None) => Ok(Self::SelfOnly),
            (ShareKind::SelfOnly, Some(_)) => Err(ShareTargetError::UnexpectedTarget),
            (kind, None) => Err(ShareTargetError::MissingTarget(kind)),
            (kind, Some(raw)) => {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| ShareTargetError::InvalidTargetId(raw.to_string()))?;
                Ok(match kind {
                    ShareKind::Friend => Self::Friend(id),
                    _ => Self::Herd(id),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareTargetError {
    UnknownKind(String),
    MissingTarget(ShareKind),
    UnexpectedTarget,
    InvalidTargetId(String),
}

impl Display for ShareTargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind(value) => write!(
                f,
                "unknown sharedWithType `{value}`; expected self|friend|herd"
            ),
            Self::MissingTarget(kind) => {
                write!(f, "sharedWithId is required when sharing with {}", kind.as_str())
            }
            Self::UnexpectedTarget => write!(f, "sharedWithId must be empty for self reflections"),
            Self::InvalidTargetId(value) => write!(f, "invalid sharedWithId `{value}`"),
        }
    }
}

impl Error for ShareTargetError {}

/// Caller-provided content of a new reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionDraft {
    pub high_text: String,
    pub low_text: String,
    pub buffalo_text: String,
    pub share: ShareTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection {
    pub id: ReflectionId,
    pub author_id: UserId,
    pub high_text: String,
    pub low_text: String,
    pub buffalo_text: String,
    pub share: ShareTarget,
    /// Reaction ids in the order they were recorded.
    pub reaction_ids: Vec<ReactionId>,
    pub created_at: i64,
}

impl Reflection {
    pub fn new(author_id: UserId, draft: ReflectionDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            high_text: draft.high_text,
            low_text: draft.low_text,
            buffalo_text: draft.buffalo_text,
            share: draft.share,
            reaction_ids: Vec::new(),
            created_at: now_epoch_ms(),
        }
    }

    pub fn is_author(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub id: ReactionId,
    pub reflection_id: ReflectionId,
    pub user_id: UserId,
    pub reaction_type: String,
    pub created_at: i64,
}

impl Reaction {
    /// Builds a reaction; a missing or blank tag falls back to
    /// [`DEFAULT_REACTION_TYPE`].
    pub fn new(reflection_id: ReflectionId, user_id: UserId, reaction_type: Option<&str>) -> Self {
        let reaction_type = reaction_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_REACTION_TYPE);
        Self {
            id: Uuid::new_v4(),
            reflection_id,
            user_id,
            reaction_type: reaction_type.to_string(),
            created_at: now_epoch_ms(),
        }
    }
}

/// Reflection joined with its resolved reactions, in recorded order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionWithReactions {
    pub reflection: Reflection,
    pub reactions: Vec<Reaction>,
}

#[cfg(test)]
mod tests {
    use super::{Reaction, ShareKind, ShareTarget, ShareTargetError, DEFAULT_REACTION_TYPE};
    use uuid::Uuid;

    #[test]
    fn share_target_requires_id_for_friend_and_herd() {
        assert_eq!(
            ShareTarget::from_parts("herd", None),
            Err(ShareTargetError::MissingTarget(ShareKind::Herd))
        );
        assert_eq!(
            ShareTarget::from_parts("friend", Some("  ")),
            Err(ShareTargetError::MissingTarget(ShareKind::Friend))
        );
    }

    #[test]
    fn share_target_rejects_id_for_self_and_unknown_kinds() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(
            ShareTarget::from_parts("self", Some(id.as_str())),
            Err(ShareTargetError::UnexpectedTarget)
        );
        assert!(matches!(
            ShareTarget::from_parts("everyone", None),
            Err(ShareTargetError::UnknownKind(_))
        ));
        assert!(matches!(
            ShareTarget::from_parts("friend", Some("not-a-uuid")),
            Err(ShareTargetError::InvalidTargetId(_))
        ));
    }

    #[test]
    fn share_target_parses_valid_pairs() {
        let id = Uuid::new_v4();
        let herd = ShareTarget::from_parts("herd", Some(id.to_string().as_str())).unwrap();
        assert_eq!(herd, ShareTarget::Herd(id));
        assert_eq!(herd.kind(), ShareKind::Herd);
        assert_eq!(herd.target_id(), Some(id));
        assert_eq!(ShareTarget::from_parts("self", None).unwrap(), ShareTarget::SelfOnly);
    }

    #[test]
    fn share_kind_serializes_with_wire_names() {
        let json = serde_json::to_string(&ShareKind::SelfOnly).unwrap();
        assert_eq!(json, "\"self\"");
        let parsed: ShareKind = serde_json::from_str("\"herd\"").unwrap();
        assert_eq!(parsed, ShareKind::Herd);
    }

    #[test]
    fn reaction_defaults_blank_type() {
        let reaction = Reaction::new(Uuid::new_v4(), Uuid::new_v4(), Some("   "));
        assert_eq!(reaction.reaction_type, DEFAULT_REACTION_TYPE);
        let reaction = Reaction::new(Uuid::new_v4(), Uuid::new_v4(), Some("hug"));
        assert_eq!(reaction.reaction_type, "hug");
    }
}
