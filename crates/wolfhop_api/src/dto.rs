//! Wire shapes (camelCase JSON) for requests and responses.
//!
//! Ids are UUID strings and timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wolfhop_core::{
    Herd, HerdWithMembers, Notification, Reaction, Reflection, ReflectionWithReactions, User,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub created_at: i64,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerdDto {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub created_at: i64,
    /// Present only on list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserDto>>,
}

impl From<&Herd> for HerdDto {
    fn from(herd: &Herd) -> Self {
        Self {
            id: herd.id,
            name: herd.name.clone(),
            owner_id: herd.owner_id,
            member_ids: herd.member_ids.clone(),
            created_at: herd.created_at,
            members: None,
        }
    }
}

impl From<&HerdWithMembers> for HerdDto {
    fn from(entry: &HerdWithMembers) -> Self {
        Self {
            members: Some(entry.members.iter().map(UserDto::from).collect()),
            ..Self::from(&entry.herd)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDto {
    pub id: Uuid,
    pub reflection_id: Uuid,
    pub user_id: Uuid,
    pub reaction_type: String,
    pub created_at: i64,
}

impl From<&Reaction> for ReactionDto {
    fn from(reaction: &Reaction) -> Self {
        Self {
            id: reaction.id,
            reflection_id: reaction.reflection_id,
            user_id: reaction.user_id,
            reaction_type: reaction.reaction_type.clone(),
            created_at: reaction.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionDto {
    pub id: Uuid,
    /// Author id.
    pub user_id: Uuid,
    pub high_text: String,
    pub low_text: String,
    pub buffalo_text: String,
    pub shared_with_type: String,
    pub shared_with_id: Option<Uuid>,
    pub reactions: Vec<ReactionDto>,
    pub created_at: i64,
}

impl ReflectionDto {
    fn build(reflection: &Reflection, reactions: &[Reaction]) -> Self {
        Self {
            id: reflection.id,
            user_id: reflection.author_id,
            high_text: reflection.high_text.clone(),
            low_text: reflection.low_text.clone(),
            buffalo_text: reflection.buffalo_text.clone(),
            shared_with_type: reflection.share.kind().as_str().to_string(),
            shared_with_id: reflection.share.target_id(),
            reactions: reactions.iter().map(ReactionDto::from).collect(),
            created_at: reflection.created_at,
        }
    }
}

impl From<&Reflection> for ReflectionDto {
    fn from(reflection: &Reflection) -> Self {
        Self::build(reflection, &[])
    }
}

impl From<&ReflectionWithReactions> for ReflectionDto {
    fn from(entry: &ReflectionWithReactions) -> Self {
        Self::build(&entry.reflection, &entry.reactions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: i64,
}

impl From<&Notification> for NotificationDto {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            sender_id: notification.sender_id,
            recipient_id: notification.recipient_id,
            kind: notification.kind.clone(),
            message: notification.message.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateBody {
    pub display_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerdCreateBody {
    pub name: String,
    #[serde(default)]
    pub member_emails: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerdUpdateBody {
    pub name: Option<String>,
    pub member_emails: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionCreateBody {
    pub high_text: String,
    pub low_text: String,
    pub buffalo_text: String,
    pub shared_with_type: String,
    pub shared_with_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCreateBody {
    pub reaction_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCreateBody {
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Query flags for `POST /friends/add/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FriendAddQuery {
    #[serde(default = "default_true")]
    pub notification_creation: bool,
}

impl Default for FriendAddQuery {
    fn default() -> Self {
        Self {
            notification_creation: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::{FriendAddQuery, NotificationDto, UserDto};
    use wolfhop_core::{Notification, User};

    #[test]
    fn user_dto_omits_password_hash() {
        let user = User::new("Ada", "ada@x.com", "$argon2id$secret");
        let json = serde_json::to_value(UserDto::from(&user)).unwrap();
        assert_eq!(json["displayName"], "Ada");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let user = User::new("Ada", "ada@x.com", "hash");
        let notification = Notification::new(user.id, user.id, "nudge", "hi");
        let json = serde_json::to_value(NotificationDto::from(&notification)).unwrap();
        assert_eq!(json["type"], "nudge");
        assert_eq!(json["read"], false);
    }

    #[test]
    fn friend_add_query_defaults_to_notify() {
        let query: FriendAddQuery = serde_urlencoded::from_str("").unwrap();
        assert!(query.notification_creation);
        let query: FriendAddQuery =
            serde_urlencoded::from_str("notification_creation=false").unwrap();
        assert!(!query.notification_creation);
    }
}
