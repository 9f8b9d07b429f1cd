use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripvisor_store::Document;

use super::blog::needle;
use super::Category;

pub const MAX_GROUP_NAME_LEN: usize = 100;
pub const MAX_GROUP_DESCRIPTION_LEN: usize = 1000;
pub const MAX_DISCUSSION_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub likes: BTreeSet<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

/// A travel group with its members and discussion board.
///
/// `member_count` is derived: every mutation of `members` recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub owner: String,
    #[serde(default)]
    pub admins: BTreeSet<String>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub member_count: usize,
    pub max_members: usize,
    pub is_public: bool,
    pub is_active: bool,
    #[serde(default)]
    pub discussions: Vec<Discussion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn member(&self, user: &str) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.member(user).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }

    pub fn add_member(&mut self, user: &str, role: MemberRole, now: DateTime<Utc>) {
        self.members.push(GroupMember {
            user: user.to_string(),
            role,
            joined_at: now,
        });
        if role == MemberRole::Admin {
            self.admins.insert(user.to_string());
        }
        self.member_count = self.members.len();
    }

    /// Remove `user` from members and admins. Returns false if they were
    /// not a member.
    pub fn remove_member(&mut self, user: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.user != user);
        self.admins.remove(user);
        self.member_count = self.members.len();
        self.members.len() != before
    }

    pub fn discussion(&self, id: &str) -> Option<&Discussion> {
        self.discussions.iter().find(|d| d.id == id)
    }

    pub fn discussion_mut(&mut self, id: &str) -> Option<&mut Discussion> {
        self.discussions.iter_mut().find(|d| d.id == id)
    }
}

impl Document for Group {
    const KIND: &'static str = "group";

    fn kv_prefix() -> &'static str {
        "social:group:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn before_create(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn before_update(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Input for creating a group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub max_members: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDiscussion {
    pub title: String,
    pub content: String,
}

/// Query-string filters for group listings. `search` is a
/// case-insensitive match on name or description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub search: Option<String>,
}

impl GroupFilter {
    pub fn matches(&self, group: &Group) -> bool {
        if self.category.is_some_and(|c| c != group.category) {
            return false;
        }
        match needle(&self.search) {
            Some(q) => {
                group.name.to_lowercase().contains(&q) || group.description.to_lowercase().contains(&q)
            }
            None => true,
        }
    }
}

/// A group as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    #[serde(flatten)]
    pub group: Group,
    pub is_member: bool,
    pub user_role: Option<MemberRole>,
}
