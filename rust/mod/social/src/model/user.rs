use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripvisor_store::Document;

/// A traveller. `id` is the identity provider's stable user id.
///
/// `followers` and `following` are inverse projections of the same edge
/// set: `a ∈ b.followers` exactly when `b ∈ a.following`. They are only
/// ever changed together, in one pair update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(default)]
    pub followers: BTreeSet<String>,

    #[serde(default)]
    pub following: BTreeSet<String>,

    /// Blog ids this user has favorited.
    #[serde(default)]
    pub favorite_blogs: BTreeSet<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, bio: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            bio,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            favorite_blogs: BTreeSet::new(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    pub fn follows(&self, other: &str) -> bool {
        self.following.contains(other)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
        }
    }
}

impl Document for User {
    const KIND: &'static str = "user";

    fn kv_prefix() -> &'static str {
        "social:user:"
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

/// Input for registering the calling user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Entry in a followers/following list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Public profile. Counts only; the lists sit behind the mutual gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub followers_count: usize,
    pub following_count: usize,
    pub blogs_count: usize,
    pub groups_count: usize,
    /// Whether the viewer follows this user.
    pub is_following: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    pub is_following: bool,
    /// Target's follower count after the toggle.
    pub followers_count: usize,
    /// Actor's following count after the toggle.
    pub following_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualStatus {
    pub a_follows_b: bool,
    pub b_follows_a: bool,
    pub is_mutual: bool,
}

impl MutualStatus {
    pub fn between(a: &User, b: &User) -> Self {
        let a_follows_b = a.follows(&b.id);
        let b_follows_a = b.follows(&a.id);
        Self {
            a_follows_b,
            b_follows_a,
            is_mutual: a_follows_b && b_follows_a,
        }
    }
}
