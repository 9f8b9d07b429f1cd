use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripvisor_store::Document;

use super::{Category, Poll};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A travel blog post. Owns its comments, likes and at most one poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub destination: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: BTreeSet<String>,
    /// Insertion order, never resorted.
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    #[serde(default)]
    pub shares: u64,
    /// Distinct viewers, tracked in [`BlogViewers`].
    #[serde(default)]
    pub views: u64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }
}

impl Document for Blog {
    const KIND: &'static str = "blog";

    fn kv_prefix() -> &'static str {
        "social:blog:"
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

/// Who has opened a blog. Stored under its own key so blog payloads never
/// carry viewer ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogViewers {
    pub blog_id: String,
    #[serde(default)]
    pub viewers: BTreeSet<String>,
}

impl Document for BlogViewers {
    const KIND: &'static str = "blog viewers";

    fn kv_prefix() -> &'static str {
        "social:blog-viewers:"
    }

    fn key_value(&self) -> String {
        self.blog_id.clone()
    }
}

/// Input for publishing a blog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlog {
    pub title: String,
    pub content: String,
    pub destination: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Drafts are stored but never listed or fed.
    #[serde(default)]
    pub is_published: Option<bool>,
}

/// Body of a new comment or reply.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContent {
    pub content: String,
}

/// A blog as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    #[serde(flatten)]
    pub blog: Blog,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlogSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Views,
    Likes,
    Shares,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Query-string filters for blog listings. Text matches are
/// case-insensitive substring matches; blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub destination: Option<String>,
    /// Matched against title, content, destination and tags.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: BlogSort,
    #[serde(default)]
    pub sort_order: SortOrder,
}

pub(crate) fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

impl BlogFilter {
    pub fn matches(&self, blog: &Blog) -> bool {
        if self.category.is_some_and(|c| c != blog.category) {
            return false;
        }
        if let Some(dest) = needle(&self.destination) {
            if !blog.destination.to_lowercase().contains(&dest) {
                return false;
            }
        }
        if let Some(q) = needle(&self.search) {
            let hit = blog.title.to_lowercase().contains(&q)
                || blog.content.to_lowercase().contains(&q)
                || blog.destination.to_lowercase().contains(&q)
                || blog.tags.iter().any(|t| t.contains(&q));
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn compare(&self, a: &Blog, b: &Blog) -> Ordering {
        let ord = match self.sort_by {
            BlogSort::CreatedAt => a.created_at.cmp(&b.created_at),
            BlogSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            BlogSort::Views => a.views.cmp(&b.views),
            BlogSort::Likes => a.likes.len().cmp(&b.likes.len()),
            BlogSort::Shares => a.shares.cmp(&b.shares),
        };
        self.sort_order.apply(ord)
    }
}
