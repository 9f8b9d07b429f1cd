use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Blog, Group};

/// One entry of the activity feed. The kind is fixed when the item is
/// built, so consumers match on the tag instead of sniffing the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivityItem {
    /// A blog was published. `timestamp` is its creation time.
    Blog {
        timestamp: DateTime<Utc>,
        payload: Box<Blog>,
    },
    /// A group changed. `timestamp` is its last update time.
    Group {
        timestamp: DateTime<Utc>,
        payload: Box<Group>,
    },
}

impl ActivityItem {
    pub fn from_blog(blog: Blog) -> Self {
        ActivityItem::Blog {
            timestamp: blog.created_at,
            payload: Box::new(blog),
        }
    }

    pub fn from_group(group: Group) -> Self {
        ActivityItem::Group {
            timestamp: group.updated_at,
            payload: Box::new(group),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ActivityItem::Blog { timestamp, .. } | ActivityItem::Group { timestamp, .. } => *timestamp,
        }
    }
}
