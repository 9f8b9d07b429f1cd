//! Snapshot sources backed by the social HTTP API.
//!
//! Each fetch re-reads the full parent entity and projects it down to the
//! collection sizes the tracker compares.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use crate::error::SyncError;
use crate::poller::SnapshotSource;
use crate::tracker::{Snapshot, WatchKey};

/// Body of a server-side error response.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Shared HTTP plumbing: base URL, optional bearer token, JSON decode.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the social API root, e.g. `http://localhost:8080/social`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body: ErrorBody = resp.json().await.unwrap_or(ErrorBody {
                code: String::new(),
                message: String::new(),
            });
            return Err(SyncError::Server {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| SyncError::Decode(format!("{}: {}", url, e)))
    }
}

#[derive(Deserialize)]
struct BlogWire {
    id: String,
    #[serde(default)]
    comments: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct DiscussionWire {
    id: String,
    #[serde(default)]
    replies: Vec<IgnoredAny>,
}

#[derive(Deserialize)]
struct GroupWire {
    id: String,
    #[serde(default)]
    discussions: Vec<DiscussionWire>,
}

fn blog_snapshot(blog: BlogWire) -> Snapshot {
    Snapshot::new().with(WatchKey::BlogComments(blog.id), blog.comments.len())
}

fn group_snapshot(group: GroupWire) -> Snapshot {
    let mut snapshot = Snapshot::new().with(
        WatchKey::GroupDiscussions(group.id.clone()),
        group.discussions.len(),
    );
    for d in group.discussions {
        snapshot.set(
            WatchKey::DiscussionReplies {
                group: group.id.clone(),
                discussion: d.id,
            },
            d.replies.len(),
        );
    }
    snapshot
}

/// Watches the comments of one blog.
pub struct HttpBlogSource {
    client: ApiClient,
    blog_id: String,
}

impl HttpBlogSource {
    pub fn new(client: ApiClient, blog_id: impl Into<String>) -> Self {
        Self {
            client,
            blog_id: blog_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for HttpBlogSource {
    async fn snapshot(&self) -> Result<Snapshot, SyncError> {
        let blog: BlogWire = self.client.get_json(&format!("/blogs/{}", self.blog_id)).await?;
        Ok(blog_snapshot(blog))
    }
}

/// Watches the discussions of one group and the replies of each discussion.
pub struct HttpGroupSource {
    client: ApiClient,
    group_id: String,
}

impl HttpGroupSource {
    pub fn new(client: ApiClient, group_id: impl Into<String>) -> Self {
        Self {
            client,
            group_id: group_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for HttpGroupSource {
    async fn snapshot(&self) -> Result<Snapshot, SyncError> {
        let group: GroupWire = self.client.get_json(&format!("/groups/{}", self.group_id)).await?;
        Ok(group_snapshot(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_projection_counts_comments() {
        let wire: BlogWire = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "title": "ignored",
            "comments": [{ "id": "c1" }, { "id": "c2" }],
        }))
        .unwrap();
        let snap = blog_snapshot(wire);
        assert_eq!(snap.get(&WatchKey::BlogComments("b1".into())), Some(2));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn group_projection_counts_discussions_and_replies() {
        let wire: GroupWire = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "discussions": [
                { "id": "d1", "replies": [{}, {}, {}] },
                { "id": "d2" },
            ],
        }))
        .unwrap();
        let snap = group_snapshot(wire);
        assert_eq!(snap.get(&WatchKey::GroupDiscussions("g1".into())), Some(2));
        let d1 = WatchKey::DiscussionReplies {
            group: "g1".into(),
            discussion: "d1".into(),
        };
        assert_eq!(snap.get(&d1), Some(3));
        let d2 = WatchKey::DiscussionReplies {
            group: "g1".into(),
            discussion: "d2".into(),
        };
        assert_eq!(snap.get(&d2), Some(0));
    }

    #[test]
    fn missing_collections_read_as_empty() {
        let wire: BlogWire = serde_json::from_value(serde_json::json!({ "id": "b2" })).unwrap();
        assert_eq!(blog_snapshot(wire).get(&WatchKey::BlogComments("b2".into())), Some(0));
    }
}
