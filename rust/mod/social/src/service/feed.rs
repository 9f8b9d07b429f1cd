use std::collections::BTreeSet;

use tracing::debug;

use tripvisor_core::{ListParams, ListResult};

use super::{SocialError, SocialService};
use crate::model::ActivityItem;

impl SocialService {
    /// Recent blogs and group activity from the people `user_id` follows,
    /// plus their own, newest first.
    ///
    /// Each source is paged on its own before the merge, so a page may hold
    /// up to `limit` items from either side and page boundaries can skip an
    /// item that the other source pushed out.
    pub fn build_feed(&self, user_id: &str, params: &ListParams) -> Result<ListResult<ActivityItem>, SocialError> {
        let mut circle: BTreeSet<String> = match self.users.get(user_id)? {
            Some(user) => user.following,
            None => BTreeSet::new(),
        };
        circle.insert(user_id.to_string());

        let skip = params.offset();
        let limit = params.limit();

        let blogs = self.blogs.find(
            |b| b.is_published && circle.contains(&b.author),
            |b| b.created_at,
            skip,
            limit,
        )?;
        let groups = self.groups.find(
            |g| {
                g.is_active
                    && (g.is_public || g.is_member(user_id))
                    && g.members.iter().any(|m| circle.contains(&m.user))
            },
            |g| g.updated_at,
            skip,
            limit,
        )?;

        let total = blogs.total + groups.total;
        let mut items: Vec<ActivityItem> = blogs
            .items
            .into_iter()
            .map(ActivityItem::from_blog)
            .chain(groups.items.into_iter().map(ActivityItem::from_group))
            .collect();
        items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        items.truncate(limit);

        debug!("feed for {}: {} items, {} total", user_id, items.len(), total);
        Ok(ListResult::new(items, total, params))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tripvisor_core::ListParams;

    use crate::model::{ActivityItem, CreateBlog, CreateGroup};
    use crate::service::testing::fixture;

    #[test]
    fn own_and_followed_content_only() {
        let f = fixture();
        f.user("me");
        f.user("friend");
        f.user("stranger");
        f.svc.follow("me", "friend").unwrap();

        f.blog("me", "Mine");
        f.clock.advance(Duration::seconds(1));
        f.blog("friend", "Theirs");
        f.clock.advance(Duration::seconds(1));
        f.blog("stranger", "Nope");
        f.clock.advance(Duration::seconds(1));
        f.group("friend", "Friend's crew");
        f.clock.advance(Duration::seconds(1));
        f.group("stranger", "Elsewhere");

        let feed = f.svc.build_feed("me", &ListParams::default()).unwrap();
        assert_eq!(feed.total, 3);
        let kinds: Vec<&str> = feed
            .items
            .iter()
            .map(|i| match i {
                ActivityItem::Blog { payload, .. } => payload.title.as_str(),
                ActivityItem::Group { payload, .. } => payload.name.as_str(),
            })
            .collect();
        assert_eq!(kinds, vec!["Friend's crew", "Theirs", "Mine"]);
    }

    #[test]
    fn timestamps_never_increase_within_a_page() {
        let f = fixture();
        f.user("me");
        f.user("a");
        f.svc.follow("me", "a").unwrap();
        for i in 0..6 {
            f.clock.advance(Duration::minutes(i));
            if i % 2 == 0 {
                f.blog("a", &format!("post {}", i));
            } else {
                f.group("a", &format!("group {}", i));
            }
        }
        // Touch the oldest group so its update time jumps ahead.
        f.clock.advance(Duration::minutes(10));
        let groups = f.svc.list_groups(&Default::default(), &ListParams::default()).unwrap();
        let oldest = groups.items.last().unwrap().id.clone();
        f.user("joiner");
        f.svc.join_group(&oldest, "joiner").unwrap();

        let feed = f.svc.build_feed("me", &ListParams::new(1, 4)).unwrap();
        assert_eq!(feed.items.len(), 4);
        assert_eq!(feed.total, 6);
        for pair in feed.items.windows(2) {
            assert!(pair[0].timestamp() >= pair[1].timestamp());
        }
        match &feed.items[0] {
            ActivityItem::Group { payload, .. } => assert_eq!(payload.id, oldest),
            other => panic!("expected the touched group first, got {:?}", other),
        }
    }

    #[test]
    fn drafts_and_private_groups_are_hidden() {
        let f = fixture();
        f.user("me");
        f.user("a");
        f.svc.follow("me", "a").unwrap();
        f.svc
            .create_blog(
                "a",
                CreateBlog {
                    title: "Draft".into(),
                    content: "wip".into(),
                    destination: "Oslo".into(),
                    category: None,
                    tags: vec![],
                    is_published: Some(false),
                },
            )
            .unwrap();
        f.svc
            .create_group(
                "a",
                CreateGroup {
                    name: "Private".into(),
                    description: "Invite only".into(),
                    category: None,
                    is_public: Some(false),
                    max_members: None,
                },
            )
            .unwrap();

        let feed = f.svc.build_feed("me", &ListParams::default()).unwrap();
        assert_eq!(feed.total, 0);
        assert!(feed.items.is_empty());
        assert_eq!(f.svc.build_feed("a", &ListParams::default()).unwrap().total, 1);
    }

    #[test]
    fn unregistered_caller_gets_empty_feed() {
        let f = fixture();
        let feed = f.svc.build_feed("nobody", &ListParams::default()).unwrap();
        assert_eq!(feed.total, 0);
        assert_eq!(feed.current_page, 1);
    }

    #[test]
    fn huge_page_is_empty_not_a_crash() {
        let f = fixture();
        f.user("me");
        f.blog("me", "Mine");

        let feed = f.svc.build_feed("me", &ListParams::new(usize::MAX, 10)).unwrap();
        assert!(feed.items.is_empty());
        assert_eq!(feed.total, 1);
    }
}
