use tracing::debug;

use tripvisor_core::{ListParams, ListResult};

use super::{SocialError, SocialService};
use crate::model::{self, Blog, Reaction, SubjectKind};

fn reacted(kind: SubjectKind, subject: &str, user: &str, r: Reaction) -> Reaction {
    debug!(
        "{:?} {} by {}: active={} count={}",
        kind, subject, user, r.active, r.count
    );
    r
}

impl SocialService {
    /// Like or unlike a blog.
    pub fn toggle_blog_like(&self, blog_id: &str, user: &str) -> Result<Reaction, SocialError> {
        let (_, r) = self.blogs.update(blog_id, |blog| {
            Ok::<_, SocialError>(model::toggle(&mut blog.likes, user))
        })?;
        Ok(reacted(SubjectKind::Blog, blog_id, user, r))
    }

    /// Like or unlike a discussion inside a group.
    pub fn toggle_discussion_like(
        &self,
        group_id: &str,
        discussion_id: &str,
        user: &str,
    ) -> Result<Reaction, SocialError> {
        let (_, r) = self.groups.update(group_id, |group| {
            let discussion = group
                .discussion_mut(discussion_id)
                .ok_or_else(|| SocialError::NotFound(format!("discussion '{}' not found", discussion_id)))?;
            Ok::<_, SocialError>(model::toggle(&mut discussion.likes, user))
        })?;
        Ok(reacted(SubjectKind::Discussion, discussion_id, user, r))
    }

    /// Add a blog to, or remove it from, the user's favorites.
    /// `count` is the size of the user's favorites list.
    pub fn toggle_favorite(&self, user: &str, blog_id: &str) -> Result<Reaction, SocialError> {
        self.blogs.get_or_err(blog_id)?;
        let (_, r) = self.users.update(user, |u| {
            Ok::<_, SocialError>(model::toggle(&mut u.favorite_blogs, blog_id))
        })?;
        Ok(reacted(SubjectKind::Favorite, blog_id, user, r))
    }

    /// Published favorites, newest first. Favorites whose blog has since
    /// been deleted are skipped.
    pub fn list_favorites(&self, user: &str, params: &ListParams) -> Result<ListResult<Blog>, SocialError> {
        let user = self.users.get_or_err(user)?;
        let mut blogs = Vec::with_capacity(user.favorite_blogs.len());
        for id in &user.favorite_blogs {
            if let Some(blog) = self.blogs.get(id)? {
                if blog.is_published {
                    blogs.push(blog);
                }
            }
        }
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ListResult::paginate(blogs, params))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tripvisor_core::ListParams;

    use crate::model::{NewDiscussion, Reaction};
    use crate::service::testing::fixture;
    use crate::service::SocialError;

    #[test]
    fn blog_like_round_trip() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Kyoto");

        let on = f.svc.toggle_blog_like(&blog.id, "ben").unwrap();
        assert_eq!(on, Reaction { active: true, count: 1 });
        let off = f.svc.toggle_blog_like(&blog.id, "ben").unwrap();
        assert_eq!(off, Reaction { active: false, count: 0 });
        assert!(f.svc.get_blog("ana", &blog.id).unwrap().blog.likes.is_empty());
    }

    #[test]
    fn likes_from_different_users_accumulate() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Kyoto");
        f.svc.toggle_blog_like(&blog.id, "u1").unwrap();
        let r = f.svc.toggle_blog_like(&blog.id, "u2").unwrap();
        assert_eq!(r.count, 2);
    }

    #[test]
    fn like_missing_blog() {
        let f = fixture();
        assert!(matches!(f.svc.toggle_blog_like("nope", "u"), Err(SocialError::NotFound(_))));
    }

    #[test]
    fn discussion_like() {
        let f = fixture();
        f.user("ana");
        let g = f.group("ana", "Alps");
        let d = f
            .svc
            .add_discussion(&g.id, "ana", NewDiscussion { title: "Huts".into(), content: "Which ones?".into() })
            .unwrap();

        assert!(f.svc.toggle_discussion_like(&g.id, &d.id, "ana").unwrap().active);
        assert!(!f.svc.toggle_discussion_like(&g.id, &d.id, "ana").unwrap().active);
        assert!(matches!(
            f.svc.toggle_discussion_like(&g.id, "missing", "ana"),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn favorites_list_newest_first() {
        let f = fixture();
        f.user("ana");
        let old = f.blog("ana", "Old trip");
        f.clock.advance(Duration::minutes(5));
        let new = f.blog("ana", "New trip");

        f.svc.toggle_favorite("ana", &old.id).unwrap();
        let r = f.svc.toggle_favorite("ana", &new.id).unwrap();
        assert_eq!(r, Reaction { active: true, count: 2 });

        let page = f.svc.list_favorites("ana", &ListParams::default()).unwrap();
        let titles: Vec<_> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["New trip", "Old trip"]);

        f.svc.toggle_favorite("ana", &old.id).unwrap();
        assert_eq!(f.svc.list_favorites("ana", &ListParams::default()).unwrap().total, 1);
    }

    #[test]
    fn favorite_missing_blog() {
        let f = fixture();
        f.user("ana");
        assert!(matches!(f.svc.toggle_favorite("ana", "nope"), Err(SocialError::NotFound(_))));
    }
}
