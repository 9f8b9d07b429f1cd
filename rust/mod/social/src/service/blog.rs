use tracing::info;

use tripvisor_core::{new_id, ListParams, ListResult, ServiceError};

use super::{bounded, required, SocialError, SocialService};
use crate::model::{Blog, BlogFilter, BlogView, BlogViewers, Category, CreateBlog, MAX_TITLE_LEN};

impl SocialService {
    pub fn create_blog(&self, author: &str, input: CreateBlog) -> Result<Blog, SocialError> {
        let title = bounded("title", &input.title, MAX_TITLE_LEN)?;
        let content = required("content", &input.content)?;
        let destination = required("destination", &input.destination)?;
        self.users.get_or_err(author)?;

        let mut tags: Vec<String> = Vec::new();
        for tag in input.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let now = self.now();
        let blog = self.blogs.insert(Blog {
            id: new_id(),
            author: author.to_string(),
            title,
            content,
            destination,
            category: input.category.unwrap_or(Category::Other),
            tags,
            likes: Default::default(),
            comments: Vec::new(),
            poll: None,
            shares: 0,
            views: 0,
            is_published: input.is_published.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })?;

        info!("blog {} created by {}", blog.id, author);
        Ok(blog)
    }

    /// Read a blog. The first read by each viewer counts as a view.
    /// Drafts are visible to their author only.
    pub fn get_blog(&self, viewer: &str, blog_id: &str) -> Result<BlogView, SocialError> {
        let mut blog = self.blogs.get_or_err(blog_id)?;
        if !blog.is_published && blog.author != viewer {
            return Err(SocialError::NotFound(format!("blog '{}' not found", blog_id)));
        }

        if self.record_viewer(blog_id, viewer)? {
            let (updated, _) = self.blogs.update(blog_id, |b| {
                b.views += 1;
                Ok::<_, SocialError>(())
            })?;
            blog = updated;
        }

        Ok(BlogView {
            is_liked: blog.likes.contains(viewer),
            blog,
        })
    }

    /// Add `viewer` to the blog's viewer set. Returns true on a first view.
    fn record_viewer(&self, blog_id: &str, viewer: &str) -> Result<bool, SocialError> {
        let first_view = |v: &mut BlogViewers| Ok::<_, SocialError>(v.viewers.insert(viewer.to_string()));
        match self.viewers.update(blog_id, first_view) {
            Ok((_, added)) => return Ok(added),
            Err(SocialError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let viewers = BlogViewers {
            blog_id: blog_id.to_string(),
            viewers: std::iter::once(viewer.to_string()).collect(),
        };
        match self.viewers.insert(viewers) {
            Ok(_) => Ok(true),
            // Another first reader created it; join that set instead.
            Err(ServiceError::Conflict(_)) => Ok(self.viewers.update(blog_id, first_view)?.1),
            Err(e) => Err(e.into()),
        }
    }

    /// Published blogs matching `filter`, newest first unless it says otherwise.
    pub fn list_blogs(&self, filter: &BlogFilter, params: &ListParams) -> Result<ListResult<Blog>, SocialError> {
        let found = self.blogs.find_by(
            |b| b.is_published && filter.matches(b),
            |a, b| filter.compare(a, b),
            params.offset(),
            params.limit(),
        )?;
        Ok(ListResult::new(found.items, found.total, params))
    }

    /// Blogs by `author`, newest first. Drafts are included only when the
    /// author is the viewer.
    pub fn list_user_blogs(
        &self,
        viewer: &str,
        author: &str,
        params: &ListParams,
    ) -> Result<ListResult<Blog>, SocialError> {
        let own = viewer == author;
        let found = self.blogs.find(
            |b| b.author == author && (b.is_published || own),
            |b| b.created_at,
            params.offset(),
            params.limit(),
        )?;
        Ok(ListResult::new(found.items, found.total, params))
    }

    pub fn delete_blog(&self, actor: &str, blog_id: &str) -> Result<(), SocialError> {
        self.blogs.remove_with(blog_id, |blog| {
            if blog.author != actor {
                return Err(SocialError::Forbidden("you can only delete your own blogs".into()));
            }
            Ok(())
        })?;
        match self.viewers.remove_with::<SocialError, _>(blog_id, |_| Ok(())) {
            Ok(_) | Err(SocialError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        info!("blog {} deleted by {}", blog_id, actor);
        Ok(())
    }

    /// Count a share. Returns the new share count.
    pub fn share_blog(&self, blog_id: &str) -> Result<u64, SocialError> {
        let (blog, _) = self.blogs.update(blog_id, |blog| {
            blog.shares += 1;
            Ok::<_, SocialError>(())
        })?;
        Ok(blog.shares)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tripvisor_core::ListParams;

    use crate::model::{BlogFilter, BlogSort, Category, CreateBlog, SortOrder};
    use crate::service::testing::fixture;
    use crate::service::SocialError;

    fn draft(title: &str) -> CreateBlog {
        CreateBlog {
            title: title.into(),
            content: "Not ready yet".into(),
            destination: "Oslo".into(),
            category: Some(Category::Cultural),
            tags: vec![" Museums ".into(), "museums".into(), "".into()],
            is_published: Some(false),
        }
    }

    #[test]
    fn create_normalizes_input() {
        let f = fixture();
        f.user("ana");
        let blog = f.svc.create_blog("ana", draft("  Oslo  ")).unwrap();
        assert_eq!(blog.title, "Oslo");
        assert_eq!(blog.tags, vec!["museums"]);
        assert_eq!(blog.category, Category::Cultural);
        assert!(!blog.is_published);
    }

    #[test]
    fn create_requires_fields_and_author() {
        let f = fixture();
        f.user("ana");
        let mut input = draft("Oslo");
        input.destination = " ".into();
        assert!(matches!(f.svc.create_blog("ana", input), Err(SocialError::Validation(_))));
        assert!(matches!(f.svc.create_blog("ghost", draft("Oslo")), Err(SocialError::NotFound(_))));
    }

    #[test]
    fn views_count_once_per_viewer() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Rome");

        f.svc.get_blog("ben", &blog.id).unwrap();
        f.svc.get_blog("ben", &blog.id).unwrap();
        let view = f.svc.get_blog("cy", &blog.id).unwrap();
        assert_eq!(view.blog.views, 2);
        assert!(!view.is_liked);
    }

    #[test]
    fn viewer_ids_stay_out_of_the_blog_document() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Rome");
        f.svc.get_blog("secret-viewer", &blog.id).unwrap();

        let stored = serde_json::to_value(f.svc.blogs.get_or_err(&blog.id).unwrap()).unwrap();
        assert!(!stored.to_string().contains("secret-viewer"));
        assert_eq!(stored["views"], 1);
        let viewers = f.svc.viewers.get_or_err(&blog.id).unwrap();
        assert!(viewers.viewers.contains("secret-viewer"));

        f.svc.delete_blog("ana", &blog.id).unwrap();
        assert!(f.svc.viewers.get(&blog.id).unwrap().is_none());
    }

    #[test]
    fn list_filters_and_sorts() {
        let f = fixture();
        f.user("ana");
        let rome = f.blog("ana", "Rome");
        f.clock.advance(Duration::seconds(1));
        let mut beach = draft("Algarve coast");
        beach.destination = "Lagos, Portugal".into();
        beach.category = Some(Category::Beaches);
        beach.is_published = Some(true);
        let beach = f.svc.create_blog("ana", beach).unwrap();
        f.svc.get_blog("ben", &rome.id).unwrap();

        let params = ListParams::default();
        let by_category = BlogFilter { category: Some(Category::Beaches), ..Default::default() };
        let page = f.svc.list_blogs(&by_category, &params).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, beach.id);

        let by_place = BlogFilter { destination: Some("portugal".into()), ..Default::default() };
        assert_eq!(f.svc.list_blogs(&by_place, &params).unwrap().items[0].id, beach.id);

        let oldest_first = BlogFilter { sort_order: SortOrder::Asc, ..Default::default() };
        assert_eq!(f.svc.list_blogs(&oldest_first, &params).unwrap().items[0].id, rome.id);

        let most_viewed = BlogFilter { sort_by: BlogSort::Views, ..Default::default() };
        assert_eq!(f.svc.list_blogs(&most_viewed, &params).unwrap().items[0].id, rome.id);
    }

    #[test]
    fn drafts_are_private() {
        let f = fixture();
        f.user("ana");
        let blog = f.svc.create_blog("ana", draft("Oslo")).unwrap();

        assert!(matches!(f.svc.get_blog("ben", &blog.id), Err(SocialError::NotFound(_))));
        assert!(f.svc.get_blog("ana", &blog.id).is_ok());
        assert_eq!(f.svc.list_blogs(&BlogFilter::default(), &ListParams::default()).unwrap().total, 0);
        assert_eq!(f.svc.list_user_blogs("ana", "ana", &ListParams::default()).unwrap().total, 1);
        assert_eq!(f.svc.list_user_blogs("ben", "ana", &ListParams::default()).unwrap().total, 0);
    }

    #[test]
    fn list_is_newest_first() {
        let f = fixture();
        f.user("ana");
        f.blog("ana", "First");
        f.clock.advance(Duration::seconds(10));
        f.blog("ana", "Second");

        let page = f.svc.list_blogs(&BlogFilter::default(), &ListParams::default()).unwrap();
        let titles: Vec<_> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn only_author_deletes() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Rome");
        assert!(matches!(f.svc.delete_blog("ben", &blog.id), Err(SocialError::Forbidden(_))));
        f.svc.delete_blog("ana", &blog.id).unwrap();
        assert!(matches!(f.svc.get_blog("ana", &blog.id), Err(SocialError::NotFound(_))));
    }

    #[test]
    fn shares_accumulate() {
        let f = fixture();
        f.user("ana");
        let blog = f.blog("ana", "Rome");
        f.svc.share_blog(&blog.id).unwrap();
        assert_eq!(f.svc.share_blog(&blog.id).unwrap(), 2);
    }
}
