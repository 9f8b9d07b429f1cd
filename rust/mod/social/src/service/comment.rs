use tracing::info;

use tripvisor_core::new_id;

use super::{required, SocialError, SocialService};
use crate::model::Comment;

impl SocialService {
    /// Append a comment to a blog. Content is stored trimmed.
    pub fn add_comment(&self, blog_id: &str, author: &str, content: &str) -> Result<Comment, SocialError> {
        let content = required("comment content", content)?;
        let comment = Comment {
            id: new_id(),
            author: author.to_string(),
            content,
            created_at: self.now(),
        };

        self.blogs.update(blog_id, |blog| {
            blog.comments.push(comment.clone());
            Ok::<_, SocialError>(())
        })?;

        info!("comment {} added to blog {} by {}", comment.id, blog_id, author);
        Ok(comment)
    }

    /// Remove a comment. Only its author may delete it.
    pub fn delete_comment(&self, blog_id: &str, comment_id: &str, actor: &str) -> Result<(), SocialError> {
        self.blogs.update(blog_id, |blog| {
            let comment = blog
                .comment(comment_id)
                .ok_or_else(|| SocialError::NotFound(format!("comment '{}' not found", comment_id)))?;
            if comment.author != actor {
                return Err(SocialError::Forbidden("you can only delete your own comments".into()));
            }
            blog.comments.retain(|c| c.id != comment_id);
            Ok(())
        })?;

        info!("comment {} deleted from blog {} by {}", comment_id, blog_id, actor);
        Ok(())
    }
}
