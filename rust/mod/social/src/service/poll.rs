use tracing::info;

use super::{SocialError, SocialService};
use crate::model::{Blog, CreatePoll, Poll, PollError, PollResults};

fn no_poll(blog_id: &str) -> SocialError {
    SocialError::NotFound(format!("blog '{}' has no poll", blog_id))
}

fn author_only(blog: &Blog, actor: &str) -> Result<(), SocialError> {
    if blog.author != actor {
        return Err(SocialError::Forbidden("only the blog author can manage its poll".into()));
    }
    Ok(())
}

impl SocialService {
    /// Attach a poll to a blog. A blog carries at most one poll; the check
    /// and the write happen in the same conditional update.
    pub fn create_poll(&self, blog_id: &str, actor: &str, input: CreatePoll) -> Result<Poll, SocialError> {
        let now = self.now();
        let (_, poll) = self.blogs.update(blog_id, |blog| {
            author_only(blog, actor)?;
            let poll = Poll::new(input.clone(), now)?;
            if blog.poll.is_some() {
                return Err(SocialError::Conflict("this blog already has a poll".into()));
            }
            blog.poll = Some(poll.clone());
            Ok(poll)
        })?;

        info!("poll created on blog {} with {} options", blog_id, poll.options.len());
        Ok(poll)
    }

    /// Cast `user`'s vote. If the poll's end time has passed, the poll is
    /// closed and saved before NotActive is returned.
    pub fn vote(&self, blog_id: &str, user: &str, option_index: i64) -> Result<PollResults, SocialError> {
        let index = usize::try_from(option_index)
            .map_err(|_| SocialError::Validation("a valid option index is required".into()))?;
        let now = self.now();

        let (blog, outcome) = self.blogs.update(blog_id, |blog| {
            let poll = blog.poll.as_mut().ok_or_else(|| no_poll(blog_id))?;
            Ok::<_, SocialError>(poll.vote(user, index, now))
        })?;

        if let Err(e) = outcome {
            if e == PollError::Expired {
                info!("poll on blog {} expired, closed on vote", blog_id);
            }
            return Err(e.into());
        }

        let poll = blog.poll.as_ref().ok_or_else(|| no_poll(blog_id))?;
        Ok(poll.results(Some(user)))
    }

    pub fn poll_results(&self, blog_id: &str, viewer: &str) -> Result<PollResults, SocialError> {
        let blog = self.blogs.get_or_err(blog_id)?;
        let poll = blog.poll.as_ref().ok_or_else(|| no_poll(blog_id))?;
        Ok(poll.results(Some(viewer)))
    }

    /// Close the poll to new votes. Ending an ended poll is not an error.
    pub fn end_poll(&self, blog_id: &str, actor: &str) -> Result<PollResults, SocialError> {
        let (blog, _) = self.blogs.update(blog_id, |blog| {
            if blog.poll.is_none() {
                return Err(no_poll(blog_id));
            }
            author_only(blog, actor)?;
            if let Some(poll) = blog.poll.as_mut() {
                poll.end();
            }
            Ok(())
        })?;

        info!("poll on blog {} ended by {}", blog_id, actor);
        let poll = blog.poll.as_ref().ok_or_else(|| no_poll(blog_id))?;
        Ok(poll.results(Some(actor)))
    }

    pub fn delete_poll(&self, blog_id: &str, actor: &str) -> Result<(), SocialError> {
        self.blogs.update(blog_id, |blog| {
            if blog.poll.is_none() {
                return Err(no_poll(blog_id));
            }
            author_only(blog, actor)?;
            blog.poll = None;
            Ok(())
        })?;

        info!("poll on blog {} deleted by {}", blog_id, actor);
        Ok(())
    }
}
