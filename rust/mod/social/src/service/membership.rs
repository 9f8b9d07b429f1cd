use tracing::info;

use tripvisor_core::{ListParams, ListResult};

use super::{SocialError, SocialService};
use crate::model::{FollowOutcome, MutualStatus, User, UserSummary};

/// Which direction of the follow graph a list request reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Followers,
    Following,
}

impl SocialService {
    /// Create the edge `actor -> target`. Conflict if it already exists.
    pub fn follow(&self, actor: &str, target: &str) -> Result<FollowOutcome, SocialError> {
        self.set_follow(actor, target, Some(true))
    }

    /// Remove the edge `actor -> target`. Conflict if it does not exist.
    pub fn unfollow(&self, actor: &str, target: &str) -> Result<FollowOutcome, SocialError> {
        self.set_follow(actor, target, Some(false))
    }

    /// Flip the edge `actor -> target`.
    pub fn toggle_follow(&self, actor: &str, target: &str) -> Result<FollowOutcome, SocialError> {
        self.set_follow(actor, target, None)
    }

    /// Both halves of the edge are written in one pair update, so the
    /// followers/following projections never disagree.
    fn set_follow(&self, actor: &str, target: &str, want: Option<bool>) -> Result<FollowOutcome, SocialError> {
        if actor == target {
            return Err(SocialError::SelfReference);
        }

        let (_, _, outcome) = self.users.update_pair(actor, target, |a: &mut User, t: &mut User| {
            let current = a.follows(&t.id);
            let next = match want {
                Some(true) if current => {
                    return Err(SocialError::Conflict(format!("already following {}", t.id)));
                }
                Some(false) if !current => {
                    return Err(SocialError::Conflict(format!("not following {}", t.id)));
                }
                Some(w) => w,
                None => !current,
            };

            if next {
                a.following.insert(t.id.clone());
                t.followers.insert(a.id.clone());
            } else {
                a.following.remove(&t.id);
                t.followers.remove(&a.id);
            }

            Ok(FollowOutcome {
                is_following: next,
                followers_count: t.followers.len(),
                following_count: a.following.len(),
            })
        })?;

        info!(
            "{} {} {}",
            actor,
            if outcome.is_following { "followed" } else { "unfollowed" },
            target
        );
        Ok(outcome)
    }

    /// Directional follow flags between `a` and `b`. Pure read.
    pub fn mutual_status(&self, a: &str, b: &str) -> Result<MutualStatus, SocialError> {
        let a = self.users.get_or_err(a)?;
        let b = self.users.get_or_err(b)?;
        Ok(MutualStatus::between(&a, &b))
    }

    /// Followers of `target`. Visible to `target` and to users in a mutual
    /// follow with `target`; everyone else gets Forbidden.
    pub fn list_followers(
        &self,
        viewer: &str,
        target: &str,
        params: &ListParams,
    ) -> Result<ListResult<UserSummary>, SocialError> {
        self.list_side(viewer, target, Side::Followers, params)
    }

    /// Users `target` follows. Same visibility rule as [`Self::list_followers`].
    pub fn list_following(
        &self,
        viewer: &str,
        target: &str,
        params: &ListParams,
    ) -> Result<ListResult<UserSummary>, SocialError> {
        self.list_side(viewer, target, Side::Following, params)
    }

    fn list_side(
        &self,
        viewer: &str,
        target: &str,
        side: Side,
        params: &ListParams,
    ) -> Result<ListResult<UserSummary>, SocialError> {
        let target = self.users.get_or_err(target)?;
        self.ensure_visible(viewer, &target, side)?;

        let ids: Vec<String> = match side {
            Side::Followers => target.followers.iter().cloned().collect(),
            Side::Following => target.following.iter().cloned().collect(),
        };
        let page = ListResult::paginate(ids, params);

        let mut items = Vec::with_capacity(page.items.len());
        for id in &page.items {
            if let Some(user) = self.users.get(id)? {
                items.push(user.summary());
            }
        }
        Ok(ListResult {
            items,
            total_pages: page.total_pages,
            current_page: page.current_page,
            total: page.total,
        })
    }

    /// Recomputed on every request; nothing about visibility is cached.
    fn ensure_visible(&self, viewer: &str, target: &User, side: Side) -> Result<(), SocialError> {
        if viewer == target.id {
            return Ok(());
        }
        let mutual = match self.users.get(viewer)? {
            Some(v) => MutualStatus::between(&v, target).is_mutual,
            None => false,
        };
        if mutual {
            return Ok(());
        }
        let what = match side {
            Side::Followers => "followers",
            Side::Following => "following",
        };
        Err(SocialError::Forbidden(format!(
            "you can only view {} of users you mutually follow",
            what
        )))
    }
}
