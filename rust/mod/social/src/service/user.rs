use tracing::info;

use tripvisor_core::{ListParams, ListResult, ServiceError};

use super::{bounded, required, SocialError, SocialService};
use crate::model::{RegisterUser, User, UserProfile, UserSummary};

const MAX_DISPLAY_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 500;

impl SocialService {
    /// Find-or-create the caller's user record. Registering twice returns
    /// the existing record unchanged. The flag is true if this call created it.
    pub fn register_user(&self, user_id: &str, input: RegisterUser) -> Result<(User, bool), SocialError> {
        let display_name = bounded("display name", &input.display_name, MAX_DISPLAY_NAME_LEN)?;
        let bio = match input.bio.as_deref().map(str::trim) {
            Some(b) if b.chars().count() > MAX_BIO_LEN => {
                return Err(SocialError::Validation(format!(
                    "bio must be at most {} characters",
                    MAX_BIO_LEN
                )));
            }
            Some(b) if !b.is_empty() => Some(b.to_string()),
            _ => None,
        };

        match self.users.insert(User::new(user_id, display_name, bio)) {
            Ok(user) => {
                info!("registered user {}", user.id);
                Ok((user, true))
            }
            Err(ServiceError::Conflict(_)) => Ok((self.users.get_or_err(user_id)?, false)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, user_id: &str) -> Result<User, SocialError> {
        Ok(self.users.get_or_err(user_id)?)
    }

    /// Public profile of `user_id` as seen by `viewer`.
    pub fn get_profile(&self, viewer: &str, user_id: &str) -> Result<UserProfile, SocialError> {
        let user = self.users.get_or_err(user_id)?;

        let blogs_count = self
            .blogs
            .list()?
            .iter()
            .filter(|b| b.author == user.id && b.is_published)
            .count();
        let groups_count = self
            .groups
            .list()?
            .iter()
            .filter(|g| g.is_active && g.is_member(&user.id))
            .count();

        Ok(UserProfile {
            is_following: user.followers.contains(viewer),
            followers_count: user.followers.len(),
            following_count: user.following.len(),
            blogs_count,
            groups_count,
            id: user.id,
            display_name: user.display_name,
            bio: user.bio,
            created_at: user.created_at,
        })
    }

    /// Users whose display name contains `query`, case-insensitively,
    /// ordered by display name.
    pub fn search_users(&self, query: &str, params: &ListParams) -> Result<ListResult<UserSummary>, SocialError> {
        let query = required("search query", query)?.to_lowercase();
        let found = self.users.find_by(
            |u| u.display_name.to_lowercase().contains(&query),
            |a, b| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            },
            params.offset(),
            params.limit(),
        )?;
        let items = found.items.iter().map(User::summary).collect();
        Ok(ListResult::new(items, found.total, params))
    }
}
