pub mod blog;
pub mod comment;
pub mod feed;
pub mod group;
pub mod membership;
pub mod poll;
pub mod reaction;
pub mod user;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use tripvisor_core::{Clock, ServiceError, SystemClock};
use tripvisor_kv::KVStore;
use tripvisor_store::{DocOps, DEFAULT_MAX_ATTEMPTS};

use crate::model::{Blog, BlogViewers, Group, PollError, User};

/// Social service error type.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("you cannot follow yourself")]
    SelfReference,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("you have already voted on this poll")]
    AlreadyVoted,

    #[error("invalid option index {index}: poll has {options} options")]
    InvalidOption { index: usize, options: usize },

    #[error("{0}")]
    NotActive(String),

    #[error(transparent)]
    Store(ServiceError),
}

impl From<ServiceError> for SocialError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(m) => SocialError::NotFound(m),
            ServiceError::Validation(m) => SocialError::Validation(m),
            ServiceError::Forbidden(m) => SocialError::Forbidden(m),
            ServiceError::Conflict(m) => SocialError::Conflict(m),
            ServiceError::NotActive(m) => SocialError::NotActive(m),
            other => SocialError::Store(other),
        }
    }
}

impl From<PollError> for SocialError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::Invalid(m) => SocialError::Validation(m),
            PollError::Closed | PollError::Expired => SocialError::NotActive(e.to_string()),
            PollError::InvalidOption { index, options } => SocialError::InvalidOption { index, options },
            PollError::AlreadyVoted => SocialError::AlreadyVoted,
        }
    }
}

impl From<SocialError> for ServiceError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::NotFound(m) => ServiceError::NotFound(m),
            SocialError::Validation(m) => ServiceError::Validation(m),
            SocialError::SelfReference | SocialError::InvalidOption { .. } => {
                ServiceError::Validation(e.to_string())
            }
            SocialError::Forbidden(m) => ServiceError::Forbidden(m),
            SocialError::Conflict(m) => ServiceError::Conflict(m),
            SocialError::AlreadyVoted => ServiceError::Conflict(e.to_string()),
            SocialError::NotActive(m) => ServiceError::NotActive(m),
            SocialError::Store(inner) => inner,
        }
    }
}

/// Configuration for the social service.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    /// Member cap for groups created without an explicit one (default: 1000).
    pub max_group_members: usize,
    /// Optimistic write attempts per operation before reporting Conflict (default: 8).
    pub update_attempts: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            max_group_members: 1000,
            update_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// The social service. Stateless apart from its storage handles: every
/// invariant is checked and written inside one conditional document update.
pub struct SocialService {
    pub(crate) users: DocOps<User>,
    pub(crate) blogs: DocOps<Blog>,
    pub(crate) viewers: DocOps<BlogViewers>,
    pub(crate) groups: DocOps<Group>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: SocialConfig,
}

impl SocialService {
    pub fn new(kv: Arc<dyn KVStore>, config: SocialConfig) -> Arc<Self> {
        Self::with_clock(kv, Arc::new(SystemClock), config)
    }

    pub fn with_clock(kv: Arc<dyn KVStore>, clock: Arc<dyn Clock>, config: SocialConfig) -> Arc<Self> {
        let attempts = config.update_attempts;
        Arc::new(Self {
            users: DocOps::new(Arc::clone(&kv), Arc::clone(&clock)).with_max_attempts(attempts),
            blogs: DocOps::new(Arc::clone(&kv), Arc::clone(&clock)).with_max_attempts(attempts),
            viewers: DocOps::new(Arc::clone(&kv), Arc::clone(&clock)).with_max_attempts(attempts),
            groups: DocOps::new(kv, Arc::clone(&clock)).with_max_attempts(attempts),
            clock,
            config,
        })
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Trimmed, non-empty text.
pub(crate) fn required(field: &str, value: &str) -> Result<String, SocialError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SocialError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trimmed, non-empty text of at most `max_len` characters.
pub(crate) fn bounded(field: &str, value: &str, max_len: usize) -> Result<String, SocialError> {
    let value = required(field, value)?;
    if value.chars().count() > max_len {
        return Err(SocialError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value)
}
