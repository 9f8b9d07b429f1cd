//! Social module: follows, reactions, blogs, polls, groups and the activity feed.
//!
//! # Resources
//!
//! - **User**: profile plus follower/following edges and favorites
//! - **Blog**: travel post owning its comments, likes and at most one poll
//! - **Group**: members, admins and a discussion board with replies
//!
//! Every rule that spans a read and a write (one vote per user, one poll
//! per blog, member caps, both halves of a follow edge) is checked inside
//! a conditional document update, so concurrent requests cannot break it.
//!
//! # Usage
//!
//! ```ignore
//! use social::{SocialModule, service::SocialConfig};
//!
//! let module = SocialModule::new(kv, SocialConfig::default(), authenticator);
//! let router = module.routes(); // Mount under /social
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use tripvisor_core::{Authenticator, Module};
use tripvisor_kv::KVStore;

use crate::service::{SocialConfig, SocialService};

/// Social module implementing the Module trait.
pub struct SocialModule {
    service: Arc<SocialService>,
    authenticator: Arc<dyn Authenticator>,
}

impl SocialModule {
    pub fn new(kv: Arc<dyn KVStore>, config: SocialConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service: SocialService::new(kv, config),
            authenticator,
        }
    }

    /// Get a reference to the underlying SocialService.
    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone(), self.authenticator.clone())
    }
}
