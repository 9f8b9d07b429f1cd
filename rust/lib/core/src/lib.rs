pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{require_caller, Authenticator, Caller, Claims, JwtAuthenticator, TrustedHeader, USER_ID_HEADER};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use types::{new_id, ListParams, ListResult, MAX_LIMIT};
