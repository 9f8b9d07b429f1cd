//! Caller identity.
//!
//! Modules never verify credentials themselves. They see a [`Caller`]
//! placed into the request extensions by [`require_caller`], which
//! delegates to whichever [`Authenticator`] the binary injected.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Header read by [`TrustedHeader`].
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Resolves request headers to a stable user id.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, ServiceError>;
}

/// JWT claims payload. Only `sub` (the user id) and `exp` are required;
/// tokens are issued by an external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    /// Issued at (unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Validates `Authorization: Bearer <jwt>` signed with a shared HS256 secret.
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, ServiceError> {
        let token = extract_bearer(headers)
            .ok_or_else(|| ServiceError::Unauthorized("missing authorization token".into()))?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(ServiceError::Unauthorized("token has no subject".into()));
        }
        Ok(Caller::new(data.claims.sub))
    }
}

/// Trusts the `x-user-id` header as-is. For deployments behind a gateway
/// that has already authenticated the request, and for tests.
pub struct TrustedHeader;

impl Authenticator for TrustedHeader {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, ServiceError> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Caller::new)
            .ok_or_else(|| ServiceError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))
    }
}

/// Extract the Bearer token from the Authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware that rejects unauthenticated requests with 401 and stores
/// the [`Caller`] in request extensions for handlers to extract via
/// `Extension<Caller>`.
pub async fn require_caller(
    State(auth): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let caller = auth.authenticate(request.headers())?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
