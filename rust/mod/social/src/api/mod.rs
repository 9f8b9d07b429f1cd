mod blogs;
mod feed;
mod groups;
mod polls;
mod users;

use std::sync::Arc;

use axum::Router;

use tripvisor_core::Authenticator;

use crate::service::SocialService;

/// Shared application state.
pub type AppState = Arc<SocialService>;

/// Build the complete social API router.
///
/// All routes are relative; the binary nests them under `/social`. Every
/// route requires a caller, resolved by `auth`.
pub fn build_router(svc: Arc<SocialService>, auth: Arc<dyn Authenticator>) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(feed::routes())
        .merge(blogs::routes())
        .merge(polls::routes())
        .merge(groups::routes())
        .layer(axum::middleware::from_fn_with_state(
            auth,
            tripvisor_core::require_caller,
        ))
        .with_state(svc)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use tripvisor_core::{TrustedHeader, USER_ID_HEADER};
    use tripvisor_kv::{KVStore, RedbStore};

    use crate::service::{SocialConfig, SocialService};

    pub struct Harness {
        pub router: Router,
        _dir: tempfile::TempDir,
    }

    pub fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("api.redb")).unwrap());
        let svc = SocialService::new(kv, SocialConfig::default());
        Harness {
            router: super::build_router(svc, Arc::new(TrustedHeader)),
            _dir: dir,
        }
    }

    impl Harness {
        /// Send a request as `user` (or anonymously) and decode the JSON body.
        pub async fn call(
            &self,
            method: Method,
            uri: &str,
            user: Option<&str>,
            body: Option<serde_json::Value>,
        ) -> (StatusCode, serde_json::Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                req = req.header(USER_ID_HEADER, user);
            }
            let req = match body {
                Some(b) => req
                    .header("content-type", "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };

            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        pub async fn register(&self, user: &str) {
            let (status, _) = self
                .call(
                    Method::POST,
                    "/users/me",
                    Some(user),
                    Some(serde_json::json!({ "displayName": user })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }
}
