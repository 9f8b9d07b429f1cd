use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use tripvisor_core::{Caller, ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{FollowOutcome, MutualStatus, RegisterUser, User, UserProfile, UserSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).post(register))
        .route("/users/search", get(search_users))
        .route("/users/{id}", get(get_profile))
        .route("/users/{id}/follow", post(toggle_follow))
        .route("/users/{id}/mutual-status", get(mutual_status))
        .route("/users/{id}/followers", get(list_followers))
        .route("/users/{id}/following", get(list_following))
}

/// POST /users/me: create the caller's profile (201), or return the
/// existing one (200).
async fn register(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let (user, created) = svc.register_user(&caller.user_id, input).map_err(ServiceError::from)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(user)))
}

async fn me(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserProfile>, ServiceError> {
    let profile = svc
        .get_profile(&caller.user_id, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// GET /users/search?q=
async fn search_users(
    State(svc): State<AppState>,
    Query(search): Query<SearchQuery>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<UserSummary>>, ServiceError> {
    let page = svc.search_users(&search.q, &params).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn get_profile(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ServiceError> {
    let profile = svc.get_profile(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(Json(profile))
}

async fn toggle_follow(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<FollowOutcome>, ServiceError> {
    let outcome = svc.toggle_follow(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(Json(outcome))
}

/// GET /users/{id}/mutual-status: `aFollowsB` is the caller following `id`.
async fn mutual_status(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<MutualStatus>, ServiceError> {
    let status = svc.mutual_status(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(Json(status))
}

async fn list_followers(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<UserSummary>>, ServiceError> {
    let page = svc
        .list_followers(&caller.user_id, &id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn list_following(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<UserSummary>>, ServiceError> {
    let page = svc
        .list_following(&caller.user_id, &id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(page))
}
