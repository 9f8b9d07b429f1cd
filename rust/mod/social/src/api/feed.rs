use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use tripvisor_core::{Caller, ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{ActivityItem, Blog, Reaction};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(feed))
        .route("/favorites", get(list_favorites))
        .route("/favorites/{blog_id}", post(toggle_favorite))
}

/// GET /feed: blogs and group activity from the caller's circle.
async fn feed(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<ActivityItem>>, ServiceError> {
    let page = svc.build_feed(&caller.user_id, &params).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn list_favorites(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Blog>>, ServiceError> {
    let page = svc.list_favorites(&caller.user_id, &params).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn toggle_favorite(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(blog_id): Path<String>,
) -> Result<Json<Reaction>, ServiceError> {
    let r = svc.toggle_favorite(&caller.user_id, &blog_id).map_err(ServiceError::from)?;
    Ok(Json(r))
}
