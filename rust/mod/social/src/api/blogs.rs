use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use tripvisor_core::{Caller, ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{Blog, BlogFilter, BlogView, Comment, CreateBlog, NewContent, Reaction};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs).post(create_blog))
        .route("/blogs/{id}", get(get_blog).delete(delete_blog))
        .route("/users/{id}/blogs", get(list_user_blogs))
        .route("/blogs/{id}/like", post(toggle_like))
        .route("/blogs/{id}/share", post(share))
        .route("/blogs/{id}/comments", post(add_comment))
        .route("/blogs/{id}/comments/{comment_id}", delete(delete_comment))
}

async fn create_blog(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateBlog>,
) -> Result<(StatusCode, Json<Blog>), ServiceError> {
    let blog = svc.create_blog(&caller.user_id, input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// GET /blogs?category=&destination=&search=&sortBy=&sortOrder=
async fn list_blogs(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<BlogFilter>,
) -> Result<Json<ListResult<Blog>>, ServiceError> {
    let page = svc.list_blogs(&filter, &params).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn get_blog(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<BlogView>, ServiceError> {
    let view = svc.get_blog(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(Json(view))
}

async fn delete_blog(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_blog(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_user_blogs(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Blog>>, ServiceError> {
    let page = svc
        .list_user_blogs(&caller.user_id, &id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn toggle_like(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Reaction>, ServiceError> {
    let r = svc.toggle_blog_like(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(Json(r))
}

async fn share(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let shares = svc.share_blog(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "shares": shares })))
}

async fn add_comment(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<NewContent>,
) -> Result<(StatusCode, Json<Comment>), ServiceError> {
    let comment = svc
        .add_comment(&id, &caller.user_id, &input.content)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_comment(&id, &comment_id, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
