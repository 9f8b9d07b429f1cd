use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use tripvisor_core::{Caller, ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{
    CreateGroup, Discussion, Group, GroupFilter, GroupView, NewContent, NewDiscussion, Reaction, Reply,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/my-groups", get(my_groups))
        .route("/groups/user/{user_id}", get(user_groups))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/join", post(join_group))
        .route("/groups/{id}/leave", post(leave_group))
        .route("/groups/{id}/discussions", post(add_discussion))
        .route("/groups/{id}/discussions/{did}", delete(delete_discussion))
        .route("/groups/{id}/discussions/{did}/like", post(toggle_discussion_like))
        .route("/groups/{id}/discussions/{did}/replies", post(add_reply))
        .route("/groups/{id}/discussions/{did}/replies/{rid}", delete(delete_reply))
}

async fn create_group(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<Group>), ServiceError> {
    let group = svc.create_group(&caller.user_id, input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /groups?category=&search=
async fn list_groups(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<GroupFilter>,
) -> Result<Json<ListResult<Group>>, ServiceError> {
    let page = svc.list_groups(&filter, &params).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn my_groups(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Group>>, ServiceError> {
    let page = svc
        .list_member_groups(&caller.user_id, &caller.user_id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn user_groups(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Group>>, ServiceError> {
    let page = svc
        .list_member_groups(&caller.user_id, &user_id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn get_group(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<GroupView>, ServiceError> {
    let view = svc.get_group(&caller.user_id, &id).map_err(ServiceError::from)?;
    Ok(Json(view))
}

async fn join_group(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Group>, ServiceError> {
    let group = svc.join_group(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(Json(group))
}

async fn leave_group(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Group>, ServiceError> {
    let group = svc.leave_group(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(Json(group))
}

async fn add_discussion(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<NewDiscussion>,
) -> Result<(StatusCode, Json<Discussion>), ServiceError> {
    let discussion = svc
        .add_discussion(&id, &caller.user_id, input)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(discussion)))
}

async fn delete_discussion(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, did)): Path<(String, String)>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_discussion(&id, &did, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_discussion_like(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, did)): Path<(String, String)>,
) -> Result<Json<Reaction>, ServiceError> {
    let r = svc
        .toggle_discussion_like(&id, &did, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(r))
}

async fn add_reply(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, did)): Path<(String, String)>,
    Json(input): Json<NewContent>,
) -> Result<(StatusCode, Json<Reply>), ServiceError> {
    let reply = svc
        .add_reply(&id, &did, &caller.user_id, &input.content)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(reply)))
}

async fn delete_reply(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, did, rid)): Path<(String, String, String)>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_reply(&id, &did, &rid, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
