use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use tripvisor_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{CastVote, CreatePoll, Poll, PollResults};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/blogs/{id}/poll",
            get(poll_results).post(create_poll).delete(delete_poll),
        )
        .route("/blogs/{id}/poll/vote", post(vote))
        .route("/blogs/{id}/poll/end", put(end_poll))
}

async fn create_poll(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<CreatePoll>,
) -> Result<(StatusCode, Json<Poll>), ServiceError> {
    let poll = svc.create_poll(&id, &caller.user_id, input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(poll)))
}

async fn poll_results(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<PollResults>, ServiceError> {
    let results = svc.poll_results(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(Json(results))
}

/// POST /blogs/{id}/poll/vote: `{"optionIndex": n}`.
async fn vote(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(input): Json<CastVote>,
) -> Result<Json<PollResults>, ServiceError> {
    let results = svc
        .vote(&id, &caller.user_id, input.option_index)
        .map_err(ServiceError::from)?;
    Ok(Json(results))
}

async fn end_poll(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<PollResults>, ServiceError> {
    let results = svc.end_poll(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(Json(results))
}

async fn delete_poll(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_poll(&id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
