//! /logs endpoints

use super::{parse_body, AppState, BodyKind};
use crate::error::AppError;
use crate::models::{CreateLogRequest, CreatedResponse, LogRecord, UpdateLogRequest};
use crate::services::log_service::parse_log_id;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs).post(create_log))
        .route("/logs/:id", get(get_log).put(update_log).delete(delete_log))
}

/// GET /logs
async fn list_logs(State(state): State<AppState>) -> Result<Json<Vec<LogRecord>>, AppError> {
    Ok(Json(state.logs.get_all().await?))
}

/// GET /logs/:id
async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LogRecord>, AppError> {
    let id = parse_log_id(&id)?;
    Ok(Json(state.logs.get(id).await?))
}

/// POST /logs
async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: CreateLogRequest = parse_body(&body, BodyKind::Creation)?;
    let id = state.logs.create(request).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/logs/{}", id))],
        Json(CreatedResponse { id }),
    ))
}

/// PUT /logs/:id
async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let id = parse_log_id(&id)?;
    let request: UpdateLogRequest = parse_body(&body, BodyKind::Updation)?;

    state.logs.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /logs/:id
async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_log_id(&id)?;

    state.logs.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
