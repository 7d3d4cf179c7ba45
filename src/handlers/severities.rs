//! /severities endpoints

use super::{parse_body, AppState, BodyKind};
use crate::error::AppError;
use crate::models::{
    CreateSeverityRequest, CreatedResponse, LogRecord, SeverityRecord, UpdateSeverityRequest,
};
use crate::services::severity_service::parse_severity_id;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

pub fn severity_routes() -> Router<AppState> {
    Router::new()
        .route("/severities", get(list_severities).post(create_severity))
        .route(
            "/severities/:id",
            get(get_severity).put(update_severity).delete(delete_severity),
        )
        .route("/severities/:id/logs", get(get_severity_logs))
}

/// GET /severities
async fn list_severities(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeverityRecord>>, AppError> {
    Ok(Json(state.severities.get_all().await?))
}

/// GET /severities/:id
async fn get_severity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeverityRecord>, AppError> {
    let id = parse_severity_id(&id)?;
    Ok(Json(state.severities.get(id).await?))
}

/// POST /severities
async fn create_severity(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: CreateSeverityRequest = parse_body(&body, BodyKind::Creation)?;
    let id = state.severities.create(request).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/severities/{}", id))],
        Json(CreatedResponse { id }),
    ))
}

/// PUT /severities/:id
async fn update_severity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let id = parse_severity_id(&id)?;
    let request: UpdateSeverityRequest = parse_body(&body, BodyKind::Updation)?;

    state.severities.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /severities/:id
async fn delete_severity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_severity_id(&id)?;

    state.severities.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /severities/:id/logs
async fn get_severity_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LogRecord>>, AppError> {
    let id = parse_severity_id(&id)?;
    Ok(Json(state.severities.get_logs(id).await?))
}
