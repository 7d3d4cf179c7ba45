use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use log_service::{
    config::{Config, DatabaseConfig, StorageBackend},
    error::ErrorDetails,
    models::{CreatedResponse, LogRecord, SeverityRecord},
    server::{build_state, create_router},
    storage,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn create_test_app() -> anyhow::Result<Router> {
    let mut config = Config::default();
    config.ingestion.enabled = false;
    config.database = DatabaseConfig {
        backend: StorageBackend::Sqlite,
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 5,
    };

    let storage = storage::connect(&config.database).await?;
    let (state, _) = build_state(storage, &config);
    Ok(create_router(state, &config, None))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, location, bytes.to_vec())
}

async fn create_severity(app: &Router, name: &str, description: &str) -> i64 {
    let (status, _, body) = send(
        app,
        "POST",
        "/severities",
        Some(json!({ "name": name, "description": description })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice::<CreatedResponse<i64>>(&body).unwrap().id
}

async fn create_log(app: &Router, message: &str, severity: &str) -> Uuid {
    let (status, _, body) = send(
        app,
        "POST",
        "/logs",
        Some(json!({ "message": message, "severityName": severity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice::<CreatedResponse<Uuid>>(&body).unwrap().id
}

fn error_body(body: &[u8]) -> ErrorDetails {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_end_to_end_log_lifecycle() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, location, body) = send(
        &app,
        "POST",
        "/severities",
        Some(json!({ "name": "Test name", "description": "Test description" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let severity_id = serde_json::from_slice::<CreatedResponse<i64>>(&body)?.id;
    assert!(severity_id >= 1);
    assert_eq!(location, Some(format!("/severities/{}", severity_id)));

    let (status, location, body) = send(
        &app,
        "POST",
        "/logs",
        Some(json!({ "message": "Test message", "severityName": "Test name" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let log_id = serde_json::from_slice::<CreatedResponse<Uuid>>(&body)?.id;
    assert!(!log_id.is_nil());
    assert_eq!(location, Some(format!("/logs/{}", log_id)));

    let (status, _, body) = send(&app, "GET", &format!("/logs/{}", log_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let record: LogRecord = serde_json::from_slice(&body)?;
    assert_eq!(record.id, log_id);
    assert_eq!(record.message, "Test message");
    assert_eq!(record.severity_name.as_deref(), Some("Test name"));

    let (status, _, _) = send(&app, "DELETE", &format!("/logs/{}", log_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = send(&app, "GET", &format!("/logs/{}", log_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error = error_body(&body);
    assert_eq!(error.status_code, 404);
    assert_eq!(error.message, "Log not found.");
    assert_eq!(error.details, "Cannot find log with given id.");

    Ok(())
}

#[tokio::test]
async fn test_null_body_is_rejected() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, _, body) = send(&app, "POST", "/logs", Some(Value::Null)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = error_body(&body);
    assert_eq!(error.message, "Incoming creation DTO model is null.");
    assert_eq!(error.details, "Incoming creation DTO model cannot be null.");

    let id = create_severity(&app, "Info", "Routine").await;
    let (status, _, body) = send(&app, "PUT", &format!("/severities/{}", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body).message, "Incoming updation DTO model is null.");

    Ok(())
}

#[tokio::test]
async fn test_validation_errors_list_every_field() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, _, body) = send(&app, "POST", "/logs", Some(json!({ "message": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = error_body(&body);
    assert_eq!(error.message, "Incoming creation DTO model isn't valid.");
    assert_eq!(
        error.details,
        "'Message' must not be empty.\n'Severity Name' must not be empty."
    );

    let (status, _, body) = send(
        &app,
        "POST",
        "/logs",
        Some(json!({ "message": "x", "severityName": "Missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body).message, "Severity not found.");

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_rejected() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/severities")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(error_body(&bytes).message, "Incoming request body isn't valid.");

    Ok(())
}

#[tokio::test]
async fn test_invalid_ids() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, _, body) = send(&app, "GET", "/logs/not-a-guid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&body).message, "Id isn't valid.");

    let (status, _, body) = send(&app, "GET", &format!("/logs/{}", Uuid::nil()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = error_body(&body);
    assert_eq!(error.message, "Id is empty.");
    assert_eq!(error.details, "Searchable log cannot be found because id is empty.");

    for uri in ["/severities/0", "/severities/-4", "/severities/abc", "/severities/0/logs"] {
        let (status, _, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            error_body(&body).details,
            "Searchable severity cannot be found because id isn't valid."
        );
    }

    let (status, _, body) = send(&app, "DELETE", "/severities/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error = error_body(&body);
    assert_eq!(error.message, "Severity not found.");
    assert_eq!(error.details, "Cannot find severity with given id.");

    Ok(())
}

#[tokio::test]
async fn test_update_with_same_severity_keeps_reference() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    create_severity(&app, "Warning", "Potential problem").await;
    let log_id = create_log(&app, "first", "Warning").await;

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/logs/{}", log_id),
        Some(json!({ "message": "second", "severityName": "Warning" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(&app, "GET", &format!("/logs/{}", log_id), None).await;
    let record: LogRecord = serde_json::from_slice(&body)?;
    assert_eq!(record.message, "second");
    assert_eq!(record.severity_name.as_deref(), Some("Warning"));

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/logs/{}", Uuid::new_v4()),
        Some(json!({ "message": "x", "severityName": "Warning" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_severity_crud_and_logs() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    let error_id = create_severity(&app, "Error", "Failure").await;
    let info_id = create_severity(&app, "Info", "Routine").await;

    create_log(&app, "boom", "Error").await;
    create_log(&app, "crash", "Error").await;
    create_log(&app, "hello", "Info").await;

    let uri = format!("/severities/{}/logs", error_id);
    let (status, _, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let logs: Vec<LogRecord> = serde_json::from_slice(&body)?;
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.severity_name.as_deref() == Some("Error")));

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/severities/{}", info_id),
        Some(json!({ "name": "Information", "description": "Routine event" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(&app, "GET", &format!("/severities/{}", info_id), None).await;
    let severity: SeverityRecord = serde_json::from_slice(&body)?;
    assert_eq!(severity.name, "Information");

    let (status, _, _) = send(&app, "DELETE", &format!("/severities/{}", error_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(&app, "GET", "/severities", None).await;
    let severities: Vec<SeverityRecord> = serde_json::from_slice(&body)?;
    assert_eq!(severities.len(), 1);

    // logs of a deleted severity survive without a severity name
    let (_, _, body) = send(&app, "GET", "/logs", None).await;
    let logs: Vec<LogRecord> = serde_json::from_slice(&body)?;
    assert_eq!(logs.len(), 3);
    assert_eq!(logs.iter().filter(|l| l.severity_name.is_none()).count(), 2);
    assert_eq!(
        logs.iter()
            .filter(|l| l.severity_name.as_deref() == Some("Information"))
            .count(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_has_error_body() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, _, body) = send(&app, "GET", "/nothing/here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_body(&body).status_code, 404);

    Ok(())
}

#[tokio::test]
async fn test_framework_rejections_have_error_body() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, _, body) = send(&app, "PATCH", "/logs", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let error = error_body(&body);
    assert_eq!(error.status_code, 405);
    assert_eq!(error.message, "Method not allowed.");

    let (status, _, body) = send(&app, "GET", "/severities/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = error_body(&body);
    assert_eq!(error.status_code, 400);
    assert!(error.details.contains("Invalid URL"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/severities")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(vec![b'a'; 2 * 1024 * 1024]))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let error = error_body(&bytes);
    assert_eq!(error.status_code, 413);
    assert_eq!(error.message, "Request body is too large.");

    Ok(())
}
