//! Top of the request pipeline
//!
//! Every error leaving the router carries the same `{statusCode,message,details}`
//! body. Panics are turned into that body by [`handle_panic`]; the middleware
//! logs the underlying failure of a 500 and, in development, replaces the
//! generic details with it. Rejections produced by axum itself (bad path
//! encoding, oversized bodies, unsupported methods) arrive as plain text and
//! are rewritten into the same shape.

use crate::error::{
    ErrorDetails, InternalErrorDetail, INTERNAL_ERROR_DETAILS, INTERNAL_ERROR_MESSAGE,
};
use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;

/// State for [`error_middleware`]
#[derive(Debug, Clone, Copy)]
pub struct ErrorPipeline {
    /// Put the underlying error text into 500 bodies
    pub expose_details: bool,
}

pub async fn error_middleware(
    State(pipeline): State<ErrorPipeline>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    if let Some(InternalErrorDetail(detail)) =
        response.extensions().get::<InternalErrorDetail>().cloned()
    {
        tracing::error!(%method, %uri, error = %detail, "Internal server error");

        return if pipeline.expose_details {
            ErrorDetails::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, detail)
                .into_response()
        } else {
            response
        };
    }

    if is_json(&response) {
        return response;
    }

    structure_rejection(response, pipeline, &method, &uri).await
}

const REJECTION_BODY_LIMIT: usize = 16 * 1024;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrite a plain-text or empty error response as [`ErrorDetails`]
async fn structure_rejection(
    response: Response,
    pipeline: ErrorPipeline,
    method: &Method,
    uri: &Uri,
) -> Response {
    let (parts, body) = response.into_parts();
    let status = parts.status;

    let text = axum::body::to_bytes(body, REJECTION_BODY_LIMIT)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();
    let reason = status.canonical_reason().unwrap_or("Request failed");

    let details = if status.is_server_error() {
        tracing::error!(
            %method,
            %uri,
            status = status.as_u16(),
            error = %text,
            "Request failed"
        );
        if pipeline.expose_details && !text.is_empty() {
            text
        } else {
            INTERNAL_ERROR_DETAILS.to_string()
        }
    } else {
        tracing::debug!(
            %method,
            %uri,
            status = status.as_u16(),
            rejection = %text,
            "Request rejected"
        );
        if text.is_empty() {
            format!("{}.", reason)
        } else {
            text
        }
    };

    let message = match status {
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed.",
        StatusCode::PAYLOAD_TOO_LARGE => "Request body is too large.",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported media type.",
        s if s.is_server_error() => INTERNAL_ERROR_MESSAGE,
        _ => "Incoming request isn't valid.",
    };

    let mut rewritten = ErrorDetails::new(status, message, details).into_response();
    if let Some(allow) = parts.headers.get(header::ALLOW) {
        rewritten.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rewritten
}

/// Panic handler for `CatchPanicLayer::custom`
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    let mut response = ErrorDetails::internal().into_response();
    response
        .extensions_mut()
        .insert(InternalErrorDetail(format!("Handler panicked: {}", reason)));
    response
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> ErrorDetails {
    ErrorDetails::new(
        StatusCode::NOT_FOUND,
        "Resource not found.",
        "No route matches the requested path.",
    )
}
