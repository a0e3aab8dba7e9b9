//! Axum HTTP handlers for the web server

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{Method, Uri},
    response::Response,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::adapter;
use crate::errors::{AppError, ErrorResponse};
use crate::AppState;

pub const GREETING: &str = "Hello world!";

/// Largest request body relayed to the authentication handler (1 MiB).
pub const MAX_AUTH_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Serialize, ToSchema)]
pub struct HelloResponse {
    #[schema(example = "Hello world!")]
    pub message: String,
}

/// Greeting.
#[utoipa::path(
    get,
    path = "/",
    tag = "greeting",
    responses(
        (status = 200, description = "Greeting message", body = HelloResponse)
    )
)]
pub async fn root() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: GREETING.to_string(),
    })
}

/// Relays any request under `/api/auth/` to the authentication handler.
///
/// Status, headers and body of the handler's response are passed through
/// untouched. Handler failures become a 500 with code `AUTH_FAILURE`.
#[utoipa::path(
    method(get, post, put, patch, delete),
    path = "/api/auth/{path}",
    tag = "auth",
    params(
        ("path" = String, Path, description = "Route understood by the authentication handler")
    ),
    responses(
        (status = 200, description = "Response produced by the authentication handler"),
        (status = 400, description = "Request body could not be read", body = ErrorResponse),
        (status = 500, description = "Authentication handler failed", body = ErrorResponse)
    )
)]
pub async fn auth_proxy(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_AUTH_BODY_BYTES)
        .await
        .map_err(|err| {
            AppError::bad_request("INVALID_BODY", format!("failed to read request body: {err}"))
        })?;

    let response = adapter::forward(
        state.auth_handler.as_ref(),
        &parts,
        body,
        state.auth_default_host.as_deref(),
    )
    .await?;

    Ok(response)
}

pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("Route {method}:{} not found", uri.path()))
}
