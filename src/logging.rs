//! Tracing setup and per-request summaries

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::http::is_auth_path;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let summary = RequestSummary::start(&request);
    let response = next.run(request).await;
    summary.finish(response.status());
    response
}

struct RequestSummary {
    method: Method,
    path: String,
    origin: Option<String>,
    started_at: Instant,
}

impl RequestSummary {
    fn start(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            origin: request
                .headers()
                .get(header::ORIGIN)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            started_at: Instant::now(),
        }
    }

    fn finish(self, status: StatusCode) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let auth_route = is_auth_path(&self.path);

        info!(
            method = %self.method,
            path = %self.path,
            status = status.as_u16(),
            duration_ms = elapsed_ms,
            auth_route,
            origin = self.origin.as_deref().unwrap_or("-"),
            "request summary"
        );

        if auth_route && status.is_server_error() {
            warn!(
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                "auth request failed"
            );
        }
    }
}
