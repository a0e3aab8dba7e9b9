use std::{sync::Arc, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        HeaderValue, Method,
    },
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod docs;
pub mod errors;
pub mod http;
pub mod logging;

use auth::AuthHandler;

const CORS_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub auth_handler: Arc<dyn AuthHandler>,
    pub trusted_origin: HeaderValue,
    pub auth_default_host: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        auth_handler: Arc<dyn AuthHandler>,
        trusted_origin: HeaderValue,
        auth_default_host: Option<String>,
    ) -> Self {
        Self {
            auth_handler,
            trusted_origin,
            auth_default_host: auth_default_host.map(Arc::<str>::from),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    // The wildcard needs a non-empty tail, so the bare prefix is routed too.
    let auth_routes = Router::new()
        .route(http::AUTH_ROUTE_PREFIX, any(http::handlers::auth_proxy))
        .route("/api/auth/", any(http::handlers::auth_proxy))
        .route("/api/auth/{*path}", any(http::handlers::auth_proxy))
        .layer(auth_cors_layer(state.trusted_origin.clone()));

    Router::new()
        .route("/", get(http::handlers::root))
        .merge(auth_routes)
        .merge(
            SwaggerUi::new(docs::DOCS_PATH).url(docs::OPENAPI_JSON_PATH, docs::ApiDoc::openapi()),
        )
        .fallback(http::handlers::not_found)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

fn auth_cors_layer(trusted_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([trusted_origin]))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, COOKIE])
        .max_age(CORS_MAX_AGE)
}
