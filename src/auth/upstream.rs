//! Concrete [`AuthHandler`] implementations
//!
//! [`UpstreamAuthHandler`] relays fetch-style requests to a standalone
//! authentication service over HTTP. [`UnconfiguredAuthHandler`] is installed
//! when no such service is configured.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client};
use url::Url;

use super::{adapter::X_FORWARDED_PROTO, AuthError, AuthHandler, FetchRequest, FetchResponse};

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP_HEADERS: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub struct UpstreamAuthHandler {
    client: Client,
    base_url: Url,
}

impl UpstreamAuthHandler {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        // Redirects belong to the browser, not to us.
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl AuthHandler for UpstreamAuthHandler {
    async fn handle(&self, request: FetchRequest) -> Result<FetchResponse, AuthError> {
        let target = upstream_url(&self.base_url, &request.url);
        let headers = upstream_headers(&request);

        let mut builder = self
            .client
            .request(request.method, target.clone())
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            AuthError::handler(format!("upstream request to {target} failed: {err}"))
        })?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        let body = response.bytes().await.map_err(|err| {
            AuthError::handler(format!("failed to read upstream response body: {err}"))
        })?;

        tracing::debug!(%target, status = status.as_u16(), "upstream auth response");

        Ok(FetchResponse {
            status,
            headers,
            body: (!body.is_empty()).then_some(body),
        })
    }
}

/// Fails every request; stands in until an authentication service is configured.
#[derive(Debug, Default)]
pub struct UnconfiguredAuthHandler;

#[async_trait]
impl AuthHandler for UnconfiguredAuthHandler {
    async fn handle(&self, _request: FetchRequest) -> Result<FetchResponse, AuthError> {
        Err(AuthError::handler("no authentication service configured"))
    }
}

fn upstream_url(base: &Url, target: &Url) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{}", target.path()));
    url.set_query(target.query());
    url
}

fn upstream_headers(request: &FetchRequest) -> HeaderMap {
    let mut headers = request.headers.clone();
    headers.remove(header::HOST);
    strip_hop_by_hop(&mut headers);

    if let Some(host) = request.url.host_str() {
        let host = match request.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&host) {
            headers.insert(X_FORWARDED_HOST, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(request.url.scheme()) {
        headers.insert(X_FORWARDED_PROTO, value);
    }

    headers
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, Bytes},
        http::{Method, StatusCode},
        response::Response,
        routing::{get, post},
        Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn redirect() -> Response {
        Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "/elsewhere")
            .header(header::SET_COOKIE, "session=abc; HttpOnly")
            .header(header::SET_COOKIE, "csrf=xyz")
            .header("keep-alive", "timeout=5")
            .body(Body::from("moved"))
            .expect("response build")
    }

    async fn echo(headers: HeaderMap, body: Bytes) -> Response {
        let header_text = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let payload = json!({
            "forwarded_host": header_text("x-forwarded-host"),
            "forwarded_proto": header_text("x-forwarded-proto"),
            "cookie": header_text("cookie"),
            "body": String::from_utf8_lossy(&body),
        });

        Response::builder()
            .status(StatusCode::CREATED)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("response build")
    }

    async fn spawn_auth_service() -> Url {
        let app = Router::new()
            .route("/api/auth/callback/github", get(redirect))
            .route("/elsewhere", get(|| async { "followed" }))
            .route("/api/auth/echo", post(echo));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind auth service");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve auth service");
        });

        Url::parse(&format!("http://{addr}")).expect("valid url")
    }

    fn relay(base_url: Url) -> UpstreamAuthHandler {
        UpstreamAuthHandler::new(base_url, Duration::from_secs(5)).expect("http client")
    }

    fn fetch_request(url: &str) -> FetchRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("app.example.com:3000"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        FetchRequest {
            method: Method::GET,
            url: Url::parse(url).expect("valid url"),
            headers,
            body: None,
        }
    }

    #[test]
    fn upstream_url_keeps_path_and_query() {
        let base = Url::parse("http://127.0.0.1:4000").expect("valid url");
        let target = Url::parse("http://app.example.com/api/auth/callback/github?code=1&state=2")
            .expect("valid url");

        assert_eq!(
            upstream_url(&base, &target).as_str(),
            "http://127.0.0.1:4000/api/auth/callback/github?code=1&state=2"
        );
    }

    #[test]
    fn upstream_url_respects_base_path_prefix() {
        let base = Url::parse("http://auth.internal/identity/").expect("valid url");
        let target = Url::parse("https://app.example.com/api/auth/session").expect("valid url");

        assert_eq!(
            upstream_url(&base, &target).as_str(),
            "http://auth.internal/identity/api/auth/session"
        );
    }

    #[test]
    fn upstream_headers_move_host_to_forwarded_headers() {
        let headers = upstream_headers(&fetch_request("https://app.example.com:3000/api/auth/session"));

        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert_eq!(headers[header::COOKIE], "session=abc");
        assert_eq!(headers["x-forwarded-host"], "app.example.com:3000");
        assert_eq!(headers["x-forwarded-proto"], "https");
    }

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("session=abc"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn unconfigured_handler_always_fails() {
        let err = UnconfiguredAuthHandler
            .handle(fetch_request("http://localhost/api/auth/session"))
            .await
            .expect_err("expected failure");

        assert!(matches!(err, AuthError::Handler(_)));
    }

    #[tokio::test]
    async fn redirects_are_returned_unfollowed() {
        let handler = relay(spawn_auth_service().await);

        let response = handler
            .handle(fetch_request(
                "http://app.example.com:3000/api/auth/callback/github?code=1",
            ))
            .await
            .expect("relay should succeed");

        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.headers[header::LOCATION], "/elsewhere");
        let cookies: Vec<_> = response.headers.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["session=abc; HttpOnly", "csrf=xyz"]);
        assert!(!response.headers.contains_key("keep-alive"));
        assert_eq!(response.body.as_deref(), Some(b"moved".as_slice()));
    }

    #[tokio::test]
    async fn request_is_relayed_with_forwarded_headers_and_body() {
        let handler = relay(spawn_auth_service().await);
        let mut request = fetch_request("https://app.example.com:3000/api/auth/echo");
        request.method = Method::POST;
        request.body = Some(Bytes::from_static(br#"{"email":"ada@example.com"}"#));

        let response = handler.handle(request).await.expect("relay should succeed");

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.headers[header::CONTENT_TYPE], "application/json");
        let body: serde_json::Value =
            serde_json::from_slice(&response.body.expect("response body")).expect("valid json");
        assert_eq!(body["forwarded_host"], "app.example.com:3000");
        assert_eq!(body["forwarded_proto"], "https");
        assert_eq!(body["cookie"], "session=abc");
        assert_eq!(body["body"], r#"{"email":"ada@example.com"}"#);
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_handler_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let handler = relay(Url::parse(&format!("http://{addr}")).expect("valid url"));

        let err = handler
            .handle(fetch_request("http://localhost/api/auth/session"))
            .await
            .expect_err("expected transport failure");

        assert!(matches!(err, AuthError::Handler(_)));
    }
}
