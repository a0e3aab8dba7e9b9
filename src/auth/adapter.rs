//! Conversion between axum requests/responses and fetch-style values

use axum::{
    body::{Body, Bytes},
    http::{header::HeaderName, request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use axum_extra::headers::{HeaderMapExt, Host};
use url::Url;

use super::{AuthError, AuthHandler, FetchRequest, FetchResponse};

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Runs one inbound request through `handler` and returns the native response.
pub async fn forward(
    handler: &dyn AuthHandler,
    parts: &Parts,
    body: Bytes,
    default_host: Option<&str>,
) -> Result<Response, AuthError> {
    let request = build_fetch_request(parts, body, default_host)?;
    let response = handler.handle(request).await?;
    Ok(into_native_response(response))
}

pub fn build_fetch_request(
    parts: &Parts,
    body: Bytes,
    default_host: Option<&str>,
) -> Result<FetchRequest, AuthError> {
    let host = resolve_host(parts, default_host).ok_or(AuthError::MissingHost)?;
    let scheme = resolve_scheme(parts);
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");

    let url = Url::parse(&format!("{scheme}://{host}{path_and_query}"))?;
    if url.host_str().is_none() {
        return Err(AuthError::MissingHost);
    }

    Ok(FetchRequest {
        method: parts.method.clone(),
        url,
        headers: copy_present_headers(&parts.headers),
        body: (!body.is_empty()).then_some(body),
    })
}

pub fn into_native_response(response: FetchResponse) -> Response {
    let body = response.body.map(Body::from).unwrap_or_else(Body::empty);
    let mut native = Response::new(body);
    *native.status_mut() = response.status;
    *native.headers_mut() = response.headers;
    native
}

fn resolve_host(parts: &Parts, default_host: Option<&str>) -> Option<String> {
    if let Some(host) = parts.headers.typed_get::<Host>() {
        return Some(format_host(host.hostname(), host.port()));
    }

    if let Some(authority) = parts.uri.authority() {
        return Some(format_host(authority.host(), authority.port_u16()));
    }

    default_host
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

fn format_host(hostname: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{hostname}:{port}"),
        None => hostname.to_string(),
    }
}

fn resolve_scheme(parts: &Parts) -> &'static str {
    let forwarded = parts
        .headers
        .get(&X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_ascii_lowercase());

    match forwarded.as_deref().or(parts.uri.scheme_str()) {
        Some("https") => "https",
        _ => "http",
    }
}

fn copy_present_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if is_blank(value) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn is_blank(value: &HeaderValue) -> bool {
    value.as_bytes().iter().all(u8::is_ascii_whitespace)
}
