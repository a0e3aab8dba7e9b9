//! Bridge between the HTTP server and the external authentication handler
//!
//! The handler speaks fetch-style requests and responses; [`adapter`] converts
//! axum's native types to and from them.

pub mod adapter;
pub mod upstream;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
};
use thiserror::Error;
use url::Url;

/// Standalone request handed to an [`AuthHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Response produced by an [`AuthHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl FetchResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request carries no usable host information")]
    MissingHost,
    #[error("could not build request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Handler(String),
}

impl AuthError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

#[async_trait]
pub trait AuthHandler: Send + Sync {
    async fn handle(&self, request: FetchRequest) -> Result<FetchResponse, AuthError>;
}
