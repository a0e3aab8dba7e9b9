use std::{env, net::SocketAddr, path::Path};

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DOTENV_PATH: &str = ".env";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TRUSTED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub trusted_origin: HeaderValue,
    pub auth_default_host: Option<String>,
    pub auth_service_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("TRUSTED_ORIGIN must be an http or https origin")]
    InvalidTrustedOrigin,
    #[error("AUTH_SERVICE_URL must be an absolute http or https URL")]
    InvalidAuthServiceUrl,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = var("PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let trusted_origin = parse_trusted_origin(
            &var("TRUSTED_ORIGIN").unwrap_or_else(|| DEFAULT_TRUSTED_ORIGIN.to_string()),
        )?;

        let auth_default_host = var("AUTH_DEFAULT_HOST");
        let auth_service_url = var("AUTH_SERVICE_URL")
            .map(|value| parse_service_url(&value))
            .transpose()?;

        let config = Self {
            bind_addr,
            bind_port,
            trusted_origin,
            auth_default_host,
            auth_service_url,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

/// Loads `path` into the process environment without overriding variables
/// that are already set. Returns `Ok(false)` when the file does not exist.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(err) if err.not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

fn parse_trusted_origin(value: &str) -> Result<HeaderValue, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidTrustedOrigin)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidTrustedOrigin);
    }

    // Browsers send the origin without a trailing slash, so match that form.
    HeaderValue::from_str(value.trim_end_matches('/'))
        .map_err(|_| ConfigError::InvalidTrustedOrigin)
}

fn parse_service_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidAuthServiceUrl)?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidAuthServiceUrl);
    }
    Ok(url)
}
