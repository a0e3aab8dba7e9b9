//! HTTP transport layer
//!
//! Route handlers for the greeting, the authentication proxy and unknown paths.

pub mod handlers;

/// The prefix itself and every path below it are relayed to the authentication handler.
pub const AUTH_ROUTE_PREFIX: &str = "/api/auth";

pub fn is_auth_path(path: &str) -> bool {
    path.strip_prefix(AUTH_ROUTE_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
