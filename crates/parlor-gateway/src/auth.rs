//! Shared-secret access control.
//!
//! Every routed request must present the configured token, either as the
//! `token` query parameter (needed by `EventSource`, which cannot set
//! headers) or as an `Authorization: Bearer <token>` header. Requests that
//! match no route never reach this check and get a plain 404.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use crate::error::GatewayError;
use crate::state::AppState;

/// The access token a request was authorized with.
///
/// Inserted into the request extensions by [`require_token`] so pages can
/// hand it on to the browser-side client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The token carried in `Authorization: Bearer <token>`, if any.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// The token carried in the `token` query parameter, if any.
fn query_token(request: &Request) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.token)
}

/// Middleware rejecting requests without the configured access token.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when neither the query parameter
/// nor the bearer header carries the expected token.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let expected = state.config.auth_token.as_str();
    if expected.is_empty() {
        debug!("No access token configured, rejecting request");
        return Err(GatewayError::Unauthorized);
    }

    let presented = match bearer_token(&request) {
        Some(token) if token == expected => Some(token.to_owned()),
        _ => query_token(&request).filter(|token| token == expected),
    };

    let Some(token) = presented else {
        debug!(path = %request.uri().path(), "Rejected request without a valid token");
        return Err(GatewayError::Unauthorized);
    };

    request.extensions_mut().insert(AccessToken(token));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(uri: &str, authorization: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap_or_default()
    }

    #[test]
    fn bearer_token_is_read_from_header() {
        let req = request("/rooms", Some("Bearer s3cret"));
        assert_eq!(bearer_token(&req), Some("s3cret"));
    }

    #[test]
    fn other_authorization_schemes_are_ignored() {
        let req = request("/rooms", Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn query_token_is_decoded() {
        let req = request("/rooms?limit=5&token=a%2Bb", None);
        assert_eq!(query_token(&req).as_deref(), Some("a+b"));
    }

    #[test]
    fn missing_query_token_is_none() {
        let req = request("/rooms?limit=5", None);
        assert_eq!(query_token(&req), None);
        let req = request("/rooms", None);
        assert_eq!(query_token(&req), None);
    }
}
