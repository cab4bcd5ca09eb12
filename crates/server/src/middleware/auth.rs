use crate::config::{AuthenticationConfig, WILDCARD_TOKEN};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Identity assigned to every caller presenting the fixed token
pub const MCP_CLIENT: &str = "mcp-client";

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClient(pub String);

/// Why a request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Missing Authorization header.")]
    MissingHeader,
    #[error("Unsupported authentication scheme.")]
    SchemeMismatch,
    #[error("Server configuration error for authentication.")]
    NotConfigured,
    #[error("Invalid token.")]
    InvalidToken,
}

/// Fixed-token authentication: every caller shares one configured token.
#[derive(Debug, Clone)]
pub struct FixedTokenAuth {
    scheme: String,
    expected_token: String,
    allow_wildcard_token: bool,
}

impl FixedTokenAuth {
    pub fn new(config: &AuthenticationConfig) -> Self {
        Self {
            scheme: config.scheme.trim().to_string(),
            expected_token: config.expected_token.clone(),
            allow_wildcard_token: config.allow_wildcard_token,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedClient, AuthFailure> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthFailure::MissingHeader)?;

        let (scheme, token) = match value.split_once(' ') {
            Some((scheme, token)) => (scheme, token.trim()),
            None => (value, ""),
        };

        if self.scheme.is_empty() || !self.scheme.eq_ignore_ascii_case(scheme) {
            return Err(AuthFailure::SchemeMismatch);
        }

        if self.expected_token.is_empty() {
            tracing::error!("authentication.expected_token is not configured");
            return Err(AuthFailure::NotConfigured);
        }

        let wildcard = self.allow_wildcard_token && self.expected_token == WILDCARD_TOKEN;
        if token == self.expected_token || wildcard {
            Ok(AuthenticatedClient(MCP_CLIENT.to_string()))
        } else {
            Err(AuthFailure::InvalidToken)
        }
    }

    fn challenge(&self, failure: AuthFailure) -> Response {
        let scheme = if self.scheme.is_empty() { "Bearer" } else { &self.scheme };
        let mut response = (StatusCode::UNAUTHORIZED, failure.to_string()).into_response();
        if let Ok(value) = HeaderValue::from_str(scheme) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Middleware rejecting requests without the configured token
pub async fn require_token(
    State(auth): State<Arc<FixedTokenAuth>>,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.authenticate(req.headers()) {
        Ok(client) => {
            req.extensions_mut().insert(client);
            next.run(req).await
        }
        Err(failure) => {
            tracing::debug!(reason = %failure, "Rejected unauthenticated request");
            auth.challenge(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt; // for `oneshot`

    fn auth(expected_token: &str, allow_wildcard_token: bool) -> FixedTokenAuth {
        FixedTokenAuth::new(&AuthenticationConfig {
            scheme: "Bearer".to_string(),
            expected_token: expected_token.to_string(),
            allow_wildcard_token,
        })
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        let result = auth("secret", false).authenticate(&HeaderMap::new());
        assert_eq!(result, Err(AuthFailure::MissingHeader));
    }

    #[test]
    fn test_scheme_mismatch() {
        let result = auth("secret", false).authenticate(&headers("Basic secret"));
        assert_eq!(result, Err(AuthFailure::SchemeMismatch));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let result = auth("secret", false).authenticate(&headers("bearer secret"));
        assert_eq!(result, Ok(AuthenticatedClient(MCP_CLIENT.to_string())));
    }

    #[test]
    fn test_wrong_token() {
        let result = auth("secret", false).authenticate(&headers("Bearer nope"));
        assert_eq!(result, Err(AuthFailure::InvalidToken));
    }

    #[test]
    fn test_empty_expected_token() {
        let result = auth("", false).authenticate(&headers("Bearer anything"));
        assert_eq!(result, Err(AuthFailure::NotConfigured));
    }

    #[test]
    fn test_wildcard_requires_opt_in() {
        assert_eq!(
            auth("*", false).authenticate(&headers("Bearer anything")),
            Err(AuthFailure::InvalidToken)
        );
        assert!(auth("*", true).authenticate(&headers("Bearer anything")).is_ok());
    }

    async fn whoami(Extension(client): Extension<AuthenticatedClient>) -> String {
        client.0
    }

    fn app(auth: FixedTokenAuth) -> Router {
        Router::new()
            .route("/mcp", get(whoami))
            .layer(from_fn_with_state(Arc::new(auth), require_token))
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_challenge() {
        let response = app(auth("secret", false))
            .oneshot(HttpRequest::builder().uri("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_middleware_passes_client_identity() {
        let response = app(auth("secret", false))
            .oneshot(
                HttpRequest::builder()
                    .uri("/mcp")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], MCP_CLIENT.as_bytes());
    }
}
