/// Request authentication for Axum
///
/// Credentials travel with each request: the `Authorization: Bearer <token>`
/// header is validated and the resulting identity is stored in the request
/// extensions as an [`AuthContext`]. Nothing about the caller is kept in
/// process-wide state.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, extract::Request, middleware::Next, Router};
/// use taskboard_shared::auth::middleware::{authenticate, AuthContext, AuthError};
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// async fn auth_layer(mut req: Request, next: Next) -> Result<axum::response::Response, AuthError> {
///     let ctx = authenticate(req.headers(), "secret")?;
///     req.extensions_mut().insert(ctx);
///     Ok(next.run(req).await)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(auth_layer));
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Authenticated user email
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// Error type for request authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": true,
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts the raw token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Validates the bearer token in `headers` and builds the caller's context
///
/// # Errors
///
/// - `MissingCredentials` when the header is absent or empty
/// - `InvalidFormat` when the scheme is not `Bearer`
/// - `InvalidToken` for bad signatures, wrong issuer, or expired tokens
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid token issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext::from_jwt(claims.sub, claims.email))
}

/// Lets handlers take `AuthContext` as an argument on authenticated routes
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "me@example.com"), SECRET).unwrap();

        let ctx = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();

        assert_eq!(ctx, AuthContext::from_jwt(user_id, "me@example.com"));
    }

    #[test]
    fn test_authenticate_missing_header() {
        assert_eq!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            authenticate(&headers_with("Bearer "), SECRET),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_authenticate_wrong_scheme() {
        assert_eq!(
            authenticate(&headers_with("Basic dXNlcjpwYXNz"), SECRET),
            Err(AuthError::InvalidFormat)
        );
    }

    #[test]
    fn test_authenticate_expired_token() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "a@b.io", Duration::days(-1));
        let token = create_token(&claims, SECRET).unwrap();

        assert_eq!(
            authenticate(&headers_with(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken("Token expired".to_string()))
        );
    }

    #[test]
    fn test_authenticate_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4(), "a@b.io"), "other-secret").unwrap();

        assert!(matches!(
            authenticate(&headers_with(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidFormat,
            AuthError::InvalidToken("x".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
