/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register a new user
/// - `POST /auth/login` - Exchange credentials for a token
///
/// Both return the same shape:
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "name": "Ada", "email": "ada@example.com" }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};
use axum::{extract::State, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, PublicUser, User},
};
use tracing::{info, warn};
use validator::Validate;

/// Message for any login failure; never reveals which part was wrong
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, length checked by `password::validate_password_length`
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Signup / login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,

    /// The authenticated user
    pub user: PublicUser,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let claims = jwt::Claims::with_expiration(
        user.id,
        user.email.clone(),
        Duration::days(state.config.jwt.expiration_days),
    );
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(AuthResponse {
        token,
        user: PublicUser::from(user),
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "name": "Ada",
///   "email": "Ada@Example.com",
///   "password": "secret1"
/// }
/// ```
///
/// The email is stored lowercased.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already in use
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SignupRequest>,
) -> ApiResult<Json<AuthResponse>> {
    password::validate_password_length(&req.password).map_err(|e| ApiError::invalid("password", e))?;

    let password_hash = password::hash_password_with(&req.password, &state.config.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "User registered");

    Ok(Json(issue_token(&state, &user)?))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = match state.store.find_user_by_email(&req.email).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(issue_token(&state, &user)?))
}
