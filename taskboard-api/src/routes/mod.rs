/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup and login
/// - `projects`: Project CRUD
/// - `tasks`: Task CRUD within a project
/// - `board`: Full-board sync after drag and drop

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use taskboard_shared::auth::middleware::AuthContext;

pub mod auth;
pub mod board;
pub mod health;
pub mod projects;
pub mod tasks;

/// Plain `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses a path identifier, mapping garbage to 400 with `message`
pub(crate) fn parse_id(raw: &str, message: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(message.to_string()))
}

/// Rejects callers who don't own the project, when ownership is enforced
///
/// A missing project passes; the operation itself decides whether that is
/// a 404 or an idempotent success.
pub(crate) async fn authorize_project(state: &AppState, auth: &AuthContext, project_id: Uuid) -> ApiResult<()> {
    if !state.config.authz.enforce_project_ownership {
        return Ok(());
    }

    match state.store.get_project(project_id).await? {
        Some(project) if project.owner != auth.user_id => {
            tracing::warn!(%project_id, user_id = %auth.user_id, "Rejected access to another user's project");
            Err(ApiError::Forbidden("You do not have access to this project".to_string()))
        }
        _ => Ok(()),
    }
}
