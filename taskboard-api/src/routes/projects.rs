/// Project endpoints
///
/// # Endpoints
///
/// - `GET /projects` - List projects (without tasks)
/// - `POST /project` - Create project
/// - `GET /project/:id` - One project with its tasks, wrapped in an array
/// - `PUT /project/:id` - Update title and description
/// - `DELETE /project/:id` - Delete project and its tasks

use super::{authorize_project, parse_id, MessageResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::project::{CreateProject, Project, ProjectSummary, UpdateProject},
};
use tracing::info;
use validator::Validate;

pub(crate) const INVALID_PROJECT_ID: &str = "Invalid project ID";

pub(crate) const PROJECT_NOT_FOUND: &str = "Project not found";

/// Create / update request
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 3, max = 30, message = "Title must be between 3 and 30 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// List projects
///
/// Summaries only, oldest first. With ownership enforcement on, only the
/// caller's own projects are listed.
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    let owner = state
        .config
        .authz
        .enforce_project_ownership
        .then_some(auth.user_id);

    Ok(Json(state.store.list_projects(owner).await?))
}

/// Get one project with its tasks
///
/// # Response
///
/// A single-element array, kept for compatibility with existing clients:
///
/// ```json
/// [{ "id": "uuid", "title": "Website", "tasks": [ ... ], ... }]
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `404 Not Found`: No such project
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Project>>> {
    let id = parse_id(&id, INVALID_PROJECT_ID)?;
    authorize_project(&state, &auth, id).await?;

    let project = state
        .store
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    Ok(Json(vec![project]))
}

/// Create a project owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Title must be unique
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<ProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = state
        .store
        .create_project(CreateProject {
            title: req.title,
            description: req.description,
            owner: auth.user_id,
        })
        .await?;

    info!(project_id = %project.id, owner = %auth.user_id, "Project created");
    Ok(Json(project))
}

/// Update a project's title and description
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `404 Not Found`: No such project
/// - `409 Conflict`: Title taken by another project
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<ProjectRequest>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id, INVALID_PROJECT_ID)?;
    authorize_project(&state, &auth, id).await?;

    let project = state
        .store
        .update_project(
            id,
            UpdateProject {
                title: req.title,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    Ok(Json(project))
}

/// Delete a project and all of its tasks
///
/// Succeeds whether or not the project existed.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, INVALID_PROJECT_ID)?;
    authorize_project(&state, &auth, id).await?;

    if state.store.delete_project(id).await? {
        info!(project_id = %id, "Project deleted");
    }

    Ok(Json(MessageResponse::new("Project deleted")))
}
