/// Task endpoints
///
/// # Endpoints
///
/// - `POST /project/:id/task` - Add a task to the `Requested` column
/// - `GET /project/:id/task/:task_id` - Fetch one task
/// - `PUT /project/:id/task/:task_id` - Edit title and description
/// - `DELETE /project/:id/task/:task_id` - Remove a task
///
/// Stage and order only change through the board sync endpoint.

use super::{authorize_project, parse_id, projects::INVALID_PROJECT_ID, MessageResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, UpdateTask},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const INVALID_ID: &str = "Invalid ID";

const TASK_NOT_FOUND: &str = "Task not found";

/// Create / update request
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 3, max = 30, message = "Title must be between 3 and 30 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Response to task creation
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCreatedResponse {
    /// "Task added"
    pub message: String,

    /// The stored task, including its assigned order and index
    pub task: Task,
}

fn parse_ids(project_id: &str, task_id: &str) -> ApiResult<(Uuid, Uuid)> {
    Ok((parse_id(project_id, INVALID_ID)?, parse_id(task_id, INVALID_ID)?))
}

/// Add a task to a project
///
/// The task starts in `Requested`, at the bottom of that column.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed project id
/// - `404 Not Found`: No such project
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<Json<TaskCreatedResponse>> {
    let project_id = parse_id(&id, INVALID_PROJECT_ID)?;
    authorize_project(&state, &auth, project_id).await?;

    let task = state
        .store
        .create_task(
            project_id,
            CreateTask {
                title: req.title,
                description: req.description,
            },
        )
        .await?;

    info!(%project_id, task_id = %task.id, "Task added");

    Ok(Json(TaskCreatedResponse {
        message: "Task added".to_string(),
        task,
    }))
}

/// Fetch one task
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `404 Not Found`: No such project or task
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<Task>> {
    let (project_id, task_id) = parse_ids(&id, &task_id)?;
    authorize_project(&state, &auth, project_id).await?;

    let task = state
        .store
        .get_task(project_id, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    Ok(Json(task))
}

/// Edit a task's title and description
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `404 Not Found`: No such project or task
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, task_id)): Path<(String, String)>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (project_id, task_id) = parse_ids(&id, &task_id)?;
    authorize_project(&state, &auth, project_id).await?;

    state
        .store
        .update_task(
            project_id,
            task_id,
            UpdateTask {
                title: req.title,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    Ok(Json(MessageResponse::new("Task updated")))
}

/// Remove a task
///
/// The rest of its column closes the gap. Succeeds whether or not the task
/// existed.
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let (project_id, task_id) = parse_ids(&id, &task_id)?;
    authorize_project(&state, &auth, project_id).await?;

    if state.store.delete_task(project_id, task_id).await? {
        info!(%project_id, %task_id, "Task deleted");
    }

    Ok(Json(MessageResponse::new("Task deleted")))
}
