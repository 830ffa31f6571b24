/// Board sync endpoint
///
/// After a drag and drop the client submits every column of the board.
/// Each item's position in its column becomes its `order`; the column name
/// becomes its `stage`.
///
/// # Endpoint
///
/// ```text
/// PUT /project/:id/todo
/// Content-Type: application/json
///
/// {
///   "col-1": { "name": "Requested", "items": [{ "_id": "uuid-a" }] },
///   "col-2": { "name": "In Progress", "items": [{ "_id": "uuid-b" }, { "_id": "uuid-c" }] }
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Tasks updated",
///   "updates": [
///     { "taskId": "uuid-a", "stage": "Requested", "order": 0 },
///     { "taskId": "uuid-b", "stage": "In Progress", "order": 0 },
///     { "taskId": "uuid-c", "stage": "In Progress", "order": 1 }
///   ]
/// }
/// ```
///
/// The whole board is applied atomically: if any item is not a task of the
/// project, nothing changes and the request fails with 404.

use super::{authorize_project, parse_id, projects::INVALID_PROJECT_ID};
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    board::{BoardSync, Placement},
};
use tracing::info;

/// Board sync response
#[derive(Debug, Serialize, Deserialize)]
pub struct BoardSyncResponse {
    /// "Tasks updated"
    pub message: String,

    /// Every placement that was written
    pub updates: Vec<Placement>,
}

/// Apply a full-board snapshot
///
/// # Errors
///
/// - `400 Bad Request`: Malformed project or task id
/// - `404 Not Found`: No such project, or an item is not one of its tasks
/// - `422 Unprocessable Entity`: Unknown stage, duplicate task or stage, bad body
pub async fn sync_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    payload: Result<Json<BoardSync>, JsonRejection>,
) -> ApiResult<Json<BoardSyncResponse>> {
    let project_id = parse_id(&id, INVALID_PROJECT_ID)?;
    authorize_project(&state, &auth, project_id).await?;

    let Json(sync) = payload?;
    let placements = sync.placements()?;

    state.store.apply_placements(project_id, &placements).await?;

    info!(%project_id, count = placements.len(), "Board synced");

    Ok(Json(BoardSyncResponse {
        message: "Tasks updated".to_string(),
        updates: placements,
    }))
}
