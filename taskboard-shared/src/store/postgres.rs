/// PostgreSQL storage backend
///
/// Delegates to the model operations in [`crate::models`]. Anything that
/// reads the task list to compute new `order`/`index` values runs in a
/// transaction holding the project row lock.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{project_not_found, task_not_found, Store, StoreError, StoreResult, EMAIL_TAKEN, TITLE_TAKEN};
use crate::board::{self, Placement};
use crate::db::pool::health_check;
use crate::models::{
    project::{CreateProject, Project, ProjectSummary, UpdateProject},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool (migrations must already have run)
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Conflict`, everything else to `Database`
fn conflict_or_database(err: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            debug!(constraint = ?db_err.constraint(), "Unique constraint violated");
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| conflict_or_database(e, EMAIL_TAKEN))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_projects(&self, owner: Option<Uuid>) -> StoreResult<Vec<ProjectSummary>> {
        let projects = match owner {
            Some(owner) => Project::list_by_owner(&self.pool, owner).await?,
            None => Project::list(&self.pool).await?,
        };
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Project::create(&self.pool, data)
            .await
            .map_err(|e| conflict_or_database(e, TITLE_TAKEN))
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Project::update(&self.pool, id, data)
            .await
            .map_err(|e| conflict_or_database(e, TITLE_TAKEN))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn create_task(&self, project_id: Uuid, data: CreateTask) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        if !Project::lock(&mut *tx, project_id).await? {
            return Err(project_not_found());
        }

        let existing = Task::list_by_project(&mut *tx, project_id).await?;
        let task = Task::new(data, board::next_slot(&existing));
        Task::insert(&mut *tx, project_id, &task).await?;

        tx.commit().await?;

        debug!(%project_id, task_id = %task.id, order = task.order, index = task.index, "Task created");
        Ok(task)
    }

    async fn get_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find(&self.pool, project_id, task_id).await?)
    }

    async fn update_task(&self, project_id: Uuid, task_id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update_details(&self.pool, project_id, task_id, data).await?)
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        if !Project::lock(&mut *tx, project_id).await? {
            return Ok(false);
        }

        let stage = Task::delete(&mut *tx, project_id, task_id).await?;

        if let Some(stage) = stage {
            let remaining = Task::list_by_project(&mut *tx, project_id).await?;
            for placement in board::compact_stage(&remaining, stage) {
                Task::set_placement(&mut *tx, project_id, &placement).await?;
            }
        }

        tx.commit().await?;
        Ok(stage.is_some())
    }

    async fn apply_placements(&self, project_id: Uuid, placements: &[Placement]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Project::lock(&mut *tx, project_id).await? {
            return Err(project_not_found());
        }

        for placement in placements {
            if !Task::set_placement(&mut *tx, project_id, placement).await? {
                warn!(%project_id, task_id = %placement.task_id, "Board sync references unknown task, rolling back");
                // Dropping the transaction rolls back the placements written so far
                return Err(task_not_found(placement.task_id));
            }
        }

        tx.commit().await?;

        debug!(%project_id, count = placements.len(), "Board placements applied");
        Ok(())
    }
}
