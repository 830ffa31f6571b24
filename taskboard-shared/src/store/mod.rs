/// Storage abstraction for users, projects and tasks
///
/// The API layer talks to a `dyn Store`. Two backends implement it:
///
/// - [`postgres::PgStore`]: production backend on an `sqlx` pool
/// - [`memory::MemoryStore`]: process-local backend for tests and local runs
///
/// # Contract
///
/// - Emails are matched case-insensitively; a duplicate yields `Conflict`.
/// - Project titles are unique (case-sensitive); a duplicate yields `Conflict`.
/// - Creating a task assigns its slot with [`crate::board::next_slot`].
/// - Deleting a task compacts the `order` values of its stage.
/// - [`Store::apply_placements`] is all or nothing: if any placement names a
///   task outside the project, nothing is written.
///
/// # Example
///
/// ```
/// use taskboard_shared::store::{memory::MemoryStore, Store};
/// use taskboard_shared::models::project::CreateProject;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let project = store.create_project(CreateProject {
///     title: "Website".to_string(),
///     description: "Relaunch".to_string(),
///     owner: Uuid::new_v4(),
/// }).await?;
///
/// assert!(store.get_project(project.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::board::Placement;
use crate::models::{
    project::{CreateProject, Project, ProjectSummary, UpdateProject},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

/// Conflict message for a taken email
pub const EMAIL_TAKEN: &str = "Email already in use";

/// Conflict message for a taken project title
pub const TITLE_TAKEN: &str = "Title must be unique";

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// Referenced project or task is absent
    #[error("{0}")]
    NotFound(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn project_not_found() -> StoreError {
    StoreError::NotFound("Project not found".to_string())
}

pub(crate) fn task_not_found(task_id: Uuid) -> StoreError {
    StoreError::NotFound(format!("Task not found: {}", task_id))
}

/// Persistence operations used by the API layer
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Registers a user; `Conflict` if the email is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Looks a user up by email, case-insensitively
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Lists project summaries, optionally only those of one owner
    async fn list_projects(&self, owner: Option<Uuid>) -> StoreResult<Vec<ProjectSummary>>;

    /// Fetches a project with its tasks
    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Creates a project; `Conflict` if the title is taken
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    /// Updates a project; None if absent, `Conflict` if the title is taken
    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Deletes a project and its tasks; true if something was deleted
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// Appends a task to the `Requested` column; `NotFound` if no project
    async fn create_task(&self, project_id: Uuid, data: CreateTask) -> StoreResult<Task>;

    /// Fetches one task of a project
    async fn get_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>>;

    /// Updates a task's title and description
    async fn update_task(&self, project_id: Uuid, task_id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Deletes a task and compacts its stage; true if something was deleted
    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool>;

    /// Writes a batch of placements atomically
    async fn apply_placements(&self, project_id: Uuid, placements: &[Placement]) -> StoreResult<()>;
}
