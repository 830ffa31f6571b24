/// In-memory storage backend
///
/// Keeps everything in one `RwLock`-guarded state. Every mutating operation
/// holds the write lock for its whole duration, which makes board syncs
/// atomic in the same way a database transaction does.
///
/// Data is lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{project_not_found, Store, StoreError, StoreResult, EMAIL_TAKEN, TITLE_TAKEN};
use crate::board::{self, BoardError, Placement};
use crate::models::{
    project::{CreateProject, Project, ProjectSummary, UpdateProject},
    task::{CreateTask, Task, UpdateTask},
    user::{normalize_email, CreateUser, User},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,

    /// Projects in creation order
    projects: Vec<Project>,
}

impl MemoryState {
    fn project_mut(&mut self, id: Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    fn title_taken(&self, title: &str, except: Option<Uuid>) -> bool {
        self.projects
            .iter()
            .any(|p| p.title == title && Some(p.id) != except)
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        let email = normalize_email(&data.email);
        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let user = User::new(data);
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_projects(&self, owner: Option<Uuid>) -> StoreResult<Vec<ProjectSummary>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| owner.map_or(true, |owner| p.owner == owner))
            .map(Project::summary)
            .collect())
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut state = self.state.write().await;

        if state.title_taken(&data.title, None) {
            return Err(StoreError::Conflict(TITLE_TAKEN.to_string()));
        }

        let project = Project::new(data);
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;

        if !state.projects.iter().any(|p| p.id == id) {
            return Ok(None);
        }

        if state.title_taken(&data.title, Some(id)) {
            return Err(StoreError::Conflict(TITLE_TAKEN.to_string()));
        }

        Ok(state.project_mut(id).map(|project| {
            project.title = data.title;
            project.description = data.description;
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        Ok(state.projects.len() < before)
    }

    async fn create_task(&self, project_id: Uuid, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;
        let project = state.project_mut(project_id).ok_or_else(project_not_found)?;

        let task = Task::new(data, board::next_slot(&project.tasks));
        project.tasks.push(task.clone());

        debug!(%project_id, task_id = %task.id, order = task.order, index = task.index, "Task created");
        Ok(task)
    }

    async fn get_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .and_then(|p| p.tasks.iter().find(|t| t.id == task_id))
            .cloned())
    }

    async fn update_task(&self, project_id: Uuid, task_id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let task = state
            .project_mut(project_id)
            .and_then(|p| p.tasks.iter_mut().find(|t| t.id == task_id));

        Ok(task.map(|task| {
            task.title = data.title;
            task.description = data.description;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(project) = state.project_mut(project_id) else {
            return Ok(false);
        };

        let Some(position) = project.tasks.iter().position(|t| t.id == task_id) else {
            return Ok(false);
        };

        let removed = project.tasks.remove(position);
        let compaction = board::compact_stage(&project.tasks, removed.stage);
        board::apply_placements(&mut project.tasks, &compaction).map_err(board_to_store)?;

        Ok(true)
    }

    async fn apply_placements(&self, project_id: Uuid, placements: &[Placement]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let project = state.project_mut(project_id).ok_or_else(project_not_found)?;

        board::apply_placements(&mut project.tasks, placements).map_err(board_to_store)?;

        debug!(%project_id, count = placements.len(), "Board placements applied");
        Ok(())
    }
}

/// `apply_placements` only fails on an unknown task
fn board_to_store(err: BoardError) -> StoreError {
    StoreError::NotFound(err.to_string())
}
