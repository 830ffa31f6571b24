/// Project model and database operations
///
/// A project owns an ordered list of tasks. Titles are globally unique
/// (case-sensitive). Deleting a project deletes its tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     title VARCHAR(30) NOT NULL UNIQUE,
///     description TEXT NOT NULL,
///     owner UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::task::Task;

/// Project fields without the task list
///
/// Returned by project listings to keep payloads small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    /// User who created the project
    pub owner: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Project with all of its tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub owner: Uuid,

    /// Tasks ordered by display index
    pub tasks: Vec<Task>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub owner: Uuid,
}

/// Input for updating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: String,
    pub description: String,
}

impl Project {
    /// Builds a new, empty project
    pub fn new(data: CreateProject) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            owner: data.owner,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Joins a summary row with its tasks
    pub fn from_parts(summary: ProjectSummary, tasks: Vec<Task>) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            owner: summary.owner,
            tasks,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }

    /// Drops the task list
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            owner: self.owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Lists all projects (no tasks), oldest first
    pub async fn list(pool: &PgPool) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, title, description, owner, created_at, updated_at
            FROM projects
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Lists the projects owned by one user (no tasks), oldest first
    pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, title, description, owner, created_at, updated_at
            FROM projects
            WHERE owner = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await
    }

    /// Finds a project with all of its tasks
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let summary = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, title, description, owner, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match summary {
            Some(summary) => {
                let tasks = Task::list_by_project(pool, id).await?;
                Ok(Some(Project::from_parts(summary, tasks)))
            }
            None => Ok(None),
        }
    }

    /// Locks a project row for the rest of the transaction
    ///
    /// Task creation, deletion and board sync take this lock so that
    /// order/index computations see a stable task list.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(found.is_some())
    }

    /// Inserts a new project
    ///
    /// # Errors
    ///
    /// Fails with a unique constraint violation (`projects_title_key`) when
    /// the title is taken.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = Project::new(data);

        sqlx::query(
            r#"
            INSERT INTO projects (id, title, description, owner, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.owner)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(pool)
        .await?;

        Ok(project)
    }

    /// Updates title and description; None if the project doesn't exist
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateProject) -> Result<Option<Self>, sqlx::Error> {
        let summary = sqlx::query_as::<_, ProjectSummary>(
            r#"
            UPDATE projects
            SET title = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, owner, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        match summary {
            Some(summary) => {
                let tasks = Task::list_by_project(pool, id).await?;
                Ok(Some(Project::from_parts(summary, tasks)))
            }
            None => Ok(None),
        }
    }

    /// Deletes a project and (by cascade) its tasks
    ///
    /// Returns true if a project was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
