/// Task model and database operations
///
/// Tasks live inside a project and sit in one of four stage columns.
/// `order` is the task's position within its stage column, `index` is a
/// per-project display label that is never reused.
///
/// # Stages
///
/// ```text
/// Requested → To do → In Progress → Done
/// ```
///
/// Tasks may move freely between any two stages; there is no enforced
/// progression.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(30) NOT NULL,
///     description TEXT NOT NULL,
///     stage VARCHAR(32) NOT NULL,
///     sort_order INTEGER NOT NULL,
///     display_index INTEGER NOT NULL,
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, display_index)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgConnection, PgExecutor, PgPool};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::board::{Placement, TaskSlot};

/// Stage column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Newly created tasks land here
    #[serde(rename = "Requested")]
    Requested,

    /// Accepted, not started
    #[serde(rename = "To do")]
    Todo,

    /// Being worked on
    #[serde(rename = "In Progress")]
    InProgress,

    /// Finished
    #[serde(rename = "Done")]
    Done,
}

impl Stage {
    /// All stages in board (left to right) order
    pub const ALL: [Stage; 4] = [Stage::Requested, Stage::Todo, Stage::InProgress, Stage::Done];

    /// Wire / storage name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Requested => "Requested",
            Stage::Todo => "To do",
            Stage::InProgress => "In Progress",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stage name is not one of the four known columns
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// File attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// MIME type or extension, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    /// Where the file lives
    pub url: String,
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub title: String,

    pub description: String,

    /// Current stage column
    pub stage: Stage,

    /// Zero-based position within the stage column
    pub order: i32,

    /// Stable display label, assigned once at creation
    pub index: i32,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
}

/// Input for editing a task; stage and order are only changed by the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: String,
    pub description: String,
}

impl Task {
    /// Builds a fresh task occupying `slot`
    pub fn new(data: CreateTask, slot: TaskSlot) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            stage: Stage::Requested,
            order: slot.order,
            index: slot.index,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: String,
    stage: String,
    sort_order: i32,
    display_index: i32,
    attachments: Json<Vec<Attachment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = sqlx::Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let stage = row
            .stage
            .parse::<Stage>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            stage,
            order: row.sort_order,
            index: row.display_index,
            attachments: row.attachments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TASK_COLUMNS: &str = "id, title, description, stage, sort_order, display_index, attachments, created_at, updated_at";

impl Task {
    /// Lists a project's tasks ordered by display index
    pub async fn list_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY display_index",
            TASK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Finds one task inside a project
    pub async fn find(pool: &PgPool, project_id: Uuid, task_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE project_id = $1 AND id = $2",
            TASK_COLUMNS
        ))
        .bind(project_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    /// Inserts a task built with [`Task::new`]
    ///
    /// Callers must hold the project row lock so the slot stays valid.
    pub async fn insert(conn: &mut PgConnection, project_id: Uuid, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, project_id, title, description, stage, sort_order,
                               display_index, attachments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(task.id)
        .bind(project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.stage.as_str())
        .bind(task.order)
        .bind(task.index)
        .bind(Json(&task.attachments))
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Updates title and description, returning the updated task
    pub async fn update_details(
        pool: &PgPool,
        project_id: Uuid,
        task_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, updated_at = NOW()
            WHERE project_id = $1 AND id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(project_id)
        .bind(task_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    /// Deletes a task, returning the stage it was in (None if it didn't exist)
    pub async fn delete(conn: &mut PgConnection, project_id: Uuid, task_id: Uuid) -> Result<Option<Stage>, sqlx::Error> {
        let stage: Option<String> = sqlx::query_scalar(
            "DELETE FROM tasks WHERE project_id = $1 AND id = $2 RETURNING stage",
        )
        .bind(project_id)
        .bind(task_id)
        .fetch_optional(conn)
        .await?;

        stage
            .map(|s| s.parse::<Stage>().map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .transpose()
    }

    /// Writes one placement; returns false if the task is not in the project
    pub async fn set_placement(conn: &mut PgConnection, project_id: Uuid, placement: &Placement) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET stage = $3, sort_order = $4, updated_at = NOW()
            WHERE project_id = $1 AND id = $2
            "#,
        )
        .bind(project_id)
        .bind(placement.task_id)
        .bind(placement.stage.as_str())
        .bind(placement.order)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wire_names() {
        assert_eq!(serde_json::to_string(&Stage::Todo).unwrap(), "\"To do\"");
        assert_eq!(serde_json::to_string(&Stage::InProgress).unwrap(), "\"In Progress\"");

        let parsed: Stage = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(parsed, Stage::Done);
    }

    #[test]
    fn test_stage_from_str() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }

        assert_eq!("todo".parse::<Stage>(), Err(UnknownStage("todo".to_string())));
        assert!("requested".parse::<Stage>().is_err());
    }

    #[test]
    fn test_new_task_lands_in_requested() {
        let task = Task::new(
            CreateTask {
                title: "Write docs".to_string(),
                description: "README".to_string(),
            },
            TaskSlot { order: 2, index: 7 },
        );

        assert_eq!(task.stage, Stage::Requested);
        assert_eq!(task.order, 2);
        assert_eq!(task.index, 7);
        assert!(task.attachments.is_empty());
    }

    #[test]
    fn test_task_json_shape() {
        let mut task = Task::new(
            CreateTask {
                title: "Title".to_string(),
                description: "Desc".to_string(),
            },
            TaskSlot { order: 0, index: 0 },
        );
        task.attachments.push(Attachment {
            file_type: Some("image/png".to_string()),
            url: "https://example.com/a.png".to_string(),
        });

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["stage"], "Requested");
        assert_eq!(json["attachments"][0]["fileType"], "image/png");
        assert!(json["createdAt"].is_string());
        assert!(json.get("created_at").is_none());
    }
}
