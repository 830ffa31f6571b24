/// Task reordering engine
///
/// Computes `stage`/`order` assignments for the tasks of one project. The
/// engine is storage independent: storage backends call into it and then
/// persist the resulting [`Placement`]s atomically.
///
/// # Invariant
///
/// For a given project, tasks sharing a stage have contiguous `order` values
/// starting at 0. It is restored by:
///
/// - [`next_slot`] when a task is created (per-stage counter),
/// - [`compact_stage`] when a task is deleted,
/// - [`BoardSync::placements`] when the client submits the whole board.
///
/// A board sync that lists only some tasks leaves the others where they
/// were, so their columns may end up with gaps or repeated orders until
/// the next full submission.
///
/// # Board Sync Payload
///
/// After a drag-and-drop the client sends every column, keyed by an
/// arbitrary column id:
///
/// ```json
/// {
///   "7c1e...": { "name": "Requested", "items": [{ "_id": "a1..." }, { "_id": "b2..." }] },
///   "9f3a...": { "name": "Done", "items": [{ "_id": "c3..." }] }
/// }
/// ```
///
/// Each item's position in its column becomes its `order`.
///
/// # Example
///
/// ```
/// use taskboard_shared::board::BoardSync;
/// use taskboard_shared::models::task::Stage;
///
/// let sync: BoardSync = serde_json::from_str(r#"{
///     "col-a": { "name": "To do", "items": [{ "_id": "3f2b8a38-5bf4-4d3c-9f11-3c1c62a1c0de" }] }
/// }"#).unwrap();
///
/// let placements = sync.placements().unwrap();
/// assert_eq!(placements[0].stage, Stage::Todo);
/// assert_eq!(placements[0].order, 0);
/// ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::models::task::{Stage, Task, UnknownStage};

/// Errors produced while interpreting or applying a board
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A task id is not a valid identifier
    #[error("Invalid task ID: {0}")]
    InvalidIdentifier(String),

    /// A column name is not a known stage
    #[error(transparent)]
    UnknownStage(#[from] UnknownStage),

    /// The same task was placed twice
    #[error("Task {0} appears more than once on the board")]
    DuplicateTask(Uuid),

    /// Two columns carry the same stage name
    #[error("Stage {0} appears more than once on the board")]
    DuplicateStage(Stage),

    /// A move referenced a position outside a column
    #[error("Position {position} is out of range for stage {stage}")]
    PositionOutOfRange { stage: Stage, position: usize },

    /// A placement referenced a task that is not in the project
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),
}

/// One `(task, stage, order)` assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub task_id: Uuid,
    pub stage: Stage,
    pub order: i32,
}

/// Where a newly created task goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSlot {
    /// Position at the end of the `Requested` column
    pub order: i32,

    /// Next unused display index
    pub index: i32,
}

/// A task reference inside a submitted column
///
/// Only the id is read; clients send whole task objects and the remaining
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardItem {
    #[serde(alias = "_id")]
    pub id: String,
}

/// One submitted column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    /// Stage name, e.g. "In Progress"
    pub name: String,

    /// Tasks top to bottom
    #[serde(default)]
    pub items: Vec<BoardItem>,
}

/// Full-board snapshot submitted by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardSync {
    pub columns: BTreeMap<String, BoardColumn>,
}

impl BoardSync {
    /// Flattens the board into placements
    ///
    /// # Errors
    ///
    /// - `UnknownStage` for a column name that is not a stage
    /// - `DuplicateStage` when two columns name the same stage
    /// - `InvalidIdentifier` for an item id that is not a UUID
    /// - `DuplicateTask` when a task appears more than once
    pub fn placements(&self) -> Result<Vec<Placement>, BoardError> {
        let mut seen_stages = HashSet::new();
        let mut seen_tasks = HashSet::new();
        let mut placements = Vec::new();

        for column in self.columns.values() {
            let stage: Stage = column.name.parse()?;
            if !seen_stages.insert(stage) {
                return Err(BoardError::DuplicateStage(stage));
            }

            for (position, item) in column.items.iter().enumerate() {
                let task_id = Uuid::parse_str(&item.id)
                    .map_err(|_| BoardError::InvalidIdentifier(item.id.clone()))?;

                if !seen_tasks.insert(task_id) {
                    return Err(BoardError::DuplicateTask(task_id));
                }

                placements.push(Placement {
                    task_id,
                    stage,
                    order: position as i32,
                });
            }
        }

        Ok(placements)
    }
}

/// Server-side view of a project's columns
///
/// Mirrors what the client renders: one column per stage in board order,
/// each holding task ids sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    columns: [Vec<Uuid>; 4],
}

fn column_slot(stage: Stage) -> usize {
    match stage {
        Stage::Requested => 0,
        Stage::Todo => 1,
        Stage::InProgress => 2,
        Stage::Done => 3,
    }
}

impl Board {
    /// Groups tasks into columns, sorted by `order` (ties broken by `index`)
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut columns: [Vec<Uuid>; 4] = Default::default();

        for stage in Stage::ALL {
            let mut in_stage: Vec<&Task> = tasks.iter().filter(|t| t.stage == stage).collect();
            in_stage.sort_by_key(|t| (t.order, t.index));
            columns[column_slot(stage)] = in_stage.into_iter().map(|t| t.id).collect();
        }

        Self { columns }
    }

    /// Task ids of one column, top to bottom
    pub fn column(&self, stage: Stage) -> &[Uuid] {
        &self.columns[column_slot(stage)]
    }

    /// Moves the task at `from_position` in `from` to `to_position` in `to`
    ///
    /// Same-column moves are allowed. `to_position` is interpreted after the
    /// task has been removed from its source column.
    ///
    /// Returns the id of the moved task.
    pub fn move_task(
        &mut self,
        from: Stage,
        from_position: usize,
        to: Stage,
        to_position: usize,
    ) -> Result<Uuid, BoardError> {
        let source_len = self.column(from).len();
        if from_position >= source_len {
            return Err(BoardError::PositionOutOfRange {
                stage: from,
                position: from_position,
            });
        }

        let dest_len = if from == to {
            source_len - 1
        } else {
            self.column(to).len()
        };
        if to_position > dest_len {
            return Err(BoardError::PositionOutOfRange {
                stage: to,
                position: to_position,
            });
        }

        let task_id = self.columns[column_slot(from)].remove(from_position);
        self.columns[column_slot(to)].insert(to_position, task_id);

        Ok(task_id)
    }

    /// Placements for every task on the board
    pub fn placements(&self) -> Vec<Placement> {
        Stage::ALL
            .into_iter()
            .flat_map(|stage| {
                self.column(stage)
                    .iter()
                    .enumerate()
                    .map(move |(position, task_id)| Placement {
                        task_id: *task_id,
                        stage,
                        order: position as i32,
                    })
            })
            .collect()
    }

    /// Renders the board as the payload a client would submit
    pub fn to_sync(&self) -> BoardSync {
        let columns = Stage::ALL
            .into_iter()
            .enumerate()
            .map(|(slot, stage)| {
                let column = BoardColumn {
                    name: stage.as_str().to_string(),
                    items: self
                        .column(stage)
                        .iter()
                        .map(|id| BoardItem { id: id.to_string() })
                        .collect(),
                };
                (format!("column-{}", slot), column)
            })
            .collect();

        BoardSync { columns }
    }
}

/// Slot for a task about to be created
///
/// `order` is one past the highest order in `Requested` (the column's size
/// while it is contiguous); `index` is one past the highest index in the
/// project, or 0 for the first task.
pub fn next_slot(tasks: &[Task]) -> TaskSlot {
    let order = tasks
        .iter()
        .filter(|t| t.stage == Stage::Requested)
        .map(|t| t.order + 1)
        .max()
        .unwrap_or(0);

    let index = tasks.iter().map(|t| t.index + 1).max().unwrap_or(0);

    TaskSlot { order, index }
}

/// Placements that renumber `stage` to `0..n`, keeping relative order
///
/// Only tasks whose order actually changes are returned.
pub fn compact_stage(tasks: &[Task], stage: Stage) -> Vec<Placement> {
    let mut in_stage: Vec<&Task> = tasks.iter().filter(|t| t.stage == stage).collect();
    in_stage.sort_by_key(|t| (t.order, t.index));

    in_stage
        .into_iter()
        .enumerate()
        .filter(|(position, task)| task.order != *position as i32)
        .map(|(position, task)| Placement {
            task_id: task.id,
            stage,
            order: position as i32,
        })
        .collect()
}

/// Applies placements to an in-memory task list, all or nothing
///
/// Every placement is resolved before anything is written, so a missing
/// task leaves `tasks` untouched.
pub fn apply_placements(tasks: &mut [Task], placements: &[Placement]) -> Result<(), BoardError> {
    let mut targets = Vec::with_capacity(placements.len());
    for placement in placements {
        let position = tasks
            .iter()
            .position(|t| t.id == placement.task_id)
            .ok_or(BoardError::TaskNotFound(placement.task_id))?;
        targets.push((position, placement));
    }

    let now = Utc::now();
    for (position, placement) in targets {
        let task = &mut tasks[position];
        task.stage = placement.stage;
        task.order = placement.order;
        task.updated_at = now;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTask;
    use serde_json::json;

    fn task(stage: Stage, order: i32, index: i32) -> Task {
        let mut task = Task::new(
            CreateTask {
                title: format!("task {}", index),
                description: "desc".to_string(),
            },
            TaskSlot { order, index },
        );
        task.stage = stage;
        task
    }

    fn order_of(tasks: &[Task], id: Uuid) -> (Stage, i32) {
        let task = tasks.iter().find(|t| t.id == id).unwrap();
        (task.stage, task.order)
    }

    #[test]
    fn test_placements_from_client_payload() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let sync: BoardSync = serde_json::from_value(json!({
            "0b7d": { "name": "Requested", "items": [
                { "_id": a.to_string(), "title": "A", "stage": "Requested", "order": 4 },
                { "_id": b.to_string(), "title": "B" }
            ]},
            "1c9e": { "name": "Done", "items": [{ "id": c.to_string() }] },
            "2f00": { "name": "To do", "items": [] }
        }))
        .unwrap();

        let placements = sync.placements().unwrap();

        assert_eq!(
            placements,
            vec![
                Placement { task_id: a, stage: Stage::Requested, order: 0 },
                Placement { task_id: b, stage: Stage::Requested, order: 1 },
                Placement { task_id: c, stage: Stage::Done, order: 0 },
            ]
        );
    }

    #[test]
    fn test_placements_empty_board() {
        let sync: BoardSync = serde_json::from_value(json!({})).unwrap();
        assert!(sync.placements().unwrap().is_empty());
    }

    #[test]
    fn test_placements_reject_unknown_stage() {
        let sync: BoardSync = serde_json::from_value(json!({
            "x": { "name": "Backlog", "items": [] }
        }))
        .unwrap();

        assert_eq!(
            sync.placements(),
            Err(BoardError::UnknownStage(UnknownStage("Backlog".to_string())))
        );
    }

    #[test]
    fn test_placements_reject_malformed_id() {
        let sync: BoardSync = serde_json::from_value(json!({
            "x": { "name": "Done", "items": [{ "_id": "507f1f77bcf86cd799439011" }] }
        }))
        .unwrap();

        assert_eq!(
            sync.placements(),
            Err(BoardError::InvalidIdentifier("507f1f77bcf86cd799439011".to_string()))
        );
    }

    #[test]
    fn test_placements_reject_duplicates() {
        let id = Uuid::new_v4().to_string();

        let twice: BoardSync = serde_json::from_value(json!({
            "x": { "name": "Done", "items": [{ "_id": id }] },
            "y": { "name": "To do", "items": [{ "_id": id }] }
        }))
        .unwrap();
        assert!(matches!(twice.placements(), Err(BoardError::DuplicateTask(_))));

        let same_stage: BoardSync = serde_json::from_value(json!({
            "x": { "name": "Done", "items": [] },
            "y": { "name": "Done", "items": [] }
        }))
        .unwrap();
        assert_eq!(same_stage.placements(), Err(BoardError::DuplicateStage(Stage::Done)));
    }

    #[test]
    fn test_board_from_tasks_sorts_columns() {
        let t0 = task(Stage::Todo, 1, 0);
        let t1 = task(Stage::Todo, 0, 1);
        let t2 = task(Stage::Done, 0, 2);
        // Colliding orders fall back to index
        let t3 = task(Stage::Requested, 0, 4);
        let t4 = task(Stage::Requested, 0, 3);

        let board = Board::from_tasks(&[t0.clone(), t1.clone(), t2.clone(), t3.clone(), t4.clone()]);

        assert_eq!(board.column(Stage::Todo), &[t1.id, t0.id]);
        assert_eq!(board.column(Stage::Done), &[t2.id]);
        assert_eq!(board.column(Stage::Requested), &[t4.id, t3.id]);
        assert!(board.column(Stage::InProgress).is_empty());
    }

    #[test]
    fn test_cross_column_move_shifts_neighbours() {
        let mut tasks = vec![
            task(Stage::Requested, 0, 0),
            task(Stage::Requested, 1, 1),
            task(Stage::Requested, 2, 2),
            task(Stage::Requested, 3, 3),
            task(Stage::Todo, 0, 4),
            task(Stage::Todo, 1, 5),
        ];
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let mut board = Board::from_tasks(&tasks);
        let moved = board.move_task(Stage::Requested, 2, Stage::Todo, 0).unwrap();
        assert_eq!(moved, ids[2]);

        apply_placements(&mut tasks, &board.placements()).unwrap();

        assert_eq!(order_of(&tasks, ids[2]), (Stage::Todo, 0));
        // Before the removal point: unchanged
        assert_eq!(order_of(&tasks, ids[0]), (Stage::Requested, 0));
        assert_eq!(order_of(&tasks, ids[1]), (Stage::Requested, 1));
        // After the removal point: decremented
        assert_eq!(order_of(&tasks, ids[3]), (Stage::Requested, 2));
        // At/after the insertion point: incremented
        assert_eq!(order_of(&tasks, ids[4]), (Stage::Todo, 1));
        assert_eq!(order_of(&tasks, ids[5]), (Stage::Todo, 2));
    }

    #[test]
    fn test_same_column_move() {
        let mut tasks = vec![
            task(Stage::Done, 0, 0),
            task(Stage::Done, 1, 1),
            task(Stage::Done, 2, 2),
        ];
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let mut board = Board::from_tasks(&tasks);
        board.move_task(Stage::Done, 0, Stage::Done, 2).unwrap();
        apply_placements(&mut tasks, &board.placements()).unwrap();

        assert_eq!(board.column(Stage::Done), &[ids[1], ids[2], ids[0]]);
        assert_eq!(order_of(&tasks, ids[0]), (Stage::Done, 2));
        assert_eq!(order_of(&tasks, ids[1]), (Stage::Done, 0));
        assert_eq!(order_of(&tasks, ids[2]), (Stage::Done, 1));
    }

    #[test]
    fn test_move_out_of_range() {
        let tasks = vec![task(Stage::Done, 0, 0)];
        let mut board = Board::from_tasks(&tasks);

        assert_eq!(
            board.move_task(Stage::Done, 1, Stage::Todo, 0),
            Err(BoardError::PositionOutOfRange { stage: Stage::Done, position: 1 })
        );
        assert_eq!(
            board.move_task(Stage::Done, 0, Stage::Todo, 1),
            Err(BoardError::PositionOutOfRange { stage: Stage::Todo, position: 1 })
        );
        // Same column of one: only position 0 exists after removal
        assert!(board.move_task(Stage::Done, 0, Stage::Done, 1).is_err());
        assert_eq!(board, Board::from_tasks(&tasks));
    }

    #[test]
    fn test_to_sync_matches_board_placements() {
        let tasks = vec![
            task(Stage::Requested, 0, 0),
            task(Stage::InProgress, 0, 1),
            task(Stage::InProgress, 1, 2),
        ];
        let board = Board::from_tasks(&tasks);

        let sync = board.to_sync();
        assert_eq!(sync.columns.len(), 4);
        assert_eq!(sync.placements().unwrap(), board.placements());
    }

    #[test]
    fn test_next_slot() {
        assert_eq!(next_slot(&[]), TaskSlot { order: 0, index: 0 });

        let tasks = vec![
            task(Stage::Requested, 0, 0),
            task(Stage::Requested, 1, 3),
            task(Stage::Todo, 0, 1),
            task(Stage::Done, 5, 2),
        ];

        // Order counts only the Requested column; index is max + 1
        assert_eq!(next_slot(&tasks), TaskSlot { order: 2, index: 4 });
    }

    #[test]
    fn test_next_slot_after_requested_emptied() {
        let tasks = vec![task(Stage::Done, 0, 0), task(Stage::Done, 1, 1)];
        assert_eq!(next_slot(&tasks), TaskSlot { order: 0, index: 2 });
    }

    #[test]
    fn test_compact_stage() {
        let tasks = vec![
            task(Stage::Todo, 0, 0),
            task(Stage::Todo, 2, 1),
            task(Stage::Todo, 3, 2),
            task(Stage::Done, 4, 3),
        ];

        let placements = compact_stage(&tasks, Stage::Todo);

        assert_eq!(
            placements,
            vec![
                Placement { task_id: tasks[1].id, stage: Stage::Todo, order: 1 },
                Placement { task_id: tasks[2].id, stage: Stage::Todo, order: 2 },
            ]
        );
        assert!(compact_stage(&tasks, Stage::Requested).is_empty());
    }

    #[test]
    fn test_apply_placements_is_all_or_nothing() {
        let mut tasks = vec![task(Stage::Requested, 0, 0)];
        let before = tasks.clone();
        let missing = Uuid::new_v4();

        let result = apply_placements(
            &mut tasks,
            &[
                Placement { task_id: before[0].id, stage: Stage::Done, order: 0 },
                Placement { task_id: missing, stage: Stage::Done, order: 1 },
            ],
        );

        assert_eq!(result, Err(BoardError::TaskNotFound(missing)));
        assert_eq!(tasks, before);
    }

    #[test]
    fn test_partial_sync_leaves_unlisted_tasks_in_place() {
        let mut tasks = vec![task(Stage::Requested, 0, 0), task(Stage::Requested, 1, 1)];
        let listed = tasks[1].id;
        let unlisted = tasks[0].id;

        apply_placements(
            &mut tasks,
            &[Placement { task_id: listed, stage: Stage::Requested, order: 0 }],
        )
        .unwrap();

        // Both now claim order 0 until the whole board is submitted again
        assert_eq!(order_of(&tasks, listed), (Stage::Requested, 0));
        assert_eq!(order_of(&tasks, unlisted), (Stage::Requested, 0));
    }
}
