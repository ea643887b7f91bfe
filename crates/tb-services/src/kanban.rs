//! Kanban board
//!
//! Three ordered lanes, one per task status. A drag within a lane only
//! reorders the local list; a drag across lanes changes the task's status
//! and issues a single backend write. Local moves are applied before the
//! write and are not rolled back if it fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_db::TaskWriter;
use tb_models::{Task, TaskStatus};

use crate::error::KanbanError;

/// A slot on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub lane: TaskStatus,
    pub index: usize,
}

impl Position {
    pub fn new(lane: TaskStatus, index: usize) -> Self {
        Self { lane, index }
    }
}

/// End of a drag gesture; `destination` is `None` when dropped outside any lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub task_id: Id,
    pub source: Position,
    #[serde(default)]
    pub destination: Option<Position>,
}

/// What a move did to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum MoveEffect {
    NoOp,
    Reordered {
        lane: TaskStatus,
    },
    Transferred {
        task_id: Id,
        from: TaskStatus,
        to: TaskStatus,
    },
}

impl MoveEffect {
    /// Whether the move has to be persisted
    pub fn is_status_change(&self) -> bool {
        matches!(self, MoveEffect::Transferred { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    lanes: [Vec<Id>; 3],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place tasks into lanes by status, keeping their order
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut board = Self::new();
        for task in tasks {
            board.lanes[task.status.lane_index()].push(task.id);
        }
        board
    }

    pub fn lane(&self, status: TaskStatus) -> &[Id] {
        &self.lanes[status.lane_index()]
    }

    /// Lanes in board order with their status
    pub fn lanes(&self) -> impl Iterator<Item = (TaskStatus, &[Id])> {
        TaskStatus::ALL
            .into_iter()
            .map(move |status| (status, self.lane(status)))
    }

    pub fn locate(&self, task_id: Id) -> Option<Position> {
        self.lanes().find_map(|(lane, ids)| {
            ids.iter()
                .position(|id| *id == task_id)
                .map(|index| Position { lane, index })
        })
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(Vec::is_empty)
    }

    /// Apply a drag to the local lanes
    ///
    /// Nothing is mutated when the drag has no destination, when it drops the
    /// task where it already is, or when an error is returned.
    pub fn apply_move(&mut self, drag: &DragEnd) -> Result<MoveEffect, KanbanError> {
        let Some(destination) = drag.destination else {
            return Ok(MoveEffect::NoOp);
        };
        if destination == drag.source {
            return Ok(MoveEffect::NoOp);
        }

        let source = drag.source;
        if self.lane(source.lane).get(source.index) != Some(&drag.task_id) {
            return Err(KanbanError::StaleSource {
                task_id: drag.task_id,
                lane: source.lane,
                index: source.index,
            });
        }

        // Length of the destination lane once the task has left its source.
        let available = if source.lane == destination.lane {
            self.lane(destination.lane).len() - 1
        } else {
            self.lane(destination.lane).len()
        };
        if destination.index > available {
            return Err(KanbanError::OutOfRange {
                lane: destination.lane,
                index: destination.index,
                len: available,
            });
        }

        let task_id = self.lanes[source.lane.lane_index()].remove(source.index);
        self.lanes[destination.lane.lane_index()].insert(destination.index, task_id);

        if source.lane == destination.lane {
            Ok(MoveEffect::Reordered {
                lane: destination.lane,
            })
        } else {
            Ok(MoveEffect::Transferred {
                task_id,
                from: source.lane,
                to: destination.lane,
            })
        }
    }
}

/// Applies drags and persists status changes
pub struct KanbanService<W: TaskWriter + ?Sized> {
    writer: Arc<W>,
}

impl<W: TaskWriter + ?Sized> KanbanService<W> {
    pub fn new(writer: Arc<W>) -> Self {
        Self { writer }
    }

    /// Persist the status change of a move, if it has one
    pub async fn commit(&self, effect: &MoveEffect) -> Result<(), KanbanError> {
        let MoveEffect::Transferred { task_id, to, from } = *effect else {
            return Ok(());
        };

        self.writer
            .update_task_status(task_id, to)
            .await
            .map_err(|source| KanbanError::Write {
                task_id,
                status: to,
                source,
            })?;

        tracing::info!(%task_id, %from, %to, "Task moved");
        Ok(())
    }

    /// Apply a drag locally, then persist it
    ///
    /// On a write failure the local move stays applied and the error is
    /// returned; the next refresh restores the backend's view.
    pub async fn on_drag_end(
        &self,
        board: &mut Board,
        drag: &DragEnd,
    ) -> Result<MoveEffect, KanbanError> {
        let effect = board.apply_move(drag)?;
        self.commit(&effect).await?;
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use tb_db::{RepositoryError, RepositoryResult};
    use tb_models::{Assignment, Comment, NewComment, Tag, TagDraft, TaskDraft};
    use uuid::Uuid;

    mock! {
        Writer {}

        #[async_trait]
        impl TaskWriter for Writer {
            async fn update_task_status(&self, task_id: Id, status: TaskStatus) -> RepositoryResult<()>;
            async fn save_task(&self, draft: &TaskDraft) -> RepositoryResult<Task>;
            async fn replace_task_tags(&self, task_id: Id, tag_ids: &[Id]) -> RepositoryResult<()>;
            async fn replace_assignments(
                &self,
                task_id: Id,
                user_ids: &[Id],
                assigned_by: Id,
            ) -> RepositoryResult<Vec<Assignment>>;
            async fn insert_comment(&self, comment: &NewComment) -> RepositoryResult<Comment>;
            async fn save_tag(&self, draft: &TagDraft) -> RepositoryResult<Tag>;
            async fn delete_tag(&self, company_id: Id, tag_id: Id) -> RepositoryResult<()>;
        }
    }

    fn id(n: u128) -> Id {
        Uuid::from_u128(n)
    }

    fn task(n: u128, status: TaskStatus) -> Task {
        let mut t = Task::new(id(n), id(100), format!("Task {}", n));
        t.status = status;
        t
    }

    /// not_started: [1, 2], in_progress: [3], completed: [4, 5]
    fn board() -> Board {
        Board::from_tasks(&[
            task(1, TaskStatus::NotStarted),
            task(3, TaskStatus::InProgress),
            task(2, TaskStatus::NotStarted),
            task(4, TaskStatus::Completed),
            task(5, TaskStatus::Completed),
        ])
    }

    #[test]
    fn test_board_lanes_follow_status() {
        let board = board();
        assert_eq!(board.lane(TaskStatus::NotStarted), &[id(1), id(2)]);
        assert_eq!(board.lane(TaskStatus::InProgress), &[id(3)]);
        assert_eq!(board.lane(TaskStatus::Completed), &[id(4), id(5)]);
        assert_eq!(
            board.locate(id(5)),
            Some(Position::new(TaskStatus::Completed, 1))
        );
        assert_eq!(board.len(), 5);
    }

    #[tokio::test]
    async fn test_noop_drop_makes_no_call() {
        let mut writer = MockWriter::new();
        writer.expect_update_task_status().never();
        let service = KanbanService::new(Arc::new(writer));

        let mut board = board();
        let before = board.clone();
        let drag = DragEnd {
            task_id: id(1),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::NotStarted, 0)),
        };

        let effect = service.on_drag_end(&mut board, &drag).await.unwrap();
        assert_eq!(effect, MoveEffect::NoOp);
        assert_eq!(board, before);
    }

    #[tokio::test]
    async fn test_drop_outside_lanes_is_noop() {
        let mut writer = MockWriter::new();
        writer.expect_update_task_status().never();
        let service = KanbanService::new(Arc::new(writer));

        let mut board = board();
        let before = board.clone();
        let drag = DragEnd {
            task_id: id(3),
            source: Position::new(TaskStatus::InProgress, 0),
            destination: None,
        };

        assert_eq!(
            service.on_drag_end(&mut board, &drag).await.unwrap(),
            MoveEffect::NoOp
        );
        assert_eq!(board, before);
    }

    #[tokio::test]
    async fn test_reorder_within_lane_is_local() {
        let mut writer = MockWriter::new();
        writer.expect_update_task_status().never();
        let service = KanbanService::new(Arc::new(writer));

        let mut board = board();
        let drag = DragEnd {
            task_id: id(1),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::NotStarted, 1)),
        };

        let effect = service.on_drag_end(&mut board, &drag).await.unwrap();
        assert_eq!(
            effect,
            MoveEffect::Reordered {
                lane: TaskStatus::NotStarted
            }
        );
        assert_eq!(board.lane(TaskStatus::NotStarted), &[id(2), id(1)]);
    }

    #[tokio::test]
    async fn test_cross_lane_move_writes_once() {
        let mut writer = MockWriter::new();
        writer
            .expect_update_task_status()
            .with(eq(id(1)), eq(TaskStatus::Completed))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = KanbanService::new(Arc::new(writer));

        let mut board = board();
        let drag = DragEnd {
            task_id: id(1),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::Completed, 2)),
        };

        let effect = service.on_drag_end(&mut board, &drag).await.unwrap();
        assert!(effect.is_status_change());
        assert!(!board.lane(TaskStatus::NotStarted).contains(&id(1)));
        assert_eq!(board.lane(TaskStatus::Completed)[2], id(1));
        assert_eq!(board.lane(TaskStatus::Completed).len(), 3);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_local_move() {
        let mut writer = MockWriter::new();
        writer
            .expect_update_task_status()
            .times(1)
            .returning(|_, _| Err(RepositoryError::Unavailable("timeout".into())));
        let service = KanbanService::new(Arc::new(writer));

        let mut board = board();
        let drag = DragEnd {
            task_id: id(3),
            source: Position::new(TaskStatus::InProgress, 0),
            destination: Some(Position::new(TaskStatus::NotStarted, 0)),
        };

        let err = service.on_drag_end(&mut board, &drag).await.unwrap_err();
        assert!(err.needs_refresh());
        assert_eq!(board.lane(TaskStatus::NotStarted)[0], id(3));
        assert!(board.lane(TaskStatus::InProgress).is_empty());
    }

    #[test]
    fn test_stale_source_rejected() {
        let mut board = board();
        let before = board.clone();
        let drag = DragEnd {
            task_id: id(2),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::Completed, 0)),
        };

        let err = board.apply_move(&drag).unwrap_err();
        assert!(matches!(err, KanbanError::StaleSource { .. }));
        assert!(!err.needs_refresh());
        assert_eq!(board, before);
    }

    #[test]
    fn test_destination_out_of_range() {
        let mut board = board();
        let drag = DragEnd {
            task_id: id(1),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::InProgress, 5)),
        };
        assert!(matches!(
            board.apply_move(&drag),
            Err(KanbanError::OutOfRange { len: 1, .. })
        ));

        let drag = DragEnd {
            task_id: id(1),
            source: Position::new(TaskStatus::NotStarted, 0),
            destination: Some(Position::new(TaskStatus::NotStarted, 2)),
        };
        assert!(matches!(
            board.apply_move(&drag),
            Err(KanbanError::OutOfRange { len: 1, .. })
        ));
    }
}
