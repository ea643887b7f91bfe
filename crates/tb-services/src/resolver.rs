//! Tag and assignee resolution
//!
//! Turns a list of task ids into task -> tag ids and task -> user ids
//! mappings. Each mapping costs exactly one batched backend read, and an
//! empty id list costs none.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_db::JoinSource;
use tb_queries::TagIndex;

use crate::error::ResolveError;

/// Task -> assigned user ids
pub type AssigneeIndex = HashMap<Id, HashSet<Id>>;

/// Which assignments count as "assigned"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeScope {
    /// Any assignment regardless of its status
    #[default]
    Any,
    /// Only assignments the user accepted ("who is working on this")
    AcceptedOnly,
}

/// Both mappings for one set of tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLinks {
    pub tags: TagIndex,
    pub assignees: AssigneeIndex,
}

pub struct Resolver<J: JoinSource + ?Sized> {
    source: Arc<J>,
}

impl<J: JoinSource + ?Sized> Clone for Resolver<J> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<J: JoinSource + ?Sized> Resolver<J> {
    pub fn new(source: Arc<J>) -> Self {
        Self { source }
    }

    /// Tag ids per task; every requested task gets an entry
    pub async fn resolve_tags(&self, task_ids: &[Id]) -> Result<TagIndex, ResolveError> {
        let (ids, mut index) = prepare(task_ids);
        if ids.is_empty() {
            return Ok(index);
        }

        let links = self
            .source
            .fetch_task_tags(&ids)
            .await
            .map_err(ResolveError::tags)?;

        for link in links {
            if let Some(tags) = index.get_mut(&link.task_id) {
                tags.insert(link.tag_id);
            }
        }

        tracing::debug!(tasks = ids.len(), "Resolved task tags");
        Ok(index)
    }

    /// Assigned user ids per task; every requested task gets an entry
    pub async fn resolve_assignees(
        &self,
        task_ids: &[Id],
        scope: AssigneeScope,
    ) -> Result<AssigneeIndex, ResolveError> {
        let (ids, mut index) = prepare(task_ids);
        if ids.is_empty() {
            return Ok(index);
        }

        let assignments = self
            .source
            .fetch_assignments(&ids)
            .await
            .map_err(ResolveError::assignees)?;

        for assignment in assignments {
            if scope == AssigneeScope::AcceptedOnly && !assignment.is_accepted() {
                continue;
            }
            if let Some(users) = index.get_mut(&assignment.task_id) {
                users.insert(assignment.user_id);
            }
        }

        tracing::debug!(tasks = ids.len(), ?scope, "Resolved task assignees");
        Ok(index)
    }

    /// Both mappings, fetched concurrently
    pub async fn resolve(
        &self,
        task_ids: &[Id],
        scope: AssigneeScope,
    ) -> Result<TaskLinks, ResolveError> {
        let (tags, assignees) = tokio::join!(
            self.resolve_tags(task_ids),
            self.resolve_assignees(task_ids, scope)
        );
        Ok(TaskLinks {
            tags: tags?,
            assignees: assignees?,
        })
    }
}

/// Deduplicated ids in input order, plus an index with an empty set per id
fn prepare(task_ids: &[Id]) -> (Vec<Id>, HashMap<Id, HashSet<Id>>) {
    let mut seen = HashSet::with_capacity(task_ids.len());
    let ids: Vec<Id> = task_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    let index = ids.iter().map(|id| (*id, HashSet::new())).collect();
    (ids, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_db::{MemoryBackend, Operation};
    use tb_models::{Assignment, AssignmentStatus};
    use uuid::Uuid;

    fn id(n: u128) -> Id {
        Uuid::from_u128(n)
    }

    async fn backend() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.tag_task(id(1), id(100)).await;
        backend.tag_task(id(1), id(101)).await;
        backend.tag_task(id(3), id(100)).await;
        backend.tag_task(id(9), id(102)).await;

        for (n, task, user, status) in [
            (10, 1, 50, AssignmentStatus::Accepted),
            (11, 1, 51, AssignmentStatus::Pending),
            (12, 2, 52, AssignmentStatus::Rejected),
        ] {
            backend
                .insert_assignment(Assignment {
                    id: id(n),
                    task_id: id(task),
                    user_id: id(user),
                    assigned_by: id(1000),
                    assigned_at: None,
                    status,
                })
                .await;
        }
        backend
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let backend = backend().await;
        let resolver = Resolver::new(backend.clone());

        let links = resolver.resolve(&[], AssigneeScope::Any).await.unwrap();
        assert!(links.tags.is_empty());
        assert!(links.assignees.is_empty());
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_every_task_gets_an_entry() {
        let backend = backend().await;
        let resolver = Resolver::new(backend.clone());

        let tags = resolver.resolve_tags(&[id(1), id(2), id(3)]).await.unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[&id(1)], [id(100), id(101)].into_iter().collect::<HashSet<_>>());
        assert!(tags[&id(2)].is_empty());
        assert!(!tags.contains_key(&id(9)));
        assert_eq!(backend.call_count(Operation::FetchTaskTags).await, 1);
    }

    #[tokio::test]
    async fn test_one_round_trip_per_mapping() {
        let backend = backend().await;
        let resolver = Resolver::new(backend.clone());

        let ids: Vec<Id> = (1..=40).map(id).collect();
        resolver.resolve(&ids, AssigneeScope::Any).await.unwrap();
        assert_eq!(backend.call_count(Operation::FetchTaskTags).await, 1);
        assert_eq!(backend.call_count(Operation::FetchAssignments).await, 1);
    }

    #[tokio::test]
    async fn test_assignee_scope() {
        let backend = backend().await;
        let resolver = Resolver::new(backend.clone());

        let any = resolver
            .resolve_assignees(&[id(1), id(2)], AssigneeScope::Any)
            .await
            .unwrap();
        assert_eq!(any[&id(1)].len(), 2);
        assert_eq!(any[&id(2)].len(), 1);

        let accepted = resolver
            .resolve_assignees(&[id(1), id(2)], AssigneeScope::AcceptedOnly)
            .await
            .unwrap();
        assert_eq!(accepted[&id(1)], [id(50)].into_iter().collect::<HashSet<_>>());
        assert!(accepted[&id(2)].is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_empty_result() {
        let backend = backend().await;
        backend.fail(Operation::FetchTaskTags).await;
        let resolver = Resolver::new(backend.clone());

        let err = resolver.resolve_tags(&[id(1)]).await.unwrap_err();
        assert!(err.to_string().contains("task tags"));

        let err = resolver.resolve(&[id(1)], AssigneeScope::Any).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_collapsed() {
        let backend = backend().await;
        let resolver = Resolver::new(backend.clone());

        let tags = resolver.resolve_tags(&[id(3), id(3)]).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[&id(3)].len(), 1);
    }
}
