//! Company state
//!
//! One `CompanyState` per selected company owns that company's tasks, steps,
//! comments, tags and board. It is only changed by `refresh`, by change
//! events and by kanban moves.
//!
//! Every refresh takes a generation number before it starts fetching. When
//! its results arrive, they are installed only if no newer refresh has been
//! installed in the meantime; otherwise they are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tb_core::result::LoadState;
use tb_core::traits::Id;
use tb_db::Backend;
use tb_models::{Comment, Step, Tag, Task};
use tb_queries::{TagIndex, TaskQuery};
use tokio::sync::RwLock;

use crate::error::KanbanError;
use crate::kanban::{Board, DragEnd, KanbanService, MoveEffect};
use crate::realtime::{ApplyOutcome, ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};
use crate::resolver::Resolver;

/// Everything loaded for one company
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompanySnapshot {
    pub tasks: LoadState<Vec<Task>>,
    pub steps: LoadState<Vec<Step>>,
    pub comments: LoadState<Vec<Comment>>,
    pub tags: LoadState<Vec<Tag>>,
    pub task_tags: LoadState<TagIndex>,
    pub board: Board,
    /// Filter and order the board lanes are built with
    pub board_query: TaskQuery,
    /// Generation of the refresh these collections came from
    pub generation: u64,
}

impl CompanySnapshot {
    fn rebuild_board(&mut self) {
        self.board = match self.tasks.data() {
            Some(tasks) => Board::from_tasks(&self.board_query.apply(tasks, self.task_tags.data())),
            None => Board::default(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Applied { generation: u64 },
    /// A newer refresh was installed first
    Discarded { generation: u64 },
}

/// Results of one load, before installation
#[derive(Debug)]
pub(crate) struct Loaded {
    tasks: LoadState<Vec<Task>>,
    steps: LoadState<Vec<Step>>,
    comments: LoadState<Vec<Comment>>,
    tags: LoadState<Vec<Tag>>,
    task_tags: LoadState<TagIndex>,
}

pub struct CompanyState<B: Backend + ?Sized> {
    company_id: Id,
    backend: Arc<B>,
    resolver: Resolver<B>,
    kanban: KanbanService<B>,
    snapshot: RwLock<CompanySnapshot>,
    generation: AtomicU64,
}

impl<B: Backend + ?Sized> CompanyState<B> {
    pub fn new(company_id: Id, backend: Arc<B>) -> Self {
        Self {
            company_id,
            resolver: Resolver::new(Arc::clone(&backend)),
            kanban: KanbanService::new(Arc::clone(&backend)),
            backend,
            snapshot: RwLock::new(CompanySnapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn company_id(&self) -> Id {
        self.company_id
    }

    pub fn resolver(&self) -> &Resolver<B> {
        &self.resolver
    }

    /// Copy of the current collections
    pub async fn snapshot(&self) -> CompanySnapshot {
        self.snapshot.read().await.clone()
    }

    /// Run `f` against the current collections without copying them
    pub async fn read<R>(&self, f: impl FnOnce(&CompanySnapshot) -> R) -> R {
        f(&*self.snapshot.read().await)
    }

    /// Reload every collection from the backend
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.next_generation();
        let loaded = self.load().await;
        self.install(generation, loaded).await
    }

    /// Refresh unless tasks have been loaded (or failed) before
    pub async fn ensure_loaded(&self) {
        let needs_load = matches!(self.snapshot.read().await.tasks, LoadState::NotLoaded);
        if needs_load {
            self.refresh().await;
        }
    }

    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) async fn load(&self) -> Loaded {
        let company_id = self.company_id;

        let (tasks, steps, task_tags) = match self.backend.fetch_tasks(company_id).await {
            Ok(tasks) => {
                let ids: Vec<Id> = tasks.iter().map(|t| t.id).collect();
                let steps = if ids.is_empty() {
                    LoadState::loaded(Vec::new())
                } else {
                    self.backend.fetch_steps(&ids).await.into()
                };
                let task_tags = self.resolver.resolve_tags(&ids).await.into();
                (LoadState::loaded(tasks), steps, task_tags)
            }
            Err(err) => {
                tracing::warn!(%company_id, error = %err, "Failed to load tasks");
                let reason = err.to_string();
                (
                    LoadState::failed(reason.clone()),
                    LoadState::failed(reason.clone()),
                    LoadState::failed(reason),
                )
            }
        };

        let comments = self.backend.fetch_comments(company_id).await.into();
        let tags = self.backend.fetch_tags(company_id).await.into();

        Loaded {
            tasks,
            steps,
            comments,
            tags,
            task_tags,
        }
    }

    pub(crate) async fn install(&self, generation: u64, loaded: Loaded) -> RefreshOutcome {
        let mut snapshot = self.snapshot.write().await;
        if generation <= snapshot.generation {
            tracing::debug!(
                company_id = %self.company_id,
                generation,
                current = snapshot.generation,
                "Discarding stale refresh"
            );
            return RefreshOutcome::Discarded { generation };
        }

        snapshot.tasks = loaded.tasks;
        snapshot.steps = loaded.steps;
        snapshot.comments = loaded.comments;
        snapshot.tags = loaded.tags;
        snapshot.task_tags = loaded.task_tags;
        snapshot.generation = generation;
        snapshot.rebuild_board();

        tracing::debug!(company_id = %self.company_id, generation, "Company state refreshed");
        RefreshOutcome::Applied { generation }
    }

    /// Run a query against the loaded tasks
    ///
    /// A failed task load is returned as such. With an active tag filter, a
    /// failed tag resolution is reported too instead of matching nothing.
    pub async fn query(&self, query: &TaskQuery) -> LoadState<Vec<Task>> {
        let snapshot = self.snapshot.read().await;
        let tasks = match &snapshot.tasks {
            LoadState::Loaded { data } => data,
            LoadState::NotLoaded => return LoadState::NotLoaded,
            LoadState::Failed { reason } => return LoadState::failed(reason.clone()),
        };

        if query.filter.has_tag_filter() {
            if let LoadState::Failed { reason } = &snapshot.task_tags {
                return LoadState::failed(reason.clone());
            }
        }

        LoadState::loaded(query.apply(tasks, snapshot.task_tags.data()))
    }

    /// Rebuild the board from the tasks matching `query`
    ///
    /// Local lane order from earlier drags is discarded.
    pub async fn set_board_query(&self, query: TaskQuery) -> Board {
        let mut snapshot = self.snapshot.write().await;
        snapshot.board_query = query;
        snapshot.rebuild_board();
        snapshot.board.clone()
    }

    /// Apply a drag to the board, persist it, then reload
    ///
    /// The task's status is updated in memory together with the board. If the
    /// backend rejects the change the local move is kept, the state is
    /// reloaded and the write error is returned.
    pub async fn move_task(&self, drag: &DragEnd) -> Result<MoveEffect, KanbanError> {
        let effect = {
            let mut snapshot = self.snapshot.write().await;
            let effect = snapshot.board.apply_move(drag)?;
            if let MoveEffect::Transferred { task_id, to, .. } = effect {
                if let Some(task) = snapshot
                    .tasks
                    .data_mut()
                    .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
                {
                    task.status = to;
                }
            }
            effect
        };

        if !effect.is_status_change() {
            return Ok(effect);
        }

        let result = self.kanban.commit(&effect).await;
        if let Err(err) = &result {
            tracing::warn!(company_id = %self.company_id, error = %err, "Kanban move not persisted");
        }
        self.refresh().await;
        result.map(|_| effect)
    }

    /// Apply one change event
    ///
    /// A patch takes a new generation, so a refresh that started before the
    /// change can no longer install over it. Task inserts and updates also
    /// re-resolve that task's tags.
    pub async fn apply_change(&self, event: &ChangeEvent) -> ApplyOutcome {
        if event.company_id != self.company_id {
            return ApplyOutcome::Ignored;
        }

        let patched = {
            let mut snapshot = self.snapshot.write().await;
            let patched = patch(&mut snapshot, event);
            if patched {
                snapshot.generation = self.next_generation();
                match (event.table, event.kind) {
                    (ChangeTable::Tasks, ChangeKind::Delete) => {
                        if let (Some(task_id), Some(index)) =
                            (record_id(event), snapshot.task_tags.data_mut())
                        {
                            index.remove(&task_id);
                        }
                        snapshot.rebuild_board();
                    }
                    (ChangeTable::Tasks, _) => snapshot.rebuild_board(),
                    // A deleted tag takes its task links with it
                    (ChangeTable::Tags, ChangeKind::Delete) => {
                        if let (Some(tag_id), Some(index)) =
                            (record_id(event), snapshot.task_tags.data_mut())
                        {
                            for tags in index.values_mut() {
                                tags.remove(&tag_id);
                            }
                        }
                        snapshot.rebuild_board();
                    }
                    _ => {}
                }
            }
            patched
        };

        if !patched {
            self.refresh().await;
            return ApplyOutcome::Refreshed;
        }

        if event.table == ChangeTable::Tasks && event.kind != ChangeKind::Delete {
            if let Some(task_id) = record_id(event) {
                if !self.refresh_task_tags(task_id).await {
                    self.refresh().await;
                    return ApplyOutcome::Refreshed;
                }
            }
        }

        ApplyOutcome::Patched
    }

    /// Re-resolve one task's tags into the index; false when resolution failed
    async fn refresh_task_tags(&self, task_id: Id) -> bool {
        let mut resolved = match self.resolver.resolve_tags(&[task_id]).await {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(
                    company_id = %self.company_id,
                    %task_id,
                    error = %err,
                    "Tag resolution after change failed, reloading"
                );
                return false;
            }
        };

        let mut snapshot = self.snapshot.write().await;
        if let Some(index) = snapshot.task_tags.data_mut() {
            index.insert(task_id, resolved.remove(&task_id).unwrap_or_default());
            snapshot.rebuild_board();
        }
        true
    }
}

fn record_id(event: &ChangeEvent) -> Option<Id> {
    let record = event.record.as_ref()?;
    RowId::deserialize(record).ok().map(|row| row.id)
}

/// Patch one row into the snapshot; false when the event cannot be applied
fn patch(snapshot: &mut CompanySnapshot, event: &ChangeEvent) -> bool {
    let Some(record) = &event.record else {
        return false;
    };
    match event.table {
        ChangeTable::Tasks => patch_rows(snapshot.tasks.data_mut(), event.kind, record, |t: &Task| t.id),
        ChangeTable::Steps => patch_rows(snapshot.steps.data_mut(), event.kind, record, |s: &Step| s.id),
        ChangeTable::Comments => {
            patch_rows(snapshot.comments.data_mut(), event.kind, record, |c: &Comment| c.id)
        }
        ChangeTable::Tags => patch_rows(snapshot.tags.data_mut(), event.kind, record, |t: &Tag| t.id),
    }
}

#[derive(Deserialize)]
struct RowId {
    id: Id,
}

fn patch_rows<T, F>(
    rows: Option<&mut Vec<T>>,
    kind: ChangeKind,
    record: &serde_json::Value,
    id_of: F,
) -> bool
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> Id,
{
    let Some(rows) = rows else {
        return false;
    };

    match kind {
        ChangeKind::Delete => {
            let Ok(RowId { id }) = RowId::deserialize(record) else {
                return false;
            };
            rows.retain(|row| id_of(row) != id);
            true
        }
        ChangeKind::Insert | ChangeKind::Update => {
            let Ok(row) = serde_json::from_value::<T>(record.clone()) else {
                return false;
            };
            let id = id_of(&row);
            match rows.iter_mut().find(|existing| id_of(existing) == id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
            true
        }
    }
}

/// Company states keyed by company, created on first use
///
/// Each new state gets a listener on the shared change feed.
pub struct StateRegistry<B: Backend + ?Sized + 'static> {
    backend: Arc<B>,
    feed: ChangeFeed,
    states: RwLock<HashMap<Id, Arc<CompanyState<B>>>>,
}

impl<B: Backend + ?Sized + 'static> StateRegistry<B> {
    pub fn new(backend: Arc<B>, feed: ChangeFeed) -> Self {
        Self {
            backend,
            feed,
            states: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn get(&self, company_id: Id) -> Option<Arc<CompanyState<B>>> {
        self.states.read().await.get(&company_id).cloned()
    }

    pub async fn get_or_create(&self, company_id: Id) -> Arc<CompanyState<B>> {
        if let Some(state) = self.get(company_id).await {
            return state;
        }

        let mut states = self.states.write().await;
        if let Some(state) = states.get(&company_id) {
            return Arc::clone(state);
        }

        let state = Arc::new(CompanyState::new(company_id, Arc::clone(&self.backend)));
        crate::realtime::spawn_listener(Arc::clone(&state), self.feed.subscribe());
        states.insert(company_id, Arc::clone(&state));
        tracing::info!(%company_id, "Company state created");
        state
    }

    /// Loaded state for a company, refreshing it on first use
    pub async fn loaded(&self, company_id: Id) -> Arc<CompanyState<B>> {
        let state = self.get_or_create(company_id).await;
        state.ensure_loaded().await;
        state
    }
}
