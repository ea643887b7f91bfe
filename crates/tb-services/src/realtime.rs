//! Realtime change feed
//!
//! Row changes to tasks, steps, comments and tags are broadcast to every company
//! state. A state patches the changed row in place when the event carries a
//! usable payload and falls back to a full refresh otherwise.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_db::Backend;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::state::CompanyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTable {
    Tasks,
    Steps,
    Comments,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change
///
/// `record` is the new row for inserts and updates, and at least `{"id": ...}`
/// for deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    pub company_id: Id,
    #[serde(default)]
    pub record: Option<serde_json::Value>,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, kind: ChangeKind, company_id: Id) -> Self {
        Self {
            table,
            kind,
            company_id,
            record: None,
        }
    }

    /// Attach a row payload; a row that fails to serialize is left out
    pub fn with_record<T: Serialize>(mut self, record: &T) -> Self {
        self.record = serde_json::to_value(record).ok();
        self
    }
}

/// What applying an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Event belongs to another company
    Ignored,
    /// Row patched into memory
    Patched,
    /// Payload missing or unusable; collections were reloaded
    Refreshed,
}

/// Broadcast channel of change events
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every listener; returns how many received it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        // No listener is not an error: nobody has a state open.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Apply events from `events` to `state` until the feed closes
pub fn spawn_listener<B>(
    state: Arc<CompanyState<B>>,
    mut events: broadcast::Receiver<ChangeEvent>,
) -> JoinHandle<()>
where
    B: Backend + ?Sized + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let outcome = state.apply_change(&event).await;
                    tracing::debug!(
                        company_id = %state.company_id(),
                        table = ?event.table,
                        kind = ?event.kind,
                        ?outcome,
                        "Applied change event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        company_id = %state.company_id(),
                        missed,
                        "Change feed lagged, reloading"
                    );
                    state.refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!(company_id = %state.company_id(), "Change listener stopped");
    })
}
