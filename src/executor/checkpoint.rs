//! Durable per-thread checkpoints.
//!
//! One checkpoint per thread, replaced after every superstep. A thread can be
//! resumed from its latest checkpoint after a crash; a terminal checkpoint
//! seeds the next turn. Save failures are fatal for the turn; deletes happen
//! only on explicit memory resets.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::persistence::{PersistedCheckpoint, PersistenceError};
use crate::state::ConversationState;
use crate::types::NodeId;

/// Snapshot of one thread's progress.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub thread_id: String,
    pub user_id: String,
    pub state: ConversationState,
    pub frontier: Vec<NodeId>,
    pub step: u64,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// True when the recorded turn finished: nothing left to run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.frontier.is_empty() || self.frontier.iter().all(NodeId::is_end)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpoint store unavailable: {0}")]
    #[diagnostic(
        code(lingograph::checkpoint::unavailable),
        help("A failed save aborts the turn; the previous checkpoint remains authoritative.")
    )]
    Unavailable(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Persistence(#[from] PersistenceError),
}

/// The durability seam.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Latest checkpoint for the thread, if any.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointerError>;

    /// Replace the thread's checkpoint.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointerError>;

    /// Drop the thread's checkpoint. Explicit resets only.
    async fn delete(&self, thread_id: &str) -> Result<(), CheckpointerError>;
}

/// Process-local checkpointer.
///
/// Stores the serialized form so the persistence models are exercised on
/// every save/load, exactly as a durable backend would.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: RwLock<FxHashMap<String, String>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointerError> {
        let stored = self.threads.read().get(thread_id).cloned();
        match stored {
            Some(json) => {
                let persisted = PersistedCheckpoint::from_json_str(&json)?;
                Ok(Some(Checkpoint::from(persisted)))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointerError> {
        let json = PersistedCheckpoint::from(&checkpoint).to_json_string()?;
        self.threads
            .write()
            .insert(checkpoint.thread_id.clone(), json);
        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<(), CheckpointerError> {
        self.threads.write().remove(thread_id);
        Ok(())
    }
}
