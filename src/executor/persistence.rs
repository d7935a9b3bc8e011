//! Serde models for durable checkpoints.
//!
//! Runtime types stay free of storage concerns; these mirrors own the wire
//! shape. Frontier entries persist in the stable `NodeId` string encoding so
//! old checkpoints survive enum evolution.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::checkpoint::Checkpoint;
use crate::channels::{Channel, ErrorsChannel, MessagesChannel, ScratchChannel, errors::ErrorEvent};
use crate::message::Message;
use crate::state::{ConversationState, Scratch};
use crate::types::NodeId;

#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("failed to encode checkpoint: {0}")]
    #[diagnostic(code(lingograph::persistence::encode))]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode checkpoint: {0}")]
    #[diagnostic(
        code(lingograph::persistence::decode),
        help("The stored checkpoint may predate the current schema.")
    )]
    Decode(#[source] serde_json::Error),
}

/// Wire form of [`ConversationState`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersistedState {
    pub messages: Vec<Message>,
    pub messages_version: u32,
    pub scratch: Scratch,
    pub scratch_version: u32,
    pub errors: Vec<ErrorEvent>,
    pub errors_version: u32,
}

/// Wire form of [`Checkpoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCheckpoint {
    pub thread_id: String,
    pub user_id: String,
    pub state: PersistedState,
    /// `NodeId::encode` strings.
    pub frontier: Vec<String>,
    pub step: u64,
    pub created_at: DateTime<Utc>,
}

impl PersistedCheckpoint {
    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(PersistenceError::Encode)
    }

    pub fn from_json_str(s: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(s).map_err(PersistenceError::Decode)
    }
}

impl From<&ConversationState> for PersistedState {
    fn from(state: &ConversationState) -> Self {
        Self {
            messages: state.messages.snapshot(),
            messages_version: state.messages.version(),
            scratch: state.scratch.snapshot(),
            scratch_version: state.scratch.version(),
            errors: state.errors.snapshot(),
            errors_version: state.errors.version(),
        }
    }
}

impl From<PersistedState> for ConversationState {
    fn from(p: PersistedState) -> Self {
        ConversationState {
            messages: MessagesChannel::new(p.messages, p.messages_version),
            scratch: ScratchChannel::new(p.scratch, p.scratch_version),
            errors: ErrorsChannel::new(p.errors, p.errors_version),
        }
    }
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            thread_id: cp.thread_id.clone(),
            user_id: cp.user_id.clone(),
            state: PersistedState::from(&cp.state),
            frontier: cp.frontier.iter().map(NodeId::encode).collect(),
            step: cp.step,
            created_at: cp.created_at,
        }
    }
}

impl From<PersistedCheckpoint> for Checkpoint {
    fn from(p: PersistedCheckpoint) -> Self {
        Checkpoint {
            thread_id: p.thread_id,
            user_id: p.user_id,
            state: ConversationState::from(p.state),
            frontier: p.frontier.iter().map(|s| NodeId::decode(s)).collect(),
            step: p.step,
            created_at: p.created_at,
        }
    }
}
