//! The invocation surface: one chat turn in, one final answer out.
//!
//! [`ChatService`] is what a transport (HTTP handler, bot adapter, REPL)
//! talks to. It serializes turns per thread, builds a fresh [`Executor`] per
//! call over the shared stores, and reduces the terminal state to the text a
//! caller actually wants. Degradations ride along as error events on the
//! reply; only infrastructure failures surface as `Err`.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::channels::errors::ErrorEvent;
use crate::config::{RuntimeConfig, TurnConfig};
use crate::executor::checkpoint::{Checkpointer, CheckpointerError};
use crate::executor::events::{EventEmitter, TurnEvent};
use crate::executor::{Executor, ExecutorError, SessionInit};
use crate::memory::{MemoryError, MemoryStore, Namespace};
use crate::message::MemoryKind;
use crate::ports::Capabilities;
use crate::workflow::Workflow;

/// Outcome of one completed turn.
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub thread_id: String,
    /// The final assistant answer.
    pub text: String,
    /// How the thread's session came to exist this turn.
    pub init: SessionInit,
    /// Supersteps the turn consumed.
    pub steps: u64,
    /// Degradations recorded along the way. Non-empty does not mean failure.
    pub errors: Vec<ErrorEvent>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error("turn on thread `{thread_id}` produced no final answer")]
    #[diagnostic(
        code(lingograph::service::no_terminal_response),
        help("The graph terminated without a plain assistant message; check the turn's error events.")
    )]
    NoTerminalResponse { thread_id: String },

    #[error("turn on thread `{thread_id}` timed out after {after:?}")]
    #[diagnostic(code(lingograph::service::timeout))]
    Timeout { thread_id: String, after: Duration },

    #[error("turn task was interrupted before completion")]
    #[diagnostic(code(lingograph::service::interrupted))]
    Interrupted,
}

/// A streaming turn: consume `events` live, then collect the reply.
pub struct StreamingTurn {
    pub events: flume::Receiver<TurnEvent>,
    outcome: JoinHandle<Result<ChatReply, ServiceError>>,
}

impl StreamingTurn {
    /// Wait for the turn to finish and return its reply.
    pub async fn finish(self) -> Result<ChatReply, ServiceError> {
        self.outcome.await.map_err(|_| ServiceError::Interrupted)?
    }
}

/// Turn-level front door over one compiled workflow.
#[derive(Clone)]
pub struct ChatService {
    workflow: Arc<Workflow>,
    capabilities: Arc<Capabilities>,
    memory: Arc<dyn MemoryStore>,
    checkpointer: Arc<dyn Checkpointer>,
    turn: TurnConfig,
    runtime: RuntimeConfig,
    // One async mutex per thread id; turns on the same thread serialize,
    // turns on different threads do not.
    locks: Arc<parking_lot::Mutex<FxHashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ChatService {
    pub fn new(
        workflow: Arc<Workflow>,
        capabilities: Arc<Capabilities>,
        memory: Arc<dyn MemoryStore>,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Self {
        Self {
            workflow,
            capabilities,
            memory,
            checkpointer,
            turn: TurnConfig::default(),
            runtime: RuntimeConfig::default(),
            locks: Arc::new(parking_lot::Mutex::new(FxHashMap::default())),
        }
    }

    #[must_use]
    pub fn with_turn_config(mut self, turn: TurnConfig) -> Self {
        self.turn = turn;
        self
    }

    #[must_use]
    pub fn with_runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .entry(thread_id.to_string())
                .or_default(),
        )
    }

    /// Run one turn to completion and return the final answer.
    #[instrument(skip(self, user_text), err)]
    pub async fn chat(
        &self,
        user_id: &str,
        thread_id: &str,
        user_text: &str,
    ) -> Result<ChatReply, ServiceError> {
        self.run_turn(user_id, thread_id, user_text, EventEmitter::disabled())
            .await
    }

    /// Run one turn while streaming progress events to the caller.
    ///
    /// The receiver sees node messages and step completions as they happen;
    /// the final reply comes from [`StreamingTurn::finish`].
    pub fn chat_streaming(
        &self,
        user_id: &str,
        thread_id: &str,
        user_text: &str,
    ) -> StreamingTurn {
        let (emitter, receiver) = EventEmitter::channel();
        let service = self.clone();
        let user_id = user_id.to_string();
        let thread_id = thread_id.to_string();
        let user_text = user_text.to_string();
        let outcome = tokio::spawn(async move {
            service
                .run_turn(&user_id, &thread_id, &user_text, emitter)
                .await
        });
        StreamingTurn {
            events: receiver,
            outcome,
        }
    }

    /// Forget the user's namespaces and the thread's checkpoint.
    #[instrument(skip(self), err)]
    pub async fn reset_memory(&self, user_id: &str, thread_id: &str) -> Result<(), ServiceError> {
        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock().await;

        for kind in MemoryKind::ALL {
            self.memory.delete(&Namespace::new(kind, user_id)).await?;
        }
        self.checkpointer.delete(thread_id).await?;
        info!(user_id, thread_id, "memory and checkpoint cleared");
        Ok(())
    }

    async fn run_turn(
        &self,
        user_id: &str,
        thread_id: &str,
        user_text: &str,
        events: EventEmitter,
    ) -> Result<ChatReply, ServiceError> {
        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock().await;

        let mut executor = Executor::new(
            Arc::clone(&self.workflow),
            Arc::clone(&self.capabilities),
            Arc::clone(&self.memory),
        )
        .with_checkpointer(Arc::clone(&self.checkpointer))
        .with_turn_config(self.turn.clone())
        .with_runtime_config(self.runtime.clone())
        .with_events(events);

        let init = executor.begin_turn(thread_id, user_id, user_text).await?;

        let state = match self.runtime.turn_timeout {
            Some(after) => tokio::time::timeout(after, executor.run_until_complete(thread_id))
                .await
                .map_err(|_| ServiceError::Timeout {
                    thread_id: thread_id.to_string(),
                    after,
                })??,
            None => executor.run_until_complete(thread_id).await?,
        };

        let snapshot = state.snapshot();
        let text = snapshot
            .latest_plain_assistant()
            .map(|m| m.content.clone())
            .or_else(|| snapshot.scratch.last_answer.clone())
            .ok_or_else(|| ServiceError::NoTerminalResponse {
                thread_id: thread_id.to_string(),
            })?;

        Ok(ChatReply {
            thread_id: thread_id.to_string(),
            text,
            init,
            steps: executor
                .session(thread_id)
                .map(|session| session.step)
                .unwrap_or_default(),
            errors: snapshot.errors,
        })
    }
}
