//! Turn execution: the superstep loop over a compiled [`Workflow`].
//!
//! One turn is a sequence of supersteps. Each superstep snapshots state, runs
//! every node on the frontier concurrently against that same snapshot, merges
//! their deltas at the barrier, checkpoints the merged state, then routes to
//! the next frontier. Routing sees only post-barrier state, so a memory write
//! and a handoff emitted in the same step always land state-first.
//!
//! Failure policy:
//! - A node error becomes a synthetic tool message plus an error event; the
//!   turn continues.
//! - A checkpoint save failure aborts the turn. The previous checkpoint stays
//!   authoritative.
//! - The step cap forces a terminal outcome instead of spinning.

pub mod checkpoint;
pub mod events;
pub mod persistence;

use futures_util::future::{BoxFuture, join_all};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::channels::Channel;
use crate::channels::errors::{ErrorDetail, ErrorEvent};
use crate::config::{RuntimeConfig, TurnConfig};
use crate::control::FrontierCommand;
use crate::memory::MemoryStore;
use crate::message::Message;
use crate::node::{NodeContext, StateDelta};
use crate::ports::Capabilities;
use crate::state::{ConversationState, StateSnapshot};
use crate::types::NodeId;
use crate::workflow::{BarrierOutcome, Workflow};

use checkpoint::{Checkpoint, Checkpointer, CheckpointerError};
use events::{EventEmitter, TurnEvent};

/// Live execution state for one thread.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: String,
    pub state: ConversationState,
    pub frontier: Vec<NodeId>,
    pub step: u64,
}

/// How a turn's session came to exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionInit {
    /// New thread, nothing stored.
    Fresh,
    /// Seeded from a finished turn's checkpoint.
    Seeded { from_step: u64 },
    /// An interrupted turn was found and completed before this one started.
    Recovered { from_step: u64 },
}

/// What one superstep did.
#[derive(Debug)]
pub struct StepReport {
    pub step: u64,
    pub ran_nodes: Vec<NodeId>,
    pub barrier: BarrierOutcome,
    pub next_frontier: Vec<NodeId>,
    pub completed: bool,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExecutorError {
    #[error("no session for thread `{thread_id}`")]
    #[diagnostic(
        code(lingograph::executor::thread_not_found),
        help("Call begin_turn before stepping a thread.")
    )]
    ThreadNotFound { thread_id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointerError),
}

/// Drives turns for one workflow.
///
/// Holds per-thread sessions in memory; durability lives behind the
/// [`Checkpointer`]. Construct one per turn or keep one alive, either works,
/// as long as a single thread is never stepped from two executors at once
/// (the service layer guarantees that with per-thread locks).
pub struct Executor {
    workflow: Arc<Workflow>,
    capabilities: Arc<Capabilities>,
    memory: Arc<dyn MemoryStore>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    runtime: RuntimeConfig,
    turn: TurnConfig,
    events: EventEmitter,
    sessions: FxHashMap<String, Session>,
}

impl Executor {
    pub fn new(
        workflow: Arc<Workflow>,
        capabilities: Arc<Capabilities>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            workflow,
            capabilities,
            memory,
            checkpointer: None,
            runtime: RuntimeConfig::default(),
            turn: TurnConfig::default(),
            events: EventEmitter::disabled(),
            sessions: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    #[must_use]
    pub fn with_runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    #[must_use]
    pub fn with_turn_config(mut self, turn: TurnConfig) -> Self {
        self.turn = turn;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    pub fn session(&self, thread_id: &str) -> Option<&Session> {
        self.sessions.get(thread_id)
    }

    /// Open a turn: recover or seed from the checkpoint, append the user
    /// message, compute the initial frontier, and persist the opening state.
    #[instrument(skip(self, user_text), err)]
    pub async fn begin_turn(
        &mut self,
        thread_id: &str,
        user_id: &str,
        user_text: &str,
    ) -> Result<SessionInit, ExecutorError> {
        let mut init = SessionInit::Fresh;
        let mut state: Option<ConversationState> = None;

        if let Some(cp) = self.load_checkpoint(thread_id).await? {
            if cp.is_terminal() {
                init = SessionInit::Seeded { from_step: cp.step };
                state = Some(cp.state);
            } else {
                // A previous turn died mid-flight. Finish it before taking
                // new input so its pending writes land.
                debug!(thread_id, step = cp.step, "recovering interrupted turn");
                init = SessionInit::Recovered { from_step: cp.step };
                self.sessions.insert(
                    thread_id.to_string(),
                    Session {
                        user_id: cp.user_id.clone(),
                        state: cp.state,
                        frontier: cp.frontier,
                        step: cp.step,
                    },
                );
                self.run_until_complete(thread_id).await?;
                state = self
                    .sessions
                    .get(thread_id)
                    .map(|session| session.state.clone());
            }
        }

        let mut state = state.unwrap_or_else(|| ConversationState::new_with_messages(Vec::new()));
        state.begin_turn(user_text);

        let frontier = self.route_from(&state.snapshot(), &[NodeId::Start], &[]);
        self.sessions.insert(
            thread_id.to_string(),
            Session {
                user_id: user_id.to_string(),
                state,
                frontier,
                step: 0,
            },
        );
        self.save_checkpoint(thread_id).await?;
        Ok(init)
    }

    /// Execute exactly one superstep.
    #[instrument(skip(self), err)]
    pub async fn run_step(&mut self, thread_id: &str) -> Result<StepReport, ExecutorError> {
        let mut session =
            self.sessions
                .remove(thread_id)
                .ok_or_else(|| ExecutorError::ThreadNotFound {
                    thread_id: thread_id.to_string(),
                })?;

        if is_terminal(&session.frontier) {
            let step = session.step;
            self.sessions.insert(thread_id.to_string(), session);
            return Ok(StepReport {
                step,
                ran_nodes: vec![],
                barrier: BarrierOutcome::default(),
                next_frontier: vec![],
                completed: true,
            });
        }

        session.step += 1;
        let step = session.step;
        let snapshot = session.state.snapshot();
        let to_run: Vec<NodeId> = session
            .frontier
            .iter()
            .filter(|id| !id.is_start() && !id.is_end())
            .cloned()
            .collect();

        debug!(step, frontier = ?to_run, "starting superstep");
        let deltas = self
            .run_frontier(&to_run, snapshot, step, &session.user_id, thread_id)
            .await;

        let outcome = self.workflow.apply_barrier(&mut session.state, &to_run, deltas);
        let next_frontier = self.route_from(
            &session.state.snapshot(),
            &to_run,
            &outcome.frontier_commands,
        );
        let completed = is_terminal(&next_frontier);
        session.frontier = next_frontier.clone();
        let snapshot_after = session.state.snapshot();
        self.sessions.insert(thread_id.to_string(), session);

        // Durability before observability: the step does not count as done
        // until its state is stored.
        self.save_checkpoint(thread_id).await?;
        self.events.emit(TurnEvent::StepCompleted {
            thread_id: thread_id.to_string(),
            step,
            snapshot: snapshot_after,
        });

        Ok(StepReport {
            step,
            ran_nodes: to_run,
            barrier: outcome,
            next_frontier,
            completed,
        })
    }

    /// Drive the thread until a terminal frontier or the step cap.
    #[instrument(skip(self), err)]
    pub async fn run_until_complete(
        &mut self,
        thread_id: &str,
    ) -> Result<ConversationState, ExecutorError> {
        loop {
            let (terminal, step) = {
                let session =
                    self.sessions
                        .get(thread_id)
                        .ok_or_else(|| ExecutorError::ThreadNotFound {
                            thread_id: thread_id.to_string(),
                        })?;
                (is_terminal(&session.frontier), session.step)
            };
            if terminal {
                break;
            }
            if step >= self.runtime.max_steps {
                warn!(
                    thread_id,
                    step,
                    max_steps = self.runtime.max_steps,
                    "step cap reached, forcing terminal outcome"
                );
                if let Some(session) = self.sessions.get_mut(thread_id) {
                    session.frontier = vec![NodeId::End];
                    session.state.errors.get_mut().push(ErrorEvent::executor(
                        thread_id,
                        step,
                        ErrorDetail::msg("step cap reached before the graph terminated"),
                    ));
                }
                self.save_checkpoint(thread_id).await?;
                break;
            }

            let report = self.run_step(thread_id).await?;
            if report.completed {
                break;
            }
        }

        let session = self
            .sessions
            .get(thread_id)
            .ok_or_else(|| ExecutorError::ThreadNotFound {
                thread_id: thread_id.to_string(),
            })?;
        self.events.emit(TurnEvent::Terminal {
            thread_id: thread_id.to_string(),
            steps: session.step,
        });
        Ok(session.state.clone())
    }

    /// Drop the thread's session and checkpoint. Explicit resets only.
    pub async fn reset_thread(&mut self, thread_id: &str) -> Result<(), ExecutorError> {
        self.sessions.remove(thread_id);
        if let Some(cp) = &self.checkpointer {
            cp.delete(thread_id).await?;
        }
        Ok(())
    }

    /// Run a frontier concurrently against one snapshot.
    ///
    /// Order of the returned deltas matches `to_run`, regardless of node
    /// completion timing; the barrier depends on that for determinism. Node
    /// errors are absorbed here into synthetic tool messages and error events.
    async fn run_frontier(
        &self,
        to_run: &[NodeId],
        snapshot: StateSnapshot,
        step: u64,
        user_id: &str,
        thread_id: &str,
    ) -> Vec<StateDelta> {
        let limit = self.runtime.concurrency_limit.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4)
        });

        let jobs: Vec<_> = to_run
            .iter()
            .filter_map(|id| {
                let node = self.workflow.nodes().get(id).cloned()?;
                let ctx = NodeContext {
                    node_id: id.to_string(),
                    step,
                    user_id: user_id.to_string(),
                    thread_id: thread_id.to_string(),
                    capabilities: Arc::clone(&self.capabilities),
                    memory: Arc::clone(&self.memory),
                    turn: self.turn.clone(),
                    events: self.events.clone(),
                };
                Some((id.clone(), node, snapshot.clone(), ctx))
            })
            .collect();

        // Boxed futures awaited batch by batch; join_all preserves job order
        // within each batch, so the deltas line up with `to_run`.
        let mut deltas = Vec::with_capacity(jobs.len());
        let mut jobs = jobs.into_iter();
        loop {
            let batch: Vec<BoxFuture<'static, StateDelta>> = jobs
                .by_ref()
                .take(limit.max(1))
                .map(move |(id, node, snapshot, ctx)| {
                    let fut: BoxFuture<'static, StateDelta> = Box::pin(async move {
                        match node.run(snapshot, ctx).await {
                            Ok(delta) => delta,
                            Err(err) => {
                                warn!(node = %id, step, error = %err, "node failed, absorbing");
                                StateDelta::new()
                                    .with_messages(vec![Message::tool_response(
                                        &id.to_string(),
                                        &uuid::Uuid::new_v4().to_string(),
                                        &format!("Error during {id}: {err}"),
                                    )])
                                    .with_errors(vec![ErrorEvent::node(
                                        id.to_string(),
                                        step,
                                        ErrorDetail::msg(err.to_string()),
                                    )])
                            }
                        }
                    });
                    fut
                })
                .collect();
            if batch.is_empty() {
                break;
            }
            deltas.extend(join_all(batch).await);
        }
        deltas
    }

    /// Resolve the next frontier for the nodes that just ran.
    ///
    /// Per node: frontier commands first (Replace wins once, Append extends
    /// the static edges), then conditional edges unless replaced, then the
    /// static edges. Unknown targets are skipped with a warning; duplicates
    /// collapse.
    fn route_from(
        &self,
        snapshot: &StateSnapshot,
        ran: &[NodeId],
        commands: &[(NodeId, FrontierCommand)],
    ) -> Vec<NodeId> {
        let mut next_frontier: Vec<NodeId> = Vec::new();

        let mut commands_by_node: FxHashMap<&NodeId, Vec<&FrontierCommand>> = FxHashMap::default();
        for (origin, command) in commands {
            commands_by_node.entry(origin).or_default().push(command);
        }

        for id in ran {
            let static_edges = self.workflow.edges().get(id).cloned().unwrap_or_default();
            let mut targets: Vec<NodeId> = Vec::new();
            let mut replaced = false;

            if let Some(commands) = commands_by_node.get(id) {
                for command in commands {
                    match command {
                        FrontierCommand::Replace(entries) => {
                            if replaced {
                                warn!(origin = %id, "frontier already replaced this step, skipping");
                                continue;
                            }
                            targets = entries.clone();
                            replaced = true;
                        }
                        FrontierCommand::Append(entries) => {
                            if targets.is_empty() && !replaced {
                                targets.extend(static_edges.iter().cloned());
                            }
                            targets.extend(entries.iter().cloned());
                        }
                    }
                }
            }

            if !replaced {
                let mut routed_conditionally = false;
                for edge in self
                    .workflow
                    .conditional_edges()
                    .iter()
                    .filter(|e| e.from() == id)
                {
                    routed_conditionally = true;
                    for name in (edge.predicate())(snapshot.clone()) {
                        targets.push(NodeId::from(name.as_str()));
                    }
                }
                if !routed_conditionally && targets.is_empty() {
                    targets.extend(static_edges);
                }
            }

            for target in targets {
                let valid = match &target {
                    NodeId::Start | NodeId::End => true,
                    named => self.workflow.nodes().contains_key(named),
                };
                if !valid {
                    warn!(origin = %id, target = %target, "frontier target not found, skipping");
                    continue;
                }
                if !next_frontier.contains(&target) {
                    next_frontier.push(target);
                }
            }
        }

        next_frontier
    }

    async fn load_checkpoint(
        &self,
        thread_id: &str,
    ) -> Result<Option<Checkpoint>, ExecutorError> {
        match &self.checkpointer {
            Some(cp) => Ok(cp.load(thread_id).await?),
            None => Ok(None),
        }
    }

    async fn save_checkpoint(&self, thread_id: &str) -> Result<(), ExecutorError> {
        let (Some(cp), Some(session)) = (&self.checkpointer, self.sessions.get(thread_id)) else {
            return Ok(());
        };
        cp.save(Checkpoint {
            thread_id: thread_id.to_string(),
            user_id: session.user_id.clone(),
            state: session.state.clone(),
            frontier: session.frontier.clone(),
            step: session.step,
            created_at: chrono::Utc::now(),
        })
        .await?;
        Ok(())
    }
}

fn is_terminal(frontier: &[NodeId]) -> bool {
    frontier.is_empty() || frontier.iter().all(NodeId::is_end)
}
