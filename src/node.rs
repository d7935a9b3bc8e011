//! Node execution framework.
//!
//! A [`Node`] is one unit of work inside an agent graph. It receives an
//! immutable [`StateSnapshot`](crate::state::StateSnapshot) plus a
//! [`NodeContext`] and hands back a [`StateDelta`]; the barrier merges deltas
//! into the thread state after the whole frontier has run. Nodes never touch
//! state, memory namespaces of other users, or checkpoints directly.
//!
//! Two failure modes exist:
//! 1. `Err(NodeError)`: the node could not do its job. The executor converts
//!    this into a synthetic tool message and an error event; the turn goes on.
//! 2. Recoverable degradation: record an [`ErrorEvent`] on the delta and
//!    return `Ok`.

use async_trait::async_trait;
use miette::Diagnostic;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::channels::errors::ErrorEvent;
use crate::config::TurnConfig;
use crate::control::{FrontierCommand, Handoff};
use crate::executor::events::{EventEmitter, TurnEvent};
use crate::memory::{MemoryError, MemoryStore};
use crate::message::Message;
use crate::ports::{Capabilities, GrammarReport, PortError};
use crate::state::StateSnapshot;

/// Core trait for executable graph nodes.
///
/// # Examples
///
/// ```rust,no_run
/// use lingograph::node::{Node, NodeContext, NodeError, StateDelta};
/// use lingograph::message::Message;
/// use lingograph::state::StateSnapshot;
/// use async_trait::async_trait;
///
/// struct EchoNode;
///
/// #[async_trait]
/// impl Node for EchoNode {
///     async fn run(
///         &self,
///         snapshot: StateSnapshot,
///         ctx: NodeContext,
///     ) -> Result<StateDelta, NodeError> {
///         let last = snapshot.messages.last().ok_or(NodeError::MissingInput {
///             what: "at least one message",
///         })?;
///         ctx.emit("echo", "replying");
///         Ok(StateDelta::new().with_messages(vec![Message::assistant(&last.content)]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext)
    -> Result<StateDelta, NodeError>;
}

/// Everything a node is allowed to reach during one step.
///
/// Built fresh by the executor per node per step; there is no global state
/// behind it.
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: String,
    pub step: u64,
    pub user_id: String,
    pub thread_id: String,
    pub capabilities: Arc<Capabilities>,
    pub memory: Arc<dyn MemoryStore>,
    pub turn: TurnConfig,
    pub events: EventEmitter,
}

// The store handle is a trait object, so Debug is written out by hand with the
// identifying fields only.
impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("node_id", &self.node_id)
            .field("step", &self.step)
            .field("user_id", &self.user_id)
            .field("thread_id", &self.thread_id)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

impl NodeContext {
    /// Emit a node-scoped progress event tagged with this node and step.
    ///
    /// Infallible: with no consumer attached the event is dropped.
    pub fn emit(&self, scope: impl Into<String>, message: impl Into<String>) {
        self.events.emit(TurnEvent::NodeMessage {
            node: self.node_id.clone(),
            step: self.step,
            scope: scope.into(),
            message: message.into(),
        });
    }
}

/// Scratch-field updates with replace-if-set semantics.
///
/// A `None` field leaves the current value untouched. `attempted_corrections`
/// appends. Clearing the pending grammar report is an explicit flag because
/// "set to nothing" and "leave alone" are different intents.
#[derive(Clone, Debug, Default)]
pub struct ScratchDelta {
    pub last_answer: Option<String>,
    pub pending_grammar: Option<GrammarReport>,
    pub clear_pending_grammar: bool,
    pub search_context: Option<String>,
    pub active_agent: Option<String>,
    pub retries: Option<u32>,
    pub attempted_corrections: Vec<String>,
}

impl ScratchDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_answer.is_none()
            && self.pending_grammar.is_none()
            && !self.clear_pending_grammar
            && self.search_context.is_none()
            && self.active_agent.is_none()
            && self.retries.is_none()
            && self.attempted_corrections.is_empty()
    }
}

/// The typed update a node hands back from `run`.
///
/// All fields are optional so a node states only what it changes. Messages and
/// errors append; scratch replaces per field; `command` expresses routing
/// intent the executor reconciles with the graph's edges.
#[derive(Clone, Debug, Default)]
pub struct StateDelta {
    pub messages: Option<Vec<Message>>,
    pub scratch: Option<ScratchDelta>,
    pub errors: Option<Vec<ErrorEvent>>,
    pub command: Option<FrontierCommand>,
}

impl StateDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_scratch(mut self, scratch: ScratchDelta) -> Self {
        self.scratch = Some(scratch);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: FrontierCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Attach a handoff: one visible marker message plus a frontier replace.
    ///
    /// The marker is appended after any messages already on the delta, so a
    /// pending memory write or tool response is never displaced by the
    /// transfer.
    #[must_use]
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        let marker = Message::tool_response(
            "handoff",
            &uuid::Uuid::new_v4().to_string(),
            &format!(
                "Successfully transferred to {} - {}",
                handoff.target, handoff.reason
            ),
        );
        self.messages.get_or_insert_with(Vec::new).push(marker);
        self.command = Some(FrontierCommand::Replace(vec![handoff.target]));
        self
    }
}

/// Fatal-for-this-node errors. The executor converts them into recoverable
/// error events at the per-node boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(lingograph::node::missing_input),
        help("Check that an upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    #[diagnostic(code(lingograph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    #[diagnostic(code(lingograph::node::validation))]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_appends_marker_after_existing_messages() {
        let delta = StateDelta::new()
            .with_messages(vec![Message::tool_response("profile", "c1", "saved")])
            .with_handoff(Handoff::to("Correction", "grammar issues spotted"));

        let messages = delta.messages.as_ref().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "saved");
        assert!(
            messages[1]
                .content
                .contains("Successfully transferred to Correction")
        );
        assert!(matches!(
            delta.command,
            Some(FrontierCommand::Replace(ref targets)) if targets.len() == 1
        ));
    }

    #[test]
    fn scratch_delta_emptiness() {
        assert!(ScratchDelta::default().is_empty());
        let delta = ScratchDelta {
            retries: Some(1),
            ..Default::default()
        };
        assert!(!delta.is_empty());
        let clear = ScratchDelta {
            clear_pending_grammar: true,
            ..Default::default()
        };
        assert!(!clear.is_empty());
    }
}
