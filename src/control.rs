//! Control-flow directives emitted by nodes.
//!
//! Routing intent is kept separate from state mutation: a node that wants the
//! frontier to move somewhere else says so through a [`FrontierCommand`] on
//! its delta, and the executor reconciles that with the graph's edges after
//! the barrier has merged state. State always lands before control moves.

use crate::types::NodeId;

/// A transfer of control to a sibling agent, with the reason recorded for the
/// transcript marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    pub target: NodeId,
    pub reason: String,
}

impl Handoff {
    #[must_use]
    pub fn to(target: impl Into<NodeId>, reason: &str) -> Self {
        Self {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Command emitted by a node to manipulate the next frontier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrontierCommand {
    /// Add targets on top of what the edges would produce.
    Append(Vec<NodeId>),
    /// Discard the edge-derived frontier and go here instead.
    Replace(Vec<NodeId>),
}
