//! The compiled agent graph.
//!
//! A [`Workflow`] is the immutable product of
//! [`GraphBuilder::compile`](crate::graph::GraphBuilder::compile): the node
//! registry, the adjacency tables, and the barrier that folds a superstep's
//! deltas into state. Driving it across steps belongs to the
//! [`Executor`](crate::executor::Executor).

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::channels::Channel;
use crate::channels::errors::{ErrorEvent, ErrorScope};
use crate::control::FrontierCommand;
use crate::graph::ConditionalEdge;
use crate::node::{Node, StateDelta};
use crate::reducers::ReducerRegistry;
use crate::state::ConversationState;
use crate::types::{ChannelType, NodeId};

/// What a barrier application produced, in stable order.
#[derive(Debug, Default)]
pub struct BarrierOutcome {
    /// Channels whose content changed (and whose versions were bumped).
    pub updated_channels: Vec<ChannelType>,
    /// All errors the frontier emitted, sorted for stable observation.
    pub errors: Vec<ErrorEvent>,
    /// Frontier commands in ran-node order.
    pub frontier_commands: Vec<(NodeId, FrontierCommand)>,
}

/// Compiled, validated agent graph.
pub struct Workflow {
    nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    edges: FxHashMap<NodeId, Vec<NodeId>>,
    conditional_edges: Vec<ConditionalEdge>,
    reducers: ReducerRegistry,
}

impl Workflow {
    pub(crate) fn new(
        nodes: FxHashMap<NodeId, Arc<dyn Node>>,
        edges: FxHashMap<NodeId, Vec<NodeId>>,
        conditional_edges: Vec<ConditionalEdge>,
    ) -> Self {
        Self {
            nodes,
            edges,
            conditional_edges,
            reducers: ReducerRegistry::default(),
        }
    }

    pub fn nodes(&self) -> &FxHashMap<NodeId, Arc<dyn Node>> {
        &self.nodes
    }

    pub fn edges(&self) -> &FxHashMap<NodeId, Vec<NodeId>> {
        &self.edges
    }

    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    /// Fold a superstep's deltas into state, in frontier order.
    ///
    /// Reducers never bump versions themselves; this barrier bumps each
    /// changed channel exactly once per superstep, after all deltas have been
    /// applied. Errors are aggregated and sorted by scope, time, and message
    /// so observers see a stable order regardless of node completion timing.
    #[instrument(skip(self, state, run_ids, deltas))]
    pub fn apply_barrier(
        &self,
        state: &mut ConversationState,
        run_ids: &[NodeId],
        deltas: Vec<StateDelta>,
    ) -> BarrierOutcome {
        let messages_before = state.messages.version();
        let scratch_before = state.scratch.version();
        let errors_before = state.errors.version();

        let mut changed: Vec<ChannelType> = Vec::new();
        let mut errors_all: Vec<ErrorEvent> = Vec::new();
        let mut frontier_commands: Vec<(NodeId, FrontierCommand)> = Vec::new();

        for (i, delta) in deltas.iter().enumerate() {
            let fallback = NodeId::Named("?".to_string());
            let nid = run_ids.get(i).unwrap_or(&fallback);

            if let Some(messages) = &delta.messages {
                debug!(node = %nid, count = messages.len(), "node produced messages");
            }
            if let Some(errors) = &delta.errors {
                errors_all.extend(errors.iter().cloned());
            }
            if let Some(command) = &delta.command {
                frontier_commands.push((nid.clone(), command.clone()));
            }

            for channel in self.reducers.apply(state, delta) {
                if !changed.contains(&channel) {
                    changed.push(channel);
                }
            }
        }

        fn scope_sort_key(scope: &ErrorScope) -> (u8, &str, u64) {
            match scope {
                ErrorScope::Node { node, step } => (0, node.as_str(), *step),
                ErrorScope::Executor { thread, step } => (1, thread.as_str(), *step),
                ErrorScope::Service => (2, "", 0),
            }
        }
        errors_all.sort_by(|a, b| {
            scope_sort_key(&a.scope)
                .cmp(&scope_sort_key(&b.scope))
                .then_with(|| a.when.cmp(&b.when))
                .then_with(|| a.error.message.cmp(&b.error.message))
        });

        for channel in &changed {
            match channel {
                ChannelType::Message => state
                    .messages
                    .set_version(messages_before.saturating_add(1)),
                ChannelType::Scratch => {
                    state.scratch.set_version(scratch_before.saturating_add(1))
                }
                ChannelType::Error => state.errors.set_version(errors_before.saturating_add(1)),
            }
            info!(channel = %channel, "channel updated");
        }

        BarrierOutcome {
            updated_channels: changed,
            errors: errors_all,
            frontier_commands,
        }
    }
}
