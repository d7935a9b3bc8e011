//! Fluent construction of agent graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

use super::compilation::{GraphCompileError, compile};
use super::edges::{ConditionalEdge, EdgePredicate};
use crate::node::Node;
use crate::types::NodeId;
use crate::workflow::Workflow;

/// Builder for agent graphs.
///
/// A graph needs at least one registered node, a route out of
/// [`NodeId::Start`], and a route out of every registered node (an edge or a
/// conditional edge). `Start` and `End` are virtual and must never be
/// registered; wiring happens against them, execution does not.
///
/// # Examples
///
/// ```
/// use lingograph::graph::GraphBuilder;
///
/// # struct Responder;
/// # #[async_trait::async_trait]
/// # impl lingograph::node::Node for Responder {
/// #     async fn run(&self, _: lingograph::state::StateSnapshot, _: lingograph::node::NodeContext) -> Result<lingograph::node::StateDelta, lingograph::node::NodeError> {
/// #         Ok(lingograph::node::StateDelta::default())
/// #     }
/// # }
/// let workflow = GraphBuilder::new()
///     .add_node("responder", Responder)
///     .add_edge("Start", "responder")
///     .add_edge("responder", "End")
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    pub(crate) nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    pub(crate) edges: FxHashMap<NodeId, Vec<NodeId>>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
        }
    }

    /// Register a node. Attempts to register the virtual `Start`/`End` nodes
    /// are ignored with a warning.
    #[must_use]
    pub fn add_node(mut self, id: impl Into<NodeId>, node: impl Node + 'static) -> Self {
        let id = id.into();
        if id.is_start() || id.is_end() {
            warn!(node = %id, "virtual nodes cannot be registered, ignoring");
            return self;
        }
        self.nodes.insert(id, Arc::new(node));
        self
    }

    /// Register an already shared node instance.
    #[must_use]
    pub fn add_shared_node(mut self, id: impl Into<NodeId>, node: Arc<dyn Node>) -> Self {
        let id = id.into();
        if id.is_start() || id.is_end() {
            warn!(node = %id, "virtual nodes cannot be registered, ignoring");
            return self;
        }
        self.nodes.insert(id, node);
        self
    }

    /// Add an unconditional edge.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Add a conditional edge whose targets are decided at runtime.
    #[must_use]
    pub fn add_conditional_edge(
        mut self,
        from: impl Into<NodeId>,
        predicate: EdgePredicate,
    ) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, predicate));
        self
    }

    /// Validate the wiring and produce an executable [`Workflow`].
    pub fn compile(self) -> Result<Workflow, GraphCompileError> {
        compile(self)
    }
}
