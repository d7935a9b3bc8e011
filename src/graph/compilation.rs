//! Static validation and compilation of a [`GraphBuilder`] into a
//! [`Workflow`].
//!
//! Misrouted graphs fail here, at build time, instead of stalling a turn
//! later: every edge endpoint must exist, Start must lead somewhere, and no
//! registered node may be a dead end.

use miette::Diagnostic;
use thiserror::Error;

use super::builder::GraphBuilder;
use crate::types::NodeId;
use crate::workflow::Workflow;

#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("graph has no registered nodes")]
    #[diagnostic(
        code(lingograph::graph::empty),
        help("Register at least one node with add_node before compiling.")
    )]
    EmptyGraph,

    #[error("no route out of Start")]
    #[diagnostic(
        code(lingograph::graph::no_entry),
        help("Add an edge or conditional edge from Start.")
    )]
    NoStartRoute,

    #[error("edge references unregistered source node `{0}`")]
    #[diagnostic(code(lingograph::graph::unknown_source))]
    UnknownSource(String),

    #[error("edge references unregistered target node `{0}`")]
    #[diagnostic(code(lingograph::graph::unknown_target))]
    UnknownTarget(String),

    #[error("node `{0}` has no route out")]
    #[diagnostic(
        code(lingograph::graph::dead_end),
        help("Every registered node needs an edge or conditional edge; route to End to terminate.")
    )]
    DeadEnd(String),
}

fn is_known(builder: &GraphBuilder, id: &NodeId) -> bool {
    id.is_start() || id.is_end() || builder.nodes.contains_key(id)
}

pub(crate) fn compile(builder: GraphBuilder) -> Result<Workflow, GraphCompileError> {
    if builder.nodes.is_empty() {
        return Err(GraphCompileError::EmptyGraph);
    }

    for (from, targets) in &builder.edges {
        if from.is_end() || !is_known(&builder, from) {
            return Err(GraphCompileError::UnknownSource(from.to_string()));
        }
        for to in targets {
            if to.is_start() || !is_known(&builder, to) {
                return Err(GraphCompileError::UnknownTarget(to.to_string()));
            }
        }
    }
    for edge in &builder.conditional_edges {
        let from = edge.from();
        if from.is_end() || !is_known(&builder, from) {
            return Err(GraphCompileError::UnknownSource(from.to_string()));
        }
    }

    let has_route = |id: &NodeId| {
        builder.edges.get(id).is_some_and(|t| !t.is_empty())
            || builder.conditional_edges.iter().any(|e| e.from() == id)
    };
    if !has_route(&NodeId::Start) {
        return Err(GraphCompileError::NoStartRoute);
    }
    for id in builder.nodes.keys() {
        if !has_route(id) {
            return Err(GraphCompileError::DeadEnd(id.to_string()));
        }
    }

    Ok(Workflow::new(
        builder.nodes,
        builder.edges,
        builder.conditional_edges,
    ))
}
