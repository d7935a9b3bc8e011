//! Graph construction: builder, edges, and compile-time validation.
//!
//! Graphs are adjacency tables over [`NodeId`](crate::types::NodeId)s.
//! [`GraphBuilder`] collects nodes and edges; [`GraphBuilder::compile`]
//! validates the wiring and produces a [`Workflow`](crate::workflow::Workflow)
//! the executor can run.

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{ConditionalEdge, EdgePredicate};
