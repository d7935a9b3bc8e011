//! Edge types and routing predicates.

use crate::types::NodeId;
use std::sync::Arc;

/// Routing function for conditional edges.
///
/// Evaluated against the post-barrier snapshot; returns the route names of
/// the nodes to run next. `"End"` is the terminal marker. Returning several
/// names fans out.
///
/// # Examples
///
/// ```
/// use lingograph::graph::EdgePredicate;
/// use std::sync::Arc;
///
/// // Loop back to the tutor while the latest message is a corrective prompt.
/// let route: EdgePredicate = Arc::new(|snapshot| {
///     match snapshot.messages.last() {
///         Some(m) if m.has_role(lingograph::message::Role::User) => {
///             vec!["tutor".to_string()]
///         }
///         _ => vec!["End".to_string()],
///     }
/// });
/// ```
pub type EdgePredicate =
    Arc<dyn Fn(crate::state::StateSnapshot) -> Vec<String> + Send + Sync + 'static>;

/// A conditional edge: routing decided at runtime from state.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeId,
    predicate: EdgePredicate,
}

impl ConditionalEdge {
    pub fn new(from: impl Into<NodeId>, predicate: EdgePredicate) -> Self {
        Self {
            from: from.into(),
            predicate,
        }
    }

    pub fn from(&self) -> &NodeId {
        &self.from
    }

    pub fn predicate(&self) -> &EdgePredicate {
        &self.predicate
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}
