//! Routing predicates for the shipped graphs.
//!
//! All routing over model output goes through [`ToolDirective`], never raw
//! tool-name strings. Memory updates always dispatch before handoff targets,
//! so a transfer can never outrun a pending write. Unrecognized directives
//! fail open: the turn ends with whatever answer exists.

use std::sync::Arc;
use tracing::warn;

use super::extractor::MemoryUpdateNode;
use super::names;
use crate::graph::EdgePredicate;
use crate::message::{MemoryKind, Role, ToolDirective};
use crate::state::StateSnapshot;

fn end() -> Vec<String> {
    vec![names::END.to_string()]
}

/// Directive targets from the latest assistant message, memory kinds first in
/// fixed namespace order, then handoff targets, duplicates dropped.
fn directive_routes(snapshot: &StateSnapshot) -> Option<Vec<String>> {
    let last = snapshot.messages.last()?;
    if last.role != Role::Assistant || last.tool_calls.is_empty() {
        return None;
    }

    let mut kinds: Vec<MemoryKind> = Vec::new();
    let mut handoffs: Vec<String> = Vec::new();
    for call in &last.tool_calls {
        match call.directive() {
            ToolDirective::UpdateMemory(kind) => {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            ToolDirective::Handoff { target, .. } => {
                if !handoffs.contains(&target) {
                    handoffs.push(target);
                }
            }
            ToolDirective::Unknown { name } => {
                warn!(tool = %name, "unrecognized tool call, ignoring");
            }
        }
    }

    let mut routes: Vec<String> = MemoryKind::ALL
        .into_iter()
        .filter(|k| kinds.contains(k))
        .map(|k| MemoryUpdateNode::route_name(k).to_string())
        .collect();
    routes.extend(handoffs);
    Some(routes)
}

/// After the tutor: dispatch requested tool work, otherwise reflect on the
/// answer. A reply carrying only unrecognized calls ends the turn.
pub fn route_after_tutor() -> EdgePredicate {
    Arc::new(|snapshot| match directive_routes(&snapshot) {
        Some(routes) if routes.is_empty() => {
            warn!("assistant requested only unrecognized tools, ending turn");
            end()
        }
        Some(routes) => routes,
        None => vec![names::REFLECT.to_string()],
    })
}

/// After reflection: a freshly injected corrective prompt loops back to the
/// tutor; anything else means the answer stands.
pub fn route_after_reflect() -> EdgePredicate {
    Arc::new(|snapshot| match snapshot.messages.last() {
        Some(m) if m.role == Role::User => vec![names::TUTOR.to_string()],
        _ => end(),
    })
}

/// Swarm entry: resume with whichever agent held the conversation last.
pub fn route_to_active_agent(default_agent: &str) -> EdgePredicate {
    let default_agent = default_agent.to_string();
    Arc::new(move |snapshot| {
        vec![
            snapshot
                .scratch
                .active_agent
                .clone()
                .unwrap_or_else(|| default_agent.clone()),
        ]
    })
}

/// After the supervisor: follow its transfer requests, or let the responder
/// answer when it delegated nothing.
pub fn route_after_supervisor() -> EdgePredicate {
    Arc::new(|snapshot| match directive_routes(&snapshot) {
        Some(routes) if !routes.is_empty() => routes,
        _ => vec![names::RESPONDER.to_string()],
    })
}

/// After the validator: its verdict message names the next stop.
pub fn route_after_validator() -> EdgePredicate {
    Arc::new(|snapshot| match snapshot.messages.last() {
        Some(m) if m.content == names::SUPERVISOR => vec![names::SUPERVISOR.to_string()],
        _ => vec![names::RESPONDER.to_string()],
    })
}
