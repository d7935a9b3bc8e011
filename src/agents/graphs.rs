//! The three shipped graph topologies.

use crate::graph::{GraphBuilder, GraphCompileError};
use crate::message::MemoryKind;
use crate::workflow::Workflow;

use super::extractor::MemoryUpdateNode;
use super::names;
use super::reflect::ReflectNode;
use super::router::{
    route_after_reflect, route_after_supervisor, route_after_tutor, route_after_validator,
    route_to_active_agent,
};
use super::supervisor::{
    CorrectionNode, ResearchNode, ResponderNode, SupervisorNode, ValidatorNode,
};
use super::swarm::{CorrectionAgentNode, ProfileAgentNode};
use super::tutor::TutorNode;
use super::web_search::WebSearchNode;

/// Single tutor with per-namespace memory writers and a reflection loop.
///
/// The tutor's tool calls fan out to the writers, which all feed back into
/// the tutor; a plain answer goes through reflection, which either ends the
/// turn or loops a corrective prompt back.
pub fn tutor_graph() -> Result<Workflow, GraphCompileError> {
    GraphBuilder::new()
        .add_node(names::TUTOR, TutorNode)
        .add_node(
            names::UPDATE_PROFILE,
            MemoryUpdateNode::new(MemoryKind::Profile),
        )
        .add_node(
            names::UPDATE_TOPIC,
            MemoryUpdateNode::new(MemoryKind::Topic),
        )
        .add_node(
            names::UPDATE_GRAMMAR,
            MemoryUpdateNode::new(MemoryKind::Grammar),
        )
        .add_node(names::WEB_SEARCH, WebSearchNode)
        .add_node(names::REFLECT, ReflectNode)
        .add_edge("Start", names::TUTOR)
        .add_conditional_edge(names::TUTOR, route_after_tutor())
        .add_edge(names::UPDATE_PROFILE, names::TUTOR)
        .add_edge(names::UPDATE_TOPIC, names::TUTOR)
        .add_edge(names::UPDATE_GRAMMAR, names::TUTOR)
        .add_edge(names::WEB_SEARCH, names::TUTOR)
        .add_conditional_edge(names::REFLECT, route_after_reflect())
        .compile()
}

/// Two peer agents passing conversation ownership between themselves.
///
/// Entry routes to whichever agent held the conversation last; handoffs
/// replace the frontier directly, so the static routes only cover the
/// answer-and-stop case.
pub fn swarm_graph() -> Result<Workflow, GraphCompileError> {
    GraphBuilder::new()
        .add_node(names::CORRECTION_AGENT, CorrectionAgentNode)
        .add_node(names::PROFILE_AGENT, ProfileAgentNode)
        .add_conditional_edge("Start", route_to_active_agent(names::CORRECTION_AGENT))
        .add_edge(names::CORRECTION_AGENT, "End")
        .add_edge(names::PROFILE_AGENT, "End")
        .compile()
}

/// Coordinator over two specialists, with validation before the answer ships.
pub fn supervisor_graph() -> Result<Workflow, GraphCompileError> {
    GraphBuilder::new()
        .add_node(names::SUPERVISOR, SupervisorNode)
        .add_node(names::CORRECTION, CorrectionNode)
        .add_node(names::RESEARCH, ResearchNode)
        .add_node(names::VALIDATOR, ValidatorNode)
        .add_node(names::RESPONDER, ResponderNode)
        .add_edge("Start", names::SUPERVISOR)
        .add_conditional_edge(names::SUPERVISOR, route_after_supervisor())
        .add_edge(names::CORRECTION, names::VALIDATOR)
        .add_edge(names::RESEARCH, names::VALIDATOR)
        .add_conditional_edge(names::VALIDATOR, route_after_validator())
        .add_edge(names::RESPONDER, "End")
        .compile()
}
