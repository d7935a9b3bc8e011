//! The shipped agents and graph topologies.
//!
//! Three ready-made graphs cover the layouts the service exposes:
//!
//! - [`graphs::tutor_graph`]: one memory-aware tutor, four namespace writers,
//!   and a bounded reflection loop.
//! - [`graphs::swarm_graph`]: correction and profile specialists passing
//!   conversation ownership between themselves.
//! - [`graphs::supervisor_graph`]: a coordinator delegating to specialists,
//!   with validation before the answer ships.
//!
//! Every node here is plain [`Node`](crate::node::Node) glue over the
//! capability ports; nothing in this module talks to an external service
//! directly, which is what keeps the whole layer scriptable in tests.

pub mod extractor;
pub mod graphs;
pub mod prompts;
pub mod reflect;
pub mod router;
pub mod supervisor;
pub mod swarm;
pub mod tutor;
pub mod web_search;

/// Route names for the shipped graphs' nodes.
pub mod names {
    pub const TUTOR: &str = "tutor";
    pub const UPDATE_PROFILE: &str = "update_profile";
    pub const UPDATE_TOPIC: &str = "update_topic";
    pub const UPDATE_GRAMMAR: &str = "update_grammar";
    pub const WEB_SEARCH: &str = "web_search";
    pub const REFLECT: &str = "reflect";

    pub const CORRECTION_AGENT: &str = "Correction";
    pub const PROFILE_AGENT: &str = "Profile";

    pub const SUPERVISOR: &str = "supervisor";
    pub const CORRECTION: &str = "correction";
    pub const RESEARCH: &str = "research";
    pub const VALIDATOR: &str = "validator";
    pub const RESPONDER: &str = "responder";

    /// Terminal route marker understood by every predicate.
    pub const END: &str = "End";
}

pub use extractor::MemoryUpdateNode;
pub use graphs::{supervisor_graph, swarm_graph, tutor_graph};
pub use reflect::ReflectNode;
pub use tutor::TutorNode;
pub use web_search::WebSearchNode;
