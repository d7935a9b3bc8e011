//! Core identifiers for graph nodes and state channels.
//!
//! # Examples
//!
//! ```rust
//! use lingograph::types::NodeId;
//!
//! let tutor = NodeId::Named("tutor".to_string());
//! assert_eq!(tutor.encode(), "Named:tutor");
//! assert_eq!(NodeId::decode(&tutor.encode()), tutor);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within an agent graph.
///
/// `Start` and `End` are virtual: they carry no implementation, have no
/// incoming (`Start`) or outgoing (`End`) edges, and exist only as routing
/// anchors. Everything else is a `Named` node registered on the builder.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Start,
    End,
    Named(String),
}

impl NodeId {
    /// Persisted string form: `"Start"`, `"End"`, `"Named:tutor"`.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeId::Start => "Start".to_string(),
            NodeId::End => "End".to_string(),
            NodeId::Named(s) => format!("Named:{s}"),
        }
    }

    /// Inverse of [`encode`](Self::encode). Unrecognized forms decode as
    /// `Named` so old checkpoints stay loadable.
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeId::Start
        } else if s == "End" {
            NodeId::End
        } else if let Some(rest) = s.strip_prefix("Named:") {
            NodeId::Named(rest.to_string())
        } else {
            NodeId::Named(s.to_string())
        }
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Routing-function target name for this node.
    #[must_use]
    pub fn route_name(&self) -> String {
        match self {
            NodeId::Start => "Start".to_string(),
            NodeId::End => "End".to_string(),
            NodeId::Named(s) => s.clone(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

// Lets graph wiring use string literals where a NodeId is expected.
impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeId::Start,
            "End" => NodeId::End,
            other => NodeId::Named(other.to_string()),
        }
    }
}

/// Identifies a state channel for merge bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Message,
    Scratch,
    Error,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Scratch => write!(f, "scratch"),
            Self::Error => write!(f, "error"),
        }
    }
}
