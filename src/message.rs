//! Conversation messages and the tool-call vocabulary the router understands.
//!
//! A [`Message`] is one entry in a thread transcript. Assistant messages may
//! carry [`ToolCallRequest`]s, which the routing layer parses into the closed
//! [`ToolDirective`] enum. Anything outside that vocabulary is treated as
//! unknown by the router rather than dispatched on raw strings.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The sender of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    /// Tool responses and transfer markers.
    Tool,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "assistant" => Role::Assistant,
            "system" => Role::System,
            "tool" => Role::Tool,
            _ => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured request emitted by the model inside an assistant message.
///
/// `args` stays as raw JSON here; interpretation happens in one place, via
/// [`ToolCallRequest::directive`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// Memory namespaces recognized by the store and the router.
///
/// Closed on purpose: routing matches exhaustively on this enum, so a new
/// namespace is a code change, not a runtime string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Profile,
    Topic,
    Grammar,
    WebSearch,
}

impl MemoryKind {
    /// Dispatch order when one turn requests several updates.
    pub const ALL: [MemoryKind; 4] = [
        MemoryKind::Profile,
        MemoryKind::Topic,
        MemoryKind::Grammar,
        MemoryKind::WebSearch,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Profile => "profile",
            MemoryKind::Topic => "topic",
            MemoryKind::Grammar => "grammar",
            MemoryKind::WebSearch => "web_search",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "profile" => Some(MemoryKind::Profile),
            "topic" => Some(MemoryKind::Topic),
            "grammar" => Some(MemoryKind::Grammar),
            "web_search" => Some(MemoryKind::WebSearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The interpreted form of a [`ToolCallRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolDirective {
    /// Persist long-term memory of the given kind.
    UpdateMemory(MemoryKind),
    /// Transfer control to a sibling agent.
    Handoff { target: String, reason: String },
    /// Anything the router does not understand. Carried so callers can log it.
    Unknown { name: String },
}

impl ToolCallRequest {
    /// Tool name the model uses to request a memory write.
    pub const UPDATE_MEMORY: &'static str = "update_memory";
    /// Tool name the model uses to request an agent transfer.
    pub const HANDOFF: &'static str = "handoff";

    /// Build a memory-update request with a fresh id.
    #[must_use]
    pub fn update_memory(kind: MemoryKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: Self::UPDATE_MEMORY.to_string(),
            args: json!({ "update_type": kind.as_str() }),
        }
    }

    /// Build a handoff request with a fresh id.
    #[must_use]
    pub fn handoff(target: &str, reason: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: Self::HANDOFF.to_string(),
            args: json!({ "target": target, "reason": reason }),
        }
    }

    /// Interpret this call into the closed directive vocabulary.
    ///
    /// Malformed args collapse into `Unknown` so the caller can fail open.
    #[must_use]
    pub fn directive(&self) -> ToolDirective {
        match self.name.as_str() {
            Self::UPDATE_MEMORY => {
                let kind = self
                    .args
                    .get("update_type")
                    .and_then(Value::as_str)
                    .and_then(MemoryKind::parse);
                match kind {
                    Some(kind) => ToolDirective::UpdateMemory(kind),
                    None => ToolDirective::Unknown {
                        name: self.name.clone(),
                    },
                }
            }
            Self::HANDOFF => {
                let target = self.args.get("target").and_then(Value::as_str);
                match target {
                    Some(target) => ToolDirective::Handoff {
                        target: target.to_string(),
                        reason: self
                            .args
                            .get("reason")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    },
                    None => ToolDirective::Unknown {
                        name: self.name.clone(),
                    },
                }
            }
            other => ToolDirective::Unknown {
                name: other.to_string(),
            },
        }
    }
}

/// A message in a conversation thread.
///
/// `name` tags the originating node for tool responses and transfer markers;
/// `tool_call_id` links a tool response back to the request that produced it.
///
/// # Examples
///
/// ```
/// use lingograph::message::{Message, Role};
///
/// let user = Message::user("Hello!");
/// assert_eq!(user.role, Role::User);
///
/// let reply = Message::assistant("Hi there!");
/// assert!(reply.is_plain_assistant());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Originating node tag, where one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the tool call this message responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Structured requests attached to an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    #[must_use]
    pub fn with_role(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::with_role(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::with_role(Role::System, content)
    }

    /// An assistant message carrying tool-call requests.
    #[must_use]
    pub fn assistant_with_calls(content: &str, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// A tool response linked to the call that requested it.
    #[must_use]
    pub fn tool_response(node: &str, tool_call_id: &str, content: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            name: Some(node.to_string()),
            tool_call_id: Some(tool_call_id.to_string()),
            tool_calls: Vec::new(),
        }
    }

    /// True for an assistant message with no pending tool calls, i.e. a
    /// candidate final answer.
    #[must_use]
    pub fn is_plain_assistant(&self) -> bool {
        self.role == Role::Assistant && self.tool_calls.is_empty()
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_constructors_set_roles() {
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::assistant("hi").role, Role::Assistant);
        assert_eq!(Message::system("hi").role, Role::System);
    }

    #[test]
    fn plain_assistant_requires_empty_calls() {
        let plain = Message::assistant("done");
        assert!(plain.is_plain_assistant());

        let busy = Message::assistant_with_calls(
            "",
            vec![ToolCallRequest::update_memory(MemoryKind::Profile)],
        );
        assert!(!busy.is_plain_assistant());
        assert!(!Message::user("hi").is_plain_assistant());
    }

    #[test]
    fn update_memory_directive_round_trips_kind() {
        for kind in MemoryKind::ALL {
            let call = ToolCallRequest::update_memory(kind);
            assert_eq!(call.directive(), ToolDirective::UpdateMemory(kind));
        }
    }

    #[test]
    fn handoff_directive_carries_target_and_reason() {
        let call = ToolCallRequest::handoff("Profile", "user shared personal info");
        assert_eq!(
            call.directive(),
            ToolDirective::Handoff {
                target: "Profile".to_string(),
                reason: "user shared personal info".to_string(),
            }
        );
    }

    #[test]
    fn malformed_and_unrecognized_calls_are_unknown() {
        let bad_kind = ToolCallRequest {
            id: "1".to_string(),
            name: ToolCallRequest::UPDATE_MEMORY.to_string(),
            args: json!({ "update_type": "moods" }),
        };
        assert!(matches!(bad_kind.directive(), ToolDirective::Unknown { .. }));

        let missing_target = ToolCallRequest {
            id: "2".to_string(),
            name: ToolCallRequest::HANDOFF.to_string(),
            args: json!({}),
        };
        assert!(matches!(
            missing_target.directive(),
            ToolDirective::Unknown { .. }
        ));

        let alien = ToolCallRequest {
            id: "3".to_string(),
            name: "summon_demon".to_string(),
            args: Value::Null,
        };
        assert_eq!(
            alien.directive(),
            ToolDirective::Unknown {
                name: "summon_demon".to_string()
            }
        );
    }

    #[test]
    fn memory_kind_parse_is_inverse_of_as_str() {
        for kind in MemoryKind::ALL {
            assert_eq!(MemoryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MemoryKind::parse("unknown"), None);
    }

    #[test]
    fn message_serde_round_trip() {
        let msg = Message::assistant_with_calls(
            "checking",
            vec![ToolCallRequest::update_memory(MemoryKind::Topic)],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }
}
