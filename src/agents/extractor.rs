//! Memory-update nodes, one per namespace.

use async_trait::async_trait;
use tracing::instrument;

use crate::memory::{Namespace, new_record_id, search_or_empty};
use crate::message::{MemoryKind, Message, ToolDirective};
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::state::StateSnapshot;

/// Persists one namespace from the running transcript.
///
/// The same node type serves all four namespaces; only the kind differs. It
/// hands the transcript (minus the tool-calling assistant message that
/// triggered it) plus the existing records to the extractor port, writes each
/// result back, and answers the triggering tool call so the model sees its
/// request fulfilled.
pub struct MemoryUpdateNode {
    kind: MemoryKind,
}

impl MemoryUpdateNode {
    #[must_use]
    pub fn new(kind: MemoryKind) -> Self {
        Self { kind }
    }

    /// Route name under which this node registers in the shipped graphs.
    #[must_use]
    pub fn route_name(kind: MemoryKind) -> &'static str {
        match kind {
            MemoryKind::Profile => "update_profile",
            MemoryKind::Topic => "update_topic",
            MemoryKind::Grammar => "update_grammar",
            MemoryKind::WebSearch => "web_search",
        }
    }

    fn reply_text(&self) -> &'static str {
        match self.kind {
            MemoryKind::Profile => "Updated profile information",
            MemoryKind::Topic => "Topic updated",
            MemoryKind::Grammar => "Grammar updated",
            MemoryKind::WebSearch => "Web search memory updated",
        }
    }
}

/// The transcript to extract from: everything before the tool-calling
/// assistant message that routed us here.
pub(super) fn extraction_transcript(messages: &[Message]) -> &[Message] {
    match messages.last() {
        Some(last) if last.role == crate::message::Role::Assistant && !last.tool_calls.is_empty() => {
            &messages[..messages.len() - 1]
        }
        _ => messages,
    }
}

/// Id of the tool call that requested an update of `kind`, if one is pending
/// on the latest assistant message.
pub(super) fn triggering_call_id(snapshot: &StateSnapshot, kind: MemoryKind) -> String {
    snapshot
        .latest_assistant()
        .and_then(|m| {
            m.tool_calls
                .iter()
                .find(|c| c.directive() == ToolDirective::UpdateMemory(kind))
        })
        .map(|c| c.id.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

#[async_trait]
impl Node for MemoryUpdateNode {
    #[instrument(skip_all, fields(kind = %self.kind, user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let ns = Namespace::new(self.kind, &ctx.user_id);
        let existing = search_or_empty(ctx.memory.as_ref(), &ns).await;
        let transcript = extraction_transcript(&snapshot.messages);

        let extracted = ctx
            .capabilities
            .extractor
            .extract(self.kind, transcript, &existing)
            .await?;

        let count = extracted.len();
        for record in extracted {
            let id = record.record_id.unwrap_or_else(new_record_id);
            ctx.memory.put(&ns, &id, record.value).await?;
        }
        ctx.emit("memory", format!("wrote {count} {} record(s)", self.kind));

        let call_id = triggering_call_id(&snapshot, self.kind);
        let mut delta = StateDelta::new().with_messages(vec![Message::tool_response(
            Self::route_name(self.kind),
            &call_id,
            self.reply_text(),
        )]);
        if self.kind == MemoryKind::Grammar {
            delta = delta.with_scratch(ScratchDelta {
                clear_pending_grammar: true,
                ..Default::default()
            });
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCallRequest;
    use crate::state::ConversationState;

    #[test]
    fn transcript_drops_trailing_tool_calling_message() {
        let messages = vec![
            Message::user("I has a question"),
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::update_memory(MemoryKind::Grammar)],
            ),
        ];
        assert_eq!(extraction_transcript(&messages).len(), 1);

        let plain = vec![Message::user("hi"), Message::assistant("hello")];
        assert_eq!(extraction_transcript(&plain).len(), 2);
    }

    #[test]
    fn triggering_id_matches_the_requested_kind() {
        let profile_call = ToolCallRequest::update_memory(MemoryKind::Profile);
        let topic_call = ToolCallRequest::update_memory(MemoryKind::Topic);
        let profile_id = profile_call.id.clone();
        let state = ConversationState::builder()
            .with_user_message("hi")
            .with_message(Message::assistant_with_calls(
                "",
                vec![topic_call, profile_call],
            ))
            .build();
        let snap = state.snapshot();

        assert_eq!(triggering_call_id(&snap, MemoryKind::Profile), profile_id);
        assert_eq!(triggering_call_id(&snap, MemoryKind::Grammar), "unknown");
    }

    #[test]
    fn route_names_are_stable() {
        assert_eq!(
            MemoryUpdateNode::route_name(MemoryKind::Profile),
            "update_profile"
        );
        assert_eq!(
            MemoryUpdateNode::route_name(MemoryKind::WebSearch),
            "web_search"
        );
    }
}
