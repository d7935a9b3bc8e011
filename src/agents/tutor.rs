//! The memory-aware tutor node.

use async_trait::async_trait;
use tracing::instrument;

use super::prompts::render_tutor_system;
use crate::memory::{MemoryRecord, Namespace, search_or_empty};
use crate::message::{MemoryKind, Message};
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::state::StateSnapshot;

/// Answers the user with all four memory namespaces in context.
///
/// Reads degrade to empty blocks when the store is down; the tutor still
/// answers, it just remembers nothing. The model decides, via tool calls on
/// its reply, whether any namespace should be updated afterwards.
pub struct TutorNode;

/// Render a namespace's records as one block for the system prompt.
fn render_block(records: &[MemoryRecord]) -> String {
    records
        .iter()
        .map(|r| r.value.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Node for TutorNode {
    #[instrument(skip_all, fields(user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let memory = ctx.memory.as_ref();
        let ns = |kind| Namespace::new(kind, &ctx.user_id);
        let profile = search_or_empty(memory, &ns(MemoryKind::Profile)).await;
        let topics = search_or_empty(memory, &ns(MemoryKind::Topic)).await;
        let corrections = search_or_empty(memory, &ns(MemoryKind::Grammar)).await;
        let web = search_or_empty(memory, &ns(MemoryKind::WebSearch)).await;

        let system = render_tutor_system(
            &render_block(&profile),
            &render_block(&topics),
            &render_block(&corrections),
            &render_block(&web),
        );

        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 1);
        transcript.push(Message::system(&system));
        transcript.extend(snapshot.messages.iter().cloned());

        ctx.emit("tutor", "requesting completion");
        let reply = ctx.capabilities.model.complete(&transcript).await?;

        let mut delta = StateDelta::new();
        if reply.is_plain_assistant() {
            delta = delta.with_scratch(ScratchDelta {
                last_answer: Some(reply.content.clone()),
                ..Default::default()
            });
        }
        Ok(delta.with_messages(vec![reply]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn block_joins_records_line_per_record() {
        let records = vec![
            MemoryRecord {
                id: "a".to_string(),
                value: json!({"name": "Lance"}),
                updated_at: Utc::now(),
            },
            MemoryRecord {
                id: "b".to_string(),
                value: json!({"location": "SF"}),
                updated_at: Utc::now(),
            },
        ];
        let block = render_block(&records);
        assert_eq!(block.lines().count(), 2);
        assert!(block.contains("Lance"));
    }

    #[test]
    fn empty_namespace_renders_empty_block() {
        assert_eq!(render_block(&[]), "");
    }
}
