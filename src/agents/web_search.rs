//! Web search with a write-through into the knowledge namespace.

use async_trait::async_trait;
use tracing::instrument;

use super::extractor::{extraction_transcript, triggering_call_id};
use crate::memory::{Namespace, new_record_id, search_or_empty};
use crate::message::{MemoryKind, Message, Role};
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::ports::DocumentSnippet;
use crate::state::StateSnapshot;

/// Searches the web for the turn's question and persists what it learned.
///
/// The raw snippets go into the turn's scratch context; the durable form goes
/// through the extractor so the knowledge namespace stays structured rather
/// than accumulating page dumps.
pub struct WebSearchNode;

fn render_snippets(snippets: &[DocumentSnippet]) -> String {
    snippets
        .iter()
        .map(|s| format!("[{}]\n{}", s.source, s.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Node for WebSearchNode {
    #[instrument(skip_all, fields(user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let question = snapshot
            .scratch
            .original_message
            .clone()
            .or_else(|| {
                snapshot
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.clone())
            })
            .ok_or(NodeError::MissingInput {
                what: "a user question to search for",
            })?;

        ctx.emit("search", format!("searching: {question}"));
        let snippets = ctx.capabilities.search.search(&question).await?;
        let context = render_snippets(&snippets);

        let ns = Namespace::new(MemoryKind::WebSearch, &ctx.user_id);
        let existing = search_or_empty(ctx.memory.as_ref(), &ns).await;
        let mut transcript = extraction_transcript(&snapshot.messages).to_vec();
        transcript.push(Message::system(&format!(
            "Web search results for '{question}':\n\n{context}"
        )));

        let extracted = ctx
            .capabilities
            .extractor
            .extract(MemoryKind::WebSearch, &transcript, &existing)
            .await?;
        for record in extracted {
            let id = record.record_id.unwrap_or_else(new_record_id);
            ctx.memory.put(&ns, &id, record.value).await?;
        }

        let call_id = triggering_call_id(&snapshot, MemoryKind::WebSearch);
        Ok(StateDelta::new()
            .with_messages(vec![Message::tool_response(
                "web_search",
                &call_id,
                &format!("Web search completed for: '{question}'"),
            )])
            .with_scratch(ScratchDelta {
                search_context: Some(context),
                ..Default::default()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippets_render_with_source_headers() {
        let snippets = vec![
            DocumentSnippet {
                source: "https://example.com/grammar".to_string(),
                content: "Subjunctive mood basics.".to_string(),
            },
            DocumentSnippet {
                source: "https://example.com/idioms".to_string(),
                content: "Common idioms.".to_string(),
            },
        ];
        let rendered = render_snippets(&snippets);
        assert!(rendered.starts_with("[https://example.com/grammar]"));
        assert!(rendered.contains("\n\n[https://example.com/idioms]"));
    }

    #[test]
    fn no_snippets_renders_empty_context() {
        assert_eq!(render_snippets(&[]), "");
    }
}
