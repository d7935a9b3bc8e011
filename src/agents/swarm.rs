//! Peer-to-peer agent pair: correction and profile specialists.
//!
//! Ownership of the conversation lives in the `active_agent` scratch field.
//! An agent answers directly or hands off to its sibling; the handoff leaves
//! exactly one visible transfer marker, and any memory writes the agent made
//! land in the same barrier before control moves.

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::names;
use super::prompts::{CORRECTION_INSTRUCTION, PROFILE_AGENT_INSTRUCTION};
use crate::control::Handoff;
use crate::memory::records::GrammarCorrection;
use crate::memory::{Namespace, new_record_id, search_or_empty};
use crate::message::{MemoryKind, Message, Role, ToolDirective};
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::state::StateSnapshot;

fn latest_user_text(snapshot: &StateSnapshot) -> Option<String> {
    snapshot
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
}

/// First handoff directive on the reply, if any.
fn handoff_request(reply: &Message) -> Option<(String, String)> {
    reply.tool_calls.iter().find_map(|c| match c.directive() {
        ToolDirective::Handoff { target, reason } => Some((target, reason)),
        _ => None,
    })
}

fn complete_delta(reply: Message, owner: &str) -> StateDelta {
    match handoff_request(&reply) {
        Some((target, reason)) => StateDelta::new()
            .with_scratch(ScratchDelta {
                active_agent: Some(target.clone()),
                ..Default::default()
            })
            .with_handoff(Handoff::to(target.as_str(), &reason)),
        None => StateDelta::new()
            .with_scratch(ScratchDelta {
                last_answer: Some(reply.content.clone()),
                active_agent: Some(owner.to_string()),
                ..Default::default()
            })
            .with_messages(vec![reply]),
    }
}

/// Checks the user's text, persists any correction, then answers or hands
/// off to the profile specialist.
pub struct CorrectionAgentNode;

#[async_trait]
impl Node for CorrectionAgentNode {
    #[instrument(skip_all, fields(user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let text = latest_user_text(&snapshot).ok_or(NodeError::MissingInput {
            what: "a user message to check",
        })?;

        let report = ctx.capabilities.grammar.check(&text).await?;
        if let Some(corrected) = &report.corrected {
            let correction = GrammarCorrection {
                original_text: text.clone(),
                corrected_text: corrected.clone(),
                explanation: report.issues.join("; "),
                improvement: None,
                when: Utc::now(),
            };
            let ns = Namespace::new(MemoryKind::Grammar, &ctx.user_id);
            ctx.memory
                .put(&ns, &new_record_id(), serde_json::to_value(&correction)?)
                .await?;
            ctx.emit("grammar", "correction recorded");
        }

        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 1);
        transcript.push(Message::system(CORRECTION_INSTRUCTION));
        transcript.extend(snapshot.messages.iter().cloned());
        let reply = ctx.capabilities.model.complete(&transcript).await?;

        Ok(complete_delta(reply, names::CORRECTION_AGENT))
    }
}

/// Extracts profile facts, persists them, then answers or hands back to the
/// correction specialist.
pub struct ProfileAgentNode;

#[async_trait]
impl Node for ProfileAgentNode {
    #[instrument(skip_all, fields(user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let ns = Namespace::new(MemoryKind::Profile, &ctx.user_id);
        let existing = search_or_empty(ctx.memory.as_ref(), &ns).await;
        let extracted = ctx
            .capabilities
            .extractor
            .extract(MemoryKind::Profile, &snapshot.messages, &existing)
            .await?;
        for record in extracted {
            let id = record.record_id.unwrap_or_else(new_record_id);
            ctx.memory.put(&ns, &id, record.value).await?;
        }

        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 1);
        transcript.push(Message::system(PROFILE_AGENT_INSTRUCTION));
        transcript.extend(snapshot.messages.iter().cloned());
        let reply = ctx.capabilities.model.complete(&transcript).await?;

        Ok(complete_delta(reply, names::PROFILE_AGENT))
    }
}
