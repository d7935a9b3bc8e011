//! Supervisor team: coordinator, two specialists, a validator, a responder.

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::names;
use super::prompts::{RESEARCH_INSTRUCTION, SUPERVISOR_INSTRUCTION};
use crate::memory::records::GrammarCorrection;
use crate::memory::{Namespace, new_record_id};
use crate::message::{MemoryKind, Message, Role};
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::state::StateSnapshot;

fn original_text(snapshot: &StateSnapshot) -> Result<String, NodeError> {
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
        .ok_or(NodeError::MissingInput {
            what: "a user message to work on",
        })
}

/// Delegates to specialists via handoff calls on its reply; a plain reply
/// means nothing is left to delegate and the responder takes over.
pub struct SupervisorNode;

#[async_trait]
impl Node for SupervisorNode {
    #[instrument(skip_all, fields(step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 1);
        transcript.push(Message::system(SUPERVISOR_INSTRUCTION));
        transcript.extend(snapshot.messages.iter().cloned());
        let reply = ctx.capabilities.model.complete(&transcript).await?;
        Ok(StateDelta::new().with_messages(vec![reply]))
    }
}

/// Grammar specialist. Replies with the corrected text, or `CORRECT` when
/// nothing needed fixing, and persists the correction either way it finds one.
pub struct CorrectionNode;

#[async_trait]
impl Node for CorrectionNode {
    #[instrument(skip_all, fields(user = %ctx.user_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let text = original_text(&snapshot)?;
        let report = ctx.capabilities.grammar.check(&text).await?;

        let reply = match &report.corrected {
            Some(corrected) => {
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
                corrected.clone()
            }
            None => "CORRECT".to_string(),
        };

        Ok(StateDelta::new()
            .with_messages(vec![Message::assistant(&reply)])
            .with_scratch(ScratchDelta {
                pending_grammar: Some(report),
                ..Default::default()
            }))
    }
}

/// Research specialist. Brings search findings into the transcript and keeps
/// the raw context in scratch for the responder.
pub struct ResearchNode;

#[async_trait]
impl Node for ResearchNode {
    #[instrument(skip_all, fields(step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let question = original_text(&snapshot)?;
        let snippets = ctx.capabilities.search.search(&question).await?;
        let findings = snippets
            .iter()
            .map(|s| format!("- {} ({})", s.content, s.source))
            .collect::<Vec<_>>()
            .join("\n");

        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 2);
        transcript.push(Message::system(RESEARCH_INSTRUCTION));
        transcript.extend(snapshot.messages.iter().cloned());
        transcript.push(Message::system(&format!(
            "Search findings for '{question}':\n{findings}"
        )));
        let reply = ctx.capabilities.model.complete(&transcript).await?;

        Ok(StateDelta::new()
            .with_messages(vec![reply])
            .with_scratch(ScratchDelta {
                search_context: Some(findings),
                ..Default::default()
            }))
    }
}

/// Scores the specialists' work. Rejection sends the turn back to the
/// supervisor and burns a retry; approval or an exhausted budget releases it
/// to the responder. The verdict is a transcript message so routing can read
/// it after the barrier.
pub struct ValidatorNode;

#[async_trait]
impl Node for ValidatorNode {
    #[instrument(skip_all, fields(step = ctx.step, retries = snapshot.scratch.retries))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let input = original_text(&snapshot)?;
        let Some(answer) = snapshot.latest_plain_assistant() else {
            return Ok(StateDelta::new().with_messages(vec![Message::assistant("FINISH")]));
        };

        let evaluation = ctx
            .capabilities
            .evaluator
            .evaluate(&input, &answer.content)
            .await?;

        if !evaluation.approved && snapshot.scratch.retries < ctx.turn.max_retries {
            ctx.emit("validator", format!("rejected: {}", evaluation.comment));
            return Ok(StateDelta::new()
                .with_messages(vec![Message::assistant(names::SUPERVISOR)])
                .with_scratch(ScratchDelta {
                    retries: Some(snapshot.scratch.retries + 1),
                    attempted_corrections: vec![evaluation.comment],
                    ..Default::default()
                }));
        }
        Ok(StateDelta::new().with_messages(vec![Message::assistant("FINISH")]))
    }
}

/// Writes the user-facing answer from everything the team produced.
pub struct ResponderNode;

#[async_trait]
impl Node for ResponderNode {
    #[instrument(skip_all, fields(step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let mut transcript = Vec::with_capacity(snapshot.messages.len() + 1);
        transcript.push(Message::system(SUPERVISOR_INSTRUCTION));
        transcript.extend(snapshot.messages.iter().cloned());
        let reply = ctx.capabilities.model.complete(&transcript).await?;

        Ok(StateDelta::new()
            .with_scratch(ScratchDelta {
                last_answer: Some(reply.content.clone()),
                ..Default::default()
            })
            .with_messages(vec![reply]))
    }
}
