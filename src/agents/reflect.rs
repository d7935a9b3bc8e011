//! Bounded self-correction over the tutor's answers.

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, ScratchDelta, StateDelta};
use crate::state::StateSnapshot;

/// Scores the latest plain answer against the turn's opening input.
///
/// A rejection injects one corrective user message and burns one retry; the
/// routing layer loops back to the tutor while the latest message is that
/// corrective prompt. Once the budget is spent the answer stands as-is, so a
/// hostile evaluator can never keep a turn alive forever.
pub struct ReflectNode;

#[async_trait]
impl Node for ReflectNode {
    #[instrument(skip_all, fields(step = ctx.step, retries = snapshot.scratch.retries))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateDelta, NodeError> {
        let Some(input) = snapshot.scratch.original_message.clone() else {
            return Ok(StateDelta::default());
        };
        let Some(answer) = snapshot.latest_plain_assistant() else {
            return Ok(StateDelta::default());
        };

        let evaluation = ctx
            .capabilities
            .evaluator
            .evaluate(&input, &answer.content)
            .await?;

        if evaluation.approved {
            ctx.emit("reflect", "answer approved");
            return Ok(StateDelta::default());
        }
        if snapshot.scratch.retries >= ctx.turn.max_retries {
            info!(
                retries = snapshot.scratch.retries,
                "retry budget exhausted, keeping the latest answer"
            );
            return Ok(StateDelta::default());
        }

        ctx.emit("reflect", format!("revision requested: {}", evaluation.comment));
        let corrective = format!(
            "Please revise your previous answer. {}",
            evaluation.comment
        );
        Ok(StateDelta::new()
            .with_messages(vec![Message::user(&corrective)])
            .with_scratch(ScratchDelta {
                retries: Some(snapshot.scratch.retries + 1),
                attempted_corrections: vec![evaluation.comment],
                ..Default::default()
            }))
    }
}
