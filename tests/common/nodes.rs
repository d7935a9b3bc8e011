//! Minimal nodes for wiring arbitrary test graphs.

use async_trait::async_trait;

use lingograph::message::Message;
use lingograph::node::{Node, NodeContext, NodeError, StateDelta};
use lingograph::state::StateSnapshot;

/// Appends one assistant message naming itself.
pub struct TestNode {
    pub name: &'static str,
}

#[async_trait]
impl Node for TestNode {
    async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StateDelta, NodeError> {
        Ok(StateDelta::new().with_messages(vec![Message::assistant(&format!("{} ran", self.name))]))
    }
}

/// Always fails, for the absorb-and-continue path.
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StateDelta, NodeError> {
        Err(NodeError::ValidationFailed("scripted failure".to_string()))
    }
}

/// Does nothing at all.
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StateDelta, NodeError> {
        Ok(StateDelta::default())
    }
}
