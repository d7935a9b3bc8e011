//! Multi-agent transfers: the swarm pair and the supervisor team.

use serde_json::json;
use std::sync::Arc;

use lingograph::agents::{supervisor_graph, swarm_graph};
use lingograph::executor::checkpoint::Checkpointer;
use lingograph::memory::{MemoryStore, Namespace};
use lingograph::message::{MemoryKind, Message, Role, ToolCallRequest};
use lingograph::ports::ExtractedRecord;

mod common;
use common::*;

#[tokio::test]
async fn swarm_handoff_moves_ownership_after_memory_lands() {
    let capabilities = capabilities(
        Arc::new(ScriptedModel::new(vec![
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::handoff(
                    "Profile",
                    "user shared personal info",
                )],
            ),
            Message::assistant("Thanks, Lance! I'll remember that."),
        ])),
        Arc::new(ScriptedExtractor::for_kind(
            MemoryKind::Profile,
            vec![ExtractedRecord::insert(json!({"name": "Lance"}))],
        )),
        Arc::new(ScriptedEvaluator::approving()),
    );
    let harness = Harness::new(swarm_graph().unwrap(), capabilities);

    let reply = harness
        .service()
        .chat("lance", "t1", "Hi, I'm Lance. I has a new hobby")
        .await
        .unwrap();
    assert_eq!(reply.text, "Thanks, Lance! I'll remember that.");

    // the correction agent's write landed even though it handed off
    let grammar = harness
        .memory
        .search(&Namespace::new(MemoryKind::Grammar, "lance"))
        .await
        .unwrap();
    assert_eq!(grammar.len(), 1);
    let profile = harness
        .memory
        .search(&Namespace::new(MemoryKind::Profile, "lance"))
        .await
        .unwrap();
    assert_eq!(profile.len(), 1);

    let cp = harness.checkpointer.load("t1").await.unwrap().unwrap();
    let snap = cp.state.snapshot();
    let markers: Vec<_> = snap
        .messages
        .iter()
        .filter(|m| m.content.starts_with("Successfully transferred to"))
        .collect();
    assert_eq!(markers.len(), 1, "exactly one transfer marker per handoff");
    assert_eq!(markers[0].role, Role::Tool);
    assert_eq!(
        markers[0].content,
        "Successfully transferred to Profile - user shared personal info"
    );
    assert_eq!(snap.scratch.active_agent.as_deref(), Some("Profile"));
}

#[tokio::test]
async fn swarm_resumes_with_the_agent_that_held_the_conversation() {
    let capabilities = capabilities(
        Arc::new(ScriptedModel::new(vec![
            // turn one: correction hands off, profile answers
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::handoff("Profile", "intro")],
            ),
            Message::assistant("Got it!"),
            // turn two goes straight to the profile agent
            Message::assistant("Welcome back, Lance!"),
        ])),
        Arc::new(ScriptedExtractor::for_kind(
            MemoryKind::Profile,
            vec![ExtractedRecord::insert(json!({"name": "Lance"}))],
        )),
        Arc::new(ScriptedEvaluator::approving()),
    );
    let harness = Harness::new(swarm_graph().unwrap(), capabilities);
    let service = harness.service();

    service.chat("lance", "t1", "I'm Lance").await.unwrap();
    let second = service.chat("lance", "t1", "Hello again").await.unwrap();

    assert_eq!(second.text, "Welcome back, Lance!");
    assert_eq!(second.steps, 1, "entry routed directly to the active agent");
}

#[tokio::test]
async fn supervisor_delegates_validates_and_responds() {
    let capabilities = capabilities(
        Arc::new(ScriptedModel::new(vec![
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::handoff("correction", "grammar fix needed")],
            ),
            Message::assistant("All polished! Your sentence is \"I have a question\"."),
        ])),
        Arc::new(ScriptedExtractor::default()),
        Arc::new(ScriptedEvaluator::approving()),
    );
    let harness = Harness::new(supervisor_graph().unwrap(), capabilities);

    let reply = harness
        .service()
        .chat("lance", "t1", "I has a question")
        .await
        .unwrap();
    assert_eq!(
        reply.text,
        "All polished! Your sentence is \"I have a question\"."
    );

    let grammar = harness
        .memory
        .search(&Namespace::new(MemoryKind::Grammar, "lance"))
        .await
        .unwrap();
    assert_eq!(grammar.len(), 1);

    let cp = harness.checkpointer.load("t1").await.unwrap().unwrap();
    let snap = cp.state.snapshot();
    assert!(
        snap.messages
            .iter()
            .any(|m| m.content == "I have a question"),
        "the specialist's corrected text is in the transcript"
    );
    assert!(snap.messages.iter().any(|m| m.content == "FINISH"));
}

#[tokio::test]
async fn validator_rejection_bounces_back_to_the_supervisor() {
    let evaluator = Arc::new(ScriptedEvaluator::rejecting());
    let capabilities = capabilities(
        Arc::new(ScriptedModel::new(vec![
            Message::assistant_with_calls(
                "",
                vec![ToolCallRequest::handoff("correction", "check grammar")],
            ),
            // second supervisor pass gives up on delegating
            Message::assistant("Let me answer directly."),
            Message::assistant("Final answer after a second look."),
        ])),
        Arc::new(ScriptedExtractor::default()),
        evaluator.clone(),
    );
    let harness = Harness::new(supervisor_graph().unwrap(), capabilities);

    let reply = harness
        .service()
        .chat("lance", "t1", "I has a question")
        .await
        .unwrap();

    assert_eq!(*evaluator.calls.lock(), 1);
    assert_eq!(reply.text, "Final answer after a second look.");

    let cp = harness.checkpointer.load("t1").await.unwrap().unwrap();
    let snap = cp.state.snapshot();
    assert_eq!(snap.scratch.retries, 1);
    assert!(
        snap.messages.iter().any(|m| m.content == "supervisor"),
        "the rejection verdict is on the transcript"
    );
}
