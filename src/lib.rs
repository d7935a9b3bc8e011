//! # Lingograph: Graph-driven Conversational Agents with Long-term Memory
//!
//! Lingograph runs language-tutoring agents as directed graphs: nodes do one
//! unit of work against an immutable state snapshot, supersteps run whole
//! frontiers concurrently, and a deterministic barrier merges the results
//! into versioned per-thread state. Every superstep checkpoints, so a thread
//! survives a crash mid-turn; what the agent learns about a user lives in a
//! namespaced memory store that survives across threads.
//!
//! ## Core Concepts
//!
//! - **Nodes**: Async units of work returning typed state deltas
//! - **State**: Versioned channels (transcript, scratch, errors) per thread
//! - **Graph**: Declarative wiring with static and conditional edges
//! - **Executor**: The superstep loop with checkpoint-per-step durability
//! - **Memory**: Namespaced long-term records with idempotent writes
//! - **Ports**: Trait seams for model, extraction, search, grammar, scoring
//!
//! ## Quick Start
//!
//! ```
//! use lingograph::message::Message;
//! use lingograph::state::ConversationState;
//!
//! let user_msg = Message::user("Hello, I has a question");
//! let reply = Message::assistant("Of course! And a small note: \"I have a question\".");
//! assert!(reply.is_plain_assistant());
//!
//! let state = ConversationState::builder()
//!     .with_user_message("What's the weather?")
//!     .with_system_message("You are a friendly tutor")
//!     .build();
//! assert_eq!(state.snapshot().messages.len(), 2);
//! ```
//!
//! Defining a node:
//!
//! ```
//! use lingograph::node::{Node, NodeContext, NodeError, StateDelta};
//! use lingograph::message::Message;
//! use lingograph::state::StateSnapshot;
//! use async_trait::async_trait;
//!
//! struct GreetingNode;
//!
//! #[async_trait]
//! impl Node for GreetingNode {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<StateDelta, NodeError> {
//!         let greeting = Message::assistant("Hello! What shall we practice today?");
//!         Ok(StateDelta::new().with_messages(vec![greeting]))
//!     }
//! }
//! ```
//!
//! Ready-made graphs live in [`agents`]; the turn-level front door is
//! [`service::ChatService`].
//!
//! ## Module Guide
//!
//! - [`message`] - Transcript messages and the tool-call vocabulary
//! - [`state`] - Versioned conversation state and snapshots
//! - [`node`] - The node trait, contexts, and deltas
//! - [`graph`] - Graph construction and compile-time validation
//! - [`workflow`] - The compiled graph and its barrier
//! - [`executor`] - Superstep loop, checkpoints, streaming events
//! - [`memory`] - Long-term memory store and record schemas
//! - [`ports`] - Capability seams for external services
//! - [`agents`] - The shipped tutor, swarm, and supervisor graphs
//! - [`service`] - Turn-level chat API over a compiled graph

pub mod agents;
pub mod channels;
pub mod config;
pub mod control;
pub mod executor;
pub mod graph;
pub mod memory;
pub mod message;
pub mod node;
pub mod ports;
pub mod reducers;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod workflow;
