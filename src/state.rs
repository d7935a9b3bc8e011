//! Versioned conversation state.
//!
//! [`ConversationState`] is the mutable container the executor owns for one
//! thread. It is organized into three channels: the transcript, the typed
//! per-turn scratch fields, and accumulated error events. Nodes never see it
//! directly; they receive an immutable [`StateSnapshot`] and hand back a
//! `StateDelta` that the barrier merges.
//!
//! # Examples
//!
//! ```rust
//! use lingograph::state::ConversationState;
//! use lingograph::channels::Channel;
//!
//! let mut state = ConversationState::new_with_user_message("Hello, I has a question");
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.messages.len(), 1);
//! assert_eq!(
//!     snapshot.scratch.original_message.as_deref(),
//!     Some("Hello, I has a question"),
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    channels::{Channel, ErrorsChannel, MessagesChannel, ScratchChannel, errors::ErrorEvent},
    message::{Message, Role},
    ports::GrammarReport,
};

/// Typed per-turn working fields.
///
/// Every field has replace-if-set merge semantics; a node that leaves a field
/// `None` in its delta leaves the current value alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratch {
    /// The user input that opened the current turn.
    pub original_message: Option<String>,
    /// Latest assistant answer produced this turn.
    pub last_answer: Option<String>,
    /// Most recent grammar-check outcome, pending persistence.
    pub pending_grammar: Option<GrammarReport>,
    /// Accumulated web-search context for the current turn.
    pub search_context: Option<String>,
    /// Which agent currently owns the conversation (swarm routing).
    pub active_agent: Option<String>,
    /// Corrective retries consumed by the reflection loop this turn.
    pub retries: u32,
    /// Corrective prompts already injected, oldest first.
    pub attempted_corrections: Vec<String>,
}

/// The per-thread state container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: MessagesChannel,
    pub scratch: ScratchChannel,
    pub errors: ErrorsChannel,
}

/// Immutable view handed to nodes for one step.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub messages_version: u32,
    pub scratch: Scratch,
    pub scratch_version: u32,
    pub errors: Vec<ErrorEvent>,
    pub errors_version: u32,
}

impl StateSnapshot {
    /// Latest assistant message, if any.
    #[must_use]
    pub fn latest_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Latest assistant message with no pending tool calls.
    #[must_use]
    pub fn latest_plain_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_plain_assistant())
    }
}

impl ConversationState {
    /// State for a brand-new thread opened by one user message.
    ///
    /// The opening text is also recorded as the turn's original message so
    /// the reflection loop can score answers against it.
    pub fn new_with_user_message(user_text: &str) -> Self {
        let scratch = Scratch {
            original_message: Some(user_text.to_string()),
            ..Scratch::default()
        };
        Self {
            messages: MessagesChannel::new(vec![Message::user(user_text)], 1),
            scratch: ScratchChannel::new(scratch, 1),
            errors: ErrorsChannel::default(),
        }
    }

    /// State seeded from an existing transcript.
    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: MessagesChannel::new(messages, 1),
            scratch: ScratchChannel::default(),
            errors: ErrorsChannel::default(),
        }
    }

    pub fn builder() -> ConversationStateBuilder {
        ConversationStateBuilder::default()
    }

    /// Append one user turn and mark it as the turn's original message.
    ///
    /// Versions are left alone here; the barrier owns version bumps.
    pub fn begin_turn(&mut self, user_text: &str) {
        self.messages.get_mut().push(Message::user(user_text));
        let scratch = self.scratch.get_mut();
        scratch.original_message = Some(user_text.to_string());
        scratch.last_answer = None;
        scratch.pending_grammar = None;
        scratch.search_context = None;
        scratch.retries = 0;
        scratch.attempted_corrections.clear();
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            messages_version: self.messages.version(),
            scratch: self.scratch.snapshot(),
            scratch_version: self.scratch.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }
}

/// Fluent construction for tests and checkpoint restore.
#[derive(Debug, Default)]
pub struct ConversationStateBuilder {
    messages: Vec<Message>,
    scratch: Scratch,
}

impl ConversationStateBuilder {
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        if self.scratch.original_message.is_none() {
            self.scratch.original_message = Some(content.to_string());
        }
        self
    }

    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_scratch(mut self, scratch: Scratch) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn with_active_agent(mut self, agent: &str) -> Self {
        self.scratch.active_agent = Some(agent.to_string());
        self
    }

    pub fn build(self) -> ConversationState {
        ConversationState {
            messages: MessagesChannel::new(self.messages, 1),
            scratch: ScratchChannel::new(self.scratch, 1),
            errors: ErrorsChannel::default(),
        }
    }
}
