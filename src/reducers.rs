//! Deterministic merge rules for applying a [`StateDelta`] to state.
//!
//! Each channel has exactly one reducer. The barrier walks deltas in frontier
//! order and asks the registry to fold each one in; version bumps stay with
//! the barrier, which knows whether anything actually changed.
//!
//! Merge semantics:
//! - messages: append in delta order
//! - scratch: replace-if-set per field, append for attempted corrections
//! - errors: append

use crate::channels::Channel;
use crate::node::StateDelta;
use crate::state::ConversationState;
use crate::types::ChannelType;

/// One channel's merge rule.
pub trait Reducer: Send + Sync {
    /// Fold the delta into state. Returns true when the channel changed.
    fn apply(&self, state: &mut ConversationState, delta: &StateDelta) -> bool;
}

pub struct AppendMessages;

impl Reducer for AppendMessages {
    fn apply(&self, state: &mut ConversationState, delta: &StateDelta) -> bool {
        match &delta.messages {
            Some(messages) if !messages.is_empty() => {
                state.messages.get_mut().extend(messages.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

pub struct MergeScratch;

impl Reducer for MergeScratch {
    fn apply(&self, state: &mut ConversationState, delta: &StateDelta) -> bool {
        let Some(update) = &delta.scratch else {
            return false;
        };
        if update.is_empty() {
            return false;
        }
        let scratch = state.scratch.get_mut();
        let before = scratch.clone();

        if let Some(answer) = &update.last_answer {
            scratch.last_answer = Some(answer.clone());
        }
        if update.clear_pending_grammar {
            scratch.pending_grammar = None;
        }
        if let Some(report) = &update.pending_grammar {
            scratch.pending_grammar = Some(report.clone());
        }
        if let Some(context) = &update.search_context {
            scratch.search_context = Some(context.clone());
        }
        if let Some(agent) = &update.active_agent {
            scratch.active_agent = Some(agent.clone());
        }
        if let Some(retries) = update.retries {
            scratch.retries = retries;
        }
        scratch
            .attempted_corrections
            .extend(update.attempted_corrections.iter().cloned());

        *scratch != before
    }
}

pub struct AppendErrors;

impl Reducer for AppendErrors {
    fn apply(&self, state: &mut ConversationState, delta: &StateDelta) -> bool {
        match &delta.errors {
            Some(errors) if !errors.is_empty() => {
                state.errors.get_mut().extend(errors.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

/// Fixed channel-to-reducer mapping.
pub struct ReducerRegistry {
    entries: Vec<(ChannelType, Box<dyn Reducer>)>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                (ChannelType::Message, Box::new(AppendMessages)),
                (ChannelType::Scratch, Box::new(MergeScratch)),
                (ChannelType::Error, Box::new(AppendErrors)),
            ],
        }
    }
}

impl ReducerRegistry {
    /// Apply one delta across all channels. Returns the channels that changed.
    pub fn apply(&self, state: &mut ConversationState, delta: &StateDelta) -> Vec<ChannelType> {
        let mut changed = Vec::new();
        for (channel, reducer) in &self.entries {
            if reducer.apply(state, delta) {
                changed.push(*channel);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::{ErrorDetail, ErrorEvent};
    use crate::message::Message;
    use crate::node::ScratchDelta;
    use crate::ports::GrammarReport;

    fn base_state() -> ConversationState {
        ConversationState::new_with_user_message("hello")
    }

    #[test]
    fn empty_delta_changes_nothing() {
        let mut state = base_state();
        let changed = ReducerRegistry::default().apply(&mut state, &StateDelta::new());
        assert!(changed.is_empty());
    }

    #[test]
    fn messages_append_in_delta_order() {
        let mut state = base_state();
        let delta = StateDelta::new().with_messages(vec![
            Message::assistant("first"),
            Message::assistant("second"),
        ]);
        let changed = ReducerRegistry::default().apply(&mut state, &delta);
        assert_eq!(changed, vec![ChannelType::Message]);

        let snap = state.snapshot();
        assert_eq!(snap.messages.len(), 3);
        assert_eq!(snap.messages[2].content, "second");
    }

    #[test]
    fn scratch_fields_replace_only_when_set() {
        let mut state = base_state();
        state.scratch.get_mut().last_answer = Some("old".to_string());
        state.scratch.get_mut().retries = 1;

        let delta = StateDelta::new().with_scratch(ScratchDelta {
            retries: Some(2),
            attempted_corrections: vec!["be concise".to_string()],
            ..Default::default()
        });
        let changed = ReducerRegistry::default().apply(&mut state, &delta);
        assert_eq!(changed, vec![ChannelType::Scratch]);

        let scratch = state.snapshot().scratch;
        assert_eq!(scratch.last_answer.as_deref(), Some("old"));
        assert_eq!(scratch.retries, 2);
        assert_eq!(scratch.attempted_corrections, vec!["be concise"]);
    }

    #[test]
    fn clear_pending_grammar_is_distinct_from_leave_alone() {
        let mut state = base_state();
        state.scratch.get_mut().pending_grammar = Some(GrammarReport {
            issues: vec!["tense".to_string()],
            corrected: Some("I have a question".to_string()),
        });

        let leave = StateDelta::new().with_scratch(ScratchDelta {
            last_answer: Some("answer".to_string()),
            ..Default::default()
        });
        ReducerRegistry::default().apply(&mut state, &leave);
        assert!(state.snapshot().scratch.pending_grammar.is_some());

        let clear = StateDelta::new().with_scratch(ScratchDelta {
            clear_pending_grammar: true,
            ..Default::default()
        });
        let changed = ReducerRegistry::default().apply(&mut state, &clear);
        assert_eq!(changed, vec![ChannelType::Scratch]);
        assert!(state.snapshot().scratch.pending_grammar.is_none());
    }

    #[test]
    fn no_op_scratch_update_reports_unchanged() {
        let mut state = base_state();
        state.scratch.get_mut().retries = 2;
        let delta = StateDelta::new().with_scratch(ScratchDelta {
            retries: Some(2),
            ..Default::default()
        });
        let changed = ReducerRegistry::default().apply(&mut state, &delta);
        assert!(changed.is_empty());
    }

    #[test]
    fn errors_append() {
        let mut state = base_state();
        let delta = StateDelta::new().with_errors(vec![ErrorEvent::node(
            "tutor",
            1,
            ErrorDetail::msg("model unavailable"),
        )]);
        let changed = ReducerRegistry::default().apply(&mut state, &delta);
        assert_eq!(changed, vec![ChannelType::Error]);
        assert_eq!(state.snapshot().errors.len(), 1);
    }
}
