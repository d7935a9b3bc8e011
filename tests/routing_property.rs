//! Property coverage for routing and handoff invariants.

use proptest::prelude::*;

use lingograph::agents::router::route_after_tutor;
use lingograph::control::{FrontierCommand, Handoff};
use lingograph::message::{MemoryKind, Message, ToolCallRequest};
use lingograph::node::StateDelta;
use lingograph::state::ConversationState;

#[derive(Clone, Debug)]
enum CallSpec {
    Memory(MemoryKind),
    Handoff(String),
    Unknown(String),
}

fn call_spec() -> impl Strategy<Value = CallSpec> {
    prop_oneof![
        prop_oneof![
            Just(MemoryKind::Profile),
            Just(MemoryKind::Topic),
            Just(MemoryKind::Grammar),
            Just(MemoryKind::WebSearch),
        ]
        .prop_map(CallSpec::Memory),
        "[A-Z][a-z]{1,8}".prop_map(CallSpec::Handoff),
        "[a-z_]{1,12}".prop_map(CallSpec::Unknown),
    ]
}

fn build_call(spec: &CallSpec) -> ToolCallRequest {
    match spec {
        CallSpec::Memory(kind) => ToolCallRequest::update_memory(*kind),
        CallSpec::Handoff(target) => ToolCallRequest::handoff(target, "because"),
        CallSpec::Unknown(name) => ToolCallRequest {
            id: "x".to_string(),
            name: name.clone(),
            args: serde_json::Value::Null,
        },
    }
}

fn memory_route_rank(route: &str) -> Option<usize> {
    ["update_profile", "update_topic", "update_grammar", "web_search"]
        .iter()
        .position(|r| r == &route)
}

proptest! {
    #[test]
    fn tutor_routing_is_total_ordered_and_deduplicated(specs in prop::collection::vec(call_spec(), 1..8)) {
        let calls: Vec<_> = specs.iter().map(build_call).collect();
        let snapshot = ConversationState::builder()
            .with_user_message("hi")
            .with_message(Message::assistant_with_calls("", calls))
            .build()
            .snapshot();

        let routes = route_after_tutor()(snapshot);

        // always somewhere to go
        prop_assert!(!routes.is_empty());

        // no duplicates
        let mut seen = routes.clone();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), routes.len());

        if routes == vec!["End".to_string()] {
            // only reachable when nothing routable was recognized
            prop_assert!(
                !specs.iter().any(|s| matches!(s, CallSpec::Memory(_))
                    || matches!(s, CallSpec::Handoff(t) if t != "End")),
                "End despite recognized directives: {:?}", specs
            );
        } else {
            // memory routes come first, in fixed namespace order
            let memory_ranks: Vec<usize> = routes
                .iter()
                .filter_map(|r| memory_route_rank(r))
                .collect();
            let mut sorted = memory_ranks.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&memory_ranks, &sorted);

            let first_non_memory = routes
                .iter()
                .position(|r| memory_route_rank(r).is_none())
                .unwrap_or(routes.len());
            prop_assert!(
                routes[first_non_memory..]
                    .iter()
                    .all(|r| memory_route_rank(r).is_none()),
                "memory route after a handoff target in {:?}", routes
            );
        }
    }

    #[test]
    fn handoff_always_leaves_one_marker_and_one_replace(
        target in "[A-Z][a-zA-Z]{0,12}",
        reason in "[ a-zA-Z]{0,40}",
    ) {
        let delta = StateDelta::new().with_handoff(Handoff::to(target.as_str(), &reason));

        let messages = delta.messages.as_ref().unwrap();
        prop_assert_eq!(messages.len(), 1);
        let marker_prefix = format!("Successfully transferred to {target}");
        prop_assert!(messages[0].content.starts_with(&marker_prefix));

        match delta.command {
            Some(FrontierCommand::Replace(targets)) => {
                prop_assert_eq!(targets.len(), 1);
                prop_assert_eq!(targets[0].route_name(), target);
            }
            other => prop_assert!(false, "expected a replace command, got {:?}", other),
        }
    }
}
