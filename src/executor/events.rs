//! Turn event stream.
//!
//! Streaming a turn means observing a finite sequence of events on a channel:
//! zero or more node messages and step completions, closed by exactly one
//! terminal event. Consumers that drop the receiver do not fail the turn; the
//! emitter silently drops events nobody is listening for.

use crate::state::StateSnapshot;

/// One observable moment in a running turn.
#[derive(Clone, Debug)]
pub enum TurnEvent {
    /// Free-form progress note from a node.
    NodeMessage {
        node: String,
        step: u64,
        scope: String,
        message: String,
    },
    /// A superstep finished and its state was checkpointed.
    StepCompleted {
        thread_id: String,
        step: u64,
        snapshot: StateSnapshot,
    },
    /// The turn reached a terminal outcome. Always the last event.
    Terminal { thread_id: String, steps: u64 },
}

/// Handle nodes and the executor emit through.
///
/// `disabled()` is used for non-streaming turns so node code never has to
/// branch on whether anyone is listening. Emission is infallible: a
/// disconnected consumer must never change how a turn runs.
#[derive(Clone, Debug)]
pub enum EventEmitter {
    Disabled,
    Channel(flume::Sender<TurnEvent>),
}

impl EventEmitter {
    #[must_use]
    pub fn disabled() -> Self {
        EventEmitter::Disabled
    }

    /// Create an emitter with an unbounded channel behind it.
    #[must_use]
    pub fn channel() -> (Self, flume::Receiver<TurnEvent>) {
        let (tx, rx) = flume::unbounded();
        (EventEmitter::Channel(tx), rx)
    }

    pub fn emit(&self, event: TurnEvent) {
        if let EventEmitter::Channel(tx) = self {
            // Disconnected receiver: the event is dropped, the turn goes on.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(steps: u64) -> TurnEvent {
        TurnEvent::Terminal {
            thread_id: "t".to_string(),
            steps,
        }
    }

    #[test]
    fn disabled_emitter_accepts_everything() {
        EventEmitter::disabled().emit(terminal(0));
    }

    #[test]
    fn channel_emitter_delivers_in_order() {
        let (emitter, rx) = EventEmitter::channel();
        for step in 0..3 {
            emitter.emit(TurnEvent::NodeMessage {
                node: "tutor".to_string(),
                step,
                scope: "progress".to_string(),
                message: format!("step {step}"),
            });
        }
        drop(emitter);
        let steps: Vec<u64> = rx
            .iter()
            .map(|e| match e {
                TurnEvent::NodeMessage { step, .. } => step,
                _ => panic!("unexpected event"),
            })
            .collect();
        assert_eq!(steps, vec![0, 1, 2]);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (emitter, rx) = EventEmitter::channel();
        drop(rx);
        emitter.emit(terminal(1));
        emitter.emit(terminal(2));
    }
}
