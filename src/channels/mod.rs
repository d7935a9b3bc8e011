//! Versioned state channels.
//!
//! Each channel pairs its payload with a version counter. Versions bump only
//! when a barrier merge actually changed the payload, which lets persistence
//! and observers detect change cheaply.

pub mod errors;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use errors::ErrorEvent;

/// Common surface for versioned channels.
pub trait Channel {
    type Payload;

    fn version(&self) -> u32;
    fn set_version(&mut self, version: u32);
    fn get_mut(&mut self) -> &mut Self::Payload;
    fn snapshot(&self) -> Self::Payload
    where
        Self::Payload: Clone;
}

macro_rules! versioned_channel {
    ($(#[$meta:meta])* $name:ident, $payload:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            payload: $payload,
            version: u32,
        }

        impl $name {
            #[must_use]
            pub fn new(payload: $payload, version: u32) -> Self {
                Self { payload, version }
            }

            #[must_use]
            pub fn get(&self) -> &$payload {
                &self.payload
            }
        }

        impl Channel for $name {
            type Payload = $payload;

            fn version(&self) -> u32 {
                self.version
            }

            fn set_version(&mut self, version: u32) {
                self.version = version;
            }

            fn get_mut(&mut self) -> &mut $payload {
                &mut self.payload
            }

            fn snapshot(&self) -> $payload {
                self.payload.clone()
            }
        }
    };
}

versioned_channel!(
    /// Append-ordered conversation transcript.
    MessagesChannel,
    Vec<Message>
);

versioned_channel!(
    /// Per-turn working fields. Replace-if-set semantics at the barrier.
    ScratchChannel,
    crate::state::Scratch
);

versioned_channel!(
    /// Structured error events accumulated during a turn.
    ErrorsChannel,
    Vec<ErrorEvent>
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bumps_are_explicit() {
        let mut ch = MessagesChannel::new(vec![Message::user("hi")], 1);
        ch.get_mut().push(Message::assistant("hello"));
        assert_eq!(ch.version(), 1);
        ch.set_version(2);
        assert_eq!(ch.version(), 2);
        assert_eq!(ch.get().len(), 2);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut ch = ErrorsChannel::default();
        let snap = ch.snapshot();
        ch.get_mut().push(ErrorEvent::default());
        assert!(snap.is_empty());
        assert_eq!(ch.get().len(), 1);
    }
}
