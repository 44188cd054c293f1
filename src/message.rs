use alloc::string::String;

use crate::{EntityId, Timestamp};

/// A logical envelope exchanged between two entities.
///
/// Carries the sender's identity, the logical send time and a reference to
/// the previous message on the same (sender, destination) chain. The payload
/// is opaque to the protocol.
///
/// Messages are stamped by [`Deduplicator::send`](crate::Deduplicator::send)
/// and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message<P> {
    sender: EntityId,
    timestamp: Timestamp,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    predecessor: Option<Timestamp>,
    payload: P,
}

impl<P> Message<P> {
    /// Rebuild a message from its parts, e.g. after decoding it from a
    /// transport.
    pub fn from_parts(
        sender: impl Into<EntityId>,
        timestamp: Timestamp,
        predecessor: Option<Timestamp>,
        payload: P,
    ) -> Self {
        Self {
            sender: sender.into(),
            timestamp,
            predecessor,
            payload,
        }
    }

    /// The entity that sent this message.
    #[must_use]
    pub fn sender(&self) -> &EntityId {
        &self.sender
    }

    /// Logical send time.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Timestamp of the previous message on this chain, `None` for the first.
    #[must_use]
    pub fn predecessor(&self) -> Option<Timestamp> {
        self.predecessor
    }

    /// The operation payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the envelope, keeping only the payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

/// An entity operation request, a ready-made payload for [`Message`].
///
/// # Example
///
/// ```
/// use causal_dedup::{Deduplicator, Operation, Timestamp};
///
/// let mut sender = Deduplicator::new("@counter@a");
/// let msg = sender.send(
///     &"@counter@b".into(),
///     Operation::signal("add").with_input("5"),
///     Timestamp::from_ticks(100),
/// );
/// assert_eq!(msg.payload().name, "add");
/// assert!(msg.payload().is_signal);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    /// Name of the entity operation to invoke.
    pub name: String,
    /// Serialized operation input, if any.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub input: Option<String>,
    /// One-way signal (no response expected) rather than a call.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_signal: bool,
}

impl Operation {
    /// A call expecting a response.
    pub fn call(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            is_signal: false,
        }
    }

    /// A fire-and-forget signal.
    pub fn signal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            is_signal: true,
        }
    }

    /// Attach serialized input.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}
