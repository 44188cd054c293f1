use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use tracing::{debug, error};

use crate::{CausalityViolation, EntityId, Message, ReceiveBuffer, Timestamp, TimestampExhausted};

/// Per-entity deduplication and causal-reordering state.
///
/// Owned by exactly one entity instance and mutated only during that
/// entity's serialized turns. Outgoing messages are stamped with
/// [`send`](Self::send); inbound messages pass through
/// [`receive`](Self::receive), which releases them exactly once, in the
/// order their sender produced them. [`collect`](Self::collect) prunes
/// tracking state once a linger watermark proves it unnecessary.
///
/// Ordering is guaranteed per (sender, destination) chain only; messages
/// from different origins are released independently as they arrive.
///
/// # Example
///
/// ```
/// use causal_dedup::{Deduplicator, Timestamp};
///
/// let mut a = Deduplicator::new("a");
/// let mut b = Deduplicator::new("b");
///
/// let now = Timestamp::from_ticks(100);
/// let first = a.send(&"b".into(), "first", now);
/// let second = a.send(&"b".into(), "second", now); // clock did not move
///
/// // The transport reorders and duplicates.
/// assert!(b.receive(second.clone()).unwrap().is_empty());
/// let delivered = b.receive(first.clone()).unwrap();
/// assert_eq!(delivered.len(), 2);
/// assert!(b.receive(second).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "P: serde::Deserialize<'de>"))
)]
pub struct Deduplicator<P> {
    #[cfg_attr(feature = "serde", serde(skip))]
    id: EntityId,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    sent: BTreeMap<EntityId, Timestamp>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    received: BTreeMap<EntityId, ReceiveBuffer<P>>,
}

/// What a [`Deduplicator::collect`] sweep removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectStats {
    /// Destination entries dropped from the send log.
    pub sent_removed: usize,
    /// Origin buffers dropped from the receive side.
    pub received_removed: usize,
}

impl CollectStats {
    /// Whether the sweep removed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent_removed == 0 && self.received_removed == 0
    }
}

impl<P> Deduplicator<P> {
    /// Create empty state for the entity `id`.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            sent: BTreeMap::new(),
            received: BTreeMap::new(),
        }
    }

    /// The owning entity.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Attach the owning entity's id. The id is not persisted, so state
    /// loaded from storage must be rebound before sending.
    pub fn rebind(&mut self, id: impl Into<EntityId>) {
        self.id = id.into();
    }

    /// Stamp an outgoing message for `destination`.
    ///
    /// The returned message carries this entity as sender, a timestamp
    /// strictly after anything previously sent to `destination` (using
    /// `last + ε` when `now` has not advanced past it) and the previous
    /// timestamp as its predecessor.
    ///
    /// A chain that already reached `u64::MAX` ticks has no later
    /// timestamp: the exhaustion is logged at `error!` and the message is
    /// stamped with the last timestamp again, which the receiver drops as a
    /// duplicate. Use [`try_send`](Self::try_send) to observe this case.
    pub fn send(&mut self, destination: &EntityId, payload: P, now: Timestamp) -> Message<P> {
        match self.next_timestamp(destination, now) {
            Ok((timestamp, predecessor)) => self.stamp(destination, timestamp, predecessor, payload),
            Err(exhausted) => {
                error!(entity = %self.id, %exhausted, "send timestamps exhausted");
                let last = exhausted.last;
                Message::from_parts(self.id.clone(), last, Some(last), payload)
            }
        }
    }

    /// Like [`send`](Self::send), but fails instead of emitting a message
    /// the receiver would discard.
    ///
    /// # Errors
    ///
    /// [`TimestampExhausted`] if the chain to `destination` already reached
    /// `u64::MAX` ticks. The state is not modified.
    pub fn try_send(
        &mut self,
        destination: &EntityId,
        payload: P,
        now: Timestamp,
    ) -> Result<Message<P>, TimestampExhausted> {
        let (timestamp, predecessor) = self.next_timestamp(destination, now)?;
        Ok(self.stamp(destination, timestamp, predecessor, payload))
    }

    fn next_timestamp(
        &self,
        destination: &EntityId,
        now: Timestamp,
    ) -> Result<(Timestamp, Option<Timestamp>), TimestampExhausted> {
        let Some(last) = self.sent.get(destination).copied() else {
            return Ok((now, None));
        };
        if now > last {
            return Ok((now, Some(last)));
        }
        match last.checked_successor() {
            Some(next) => Ok((next, Some(last))),
            None => Err(TimestampExhausted {
                destination: destination.clone(),
                last,
            }),
        }
    }

    fn stamp(
        &mut self,
        destination: &EntityId,
        timestamp: Timestamp,
        predecessor: Option<Timestamp>,
        payload: P,
    ) -> Message<P> {
        self.sent.insert(destination.clone(), timestamp);
        Message::from_parts(self.id.clone(), timestamp, predecessor, payload)
    }

    /// Accept one inbound message.
    ///
    /// Returns the messages from the same origin that are now deliverable,
    /// in the order they were sent. Duplicates yield nothing; messages that
    /// arrive ahead of their predecessor are held until the gap closes.
    ///
    /// # Errors
    ///
    /// Returns [`CausalityViolation`] when the message contradicts the
    /// origin's already-delivered chain. The state is not modified and the
    /// caller must abort the current turn.
    pub fn receive(&mut self, message: Message<P>) -> Result<Vec<Message<P>>, CausalityViolation> {
        self.received
            .entry(message.sender().clone())
            .or_default()
            .accept(message)
    }

    /// Drop tracking state that can no longer affect delivery.
    ///
    /// `linger_limit` is a watermark below which no message for this entity
    /// can still be in flight. Send entries older than the limit are
    /// dropped, as are receive buffers whose last delivery is older and that
    /// hold no buffered messages. A buffer with an unresolved gap is kept
    /// regardless of age.
    pub fn collect(&mut self, linger_limit: Timestamp) -> CollectStats {
        let sent_before = self.sent.len();
        self.sent.retain(|_, last| *last >= linger_limit);

        let received_before = self.received.len();
        self.received
            .retain(|_, buffer| !buffer.is_collectible(linger_limit));

        let stats = CollectStats {
            sent_removed: sent_before - self.sent.len(),
            received_removed: received_before - self.received.len(),
        };
        if !stats.is_empty() {
            debug!(
                entity = %self.id,
                %linger_limit,
                sent_removed = stats.sent_removed,
                received_removed = stats.received_removed,
                "collected deduplication state"
            );
        }
        stats
    }

    /// Last timestamp sent to `destination`, if still tracked.
    #[must_use]
    pub fn last_sent(&self, destination: &EntityId) -> Option<Timestamp> {
        self.sent.get(destination).copied()
    }

    /// The receive buffer for `origin`, if still tracked.
    #[must_use]
    pub fn receive_buffer(&self, origin: &EntityId) -> Option<&ReceiveBuffer<P>> {
        self.received.get(origin)
    }

    /// Total number of messages waiting for a predecessor, across origins.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.received.values().map(ReceiveBuffer::buffered_len).sum()
    }

    /// Whether there is no tracking state at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.received.is_empty()
    }
}
