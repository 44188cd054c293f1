use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::ops::Bound;

use tracing::{debug, error, trace};

use crate::{CausalityViolation, Message, Timestamp};

/// Lifecycle of a [`ReceiveBuffer`].
///
/// ```text
/// Fresh ──> Advancing <──> Gapped
/// ```
///
/// Only an `Advancing` buffer older than the linger limit may be collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Nothing delivered and nothing waiting.
    Fresh,
    /// Delivering in order, no message waiting on a missing predecessor.
    Advancing,
    /// At least one message is waiting for its predecessor.
    Gapped,
}

/// Per-origin reorder buffer.
///
/// Tracks the last timestamp delivered from one origin and holds messages
/// that arrived ahead of their causal predecessor, ordered by timestamp.
///
/// Every buffered message has a predecessor strictly after
/// `last_delivered`; `last_delivered` never moves backward.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "P: serde::Deserialize<'de>"))
)]
pub struct ReceiveBuffer<P> {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    last_delivered: Option<Timestamp>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    buffered: BTreeMap<Timestamp, Message<P>>,
}

impl<P> ReceiveBuffer<P> {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_delivered: None,
            buffered: BTreeMap::new(),
        }
    }

    /// Timestamp of the most recently delivered message, if any.
    #[must_use]
    pub fn last_delivered(&self) -> Option<Timestamp> {
        self.last_delivered
    }

    /// Number of messages waiting for a predecessor.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// Messages waiting for a predecessor, in timestamp order.
    pub fn buffered(&self) -> impl Iterator<Item = &Message<P>> {
        self.buffered.values()
    }

    /// Where this buffer is in its lifecycle.
    #[must_use]
    pub fn state(&self) -> BufferState {
        if !self.buffered.is_empty() {
            BufferState::Gapped
        } else if self.last_delivered.is_none() {
            BufferState::Fresh
        } else {
            BufferState::Advancing
        }
    }

    /// Whether this buffer can be dropped under the given linger limit.
    ///
    /// A gapped buffer is never collectible, however old.
    #[must_use]
    pub fn is_collectible(&self, linger_limit: Timestamp) -> bool {
        self.buffered.is_empty() && self.last_delivered < Some(linger_limit)
    }

    /// Accept one inbound message from this buffer's origin.
    ///
    /// Returns the messages that became deliverable, in causal order. The
    /// buffer is unchanged when an error is returned.
    pub(crate) fn accept(
        &mut self,
        message: Message<P>,
    ) -> Result<Vec<Message<P>>, CausalityViolation> {
        let last = self.last_delivered;
        let timestamp = message.timestamp();

        if Some(timestamp) <= last {
            trace!(
                origin = %message.sender(),
                %timestamp,
                "dropping duplicate message"
            );
            return Ok(Vec::new());
        }

        let predecessor = message.predecessor();
        if predecessor > last {
            debug!(
                origin = %message.sender(),
                %timestamp,
                buffered = self.buffered.len() + 1,
                "buffering message ahead of its predecessor"
            );
            self.buffered.insert(timestamp, message);
            return Ok(Vec::new());
        }
        let restart = predecessor < last;
        if restart {
            if predecessor.is_some() {
                return Err(self.violation(&message, last));
            }
            // The sender collected its tracking entry for us and started a
            // new chain; everything older has settled.
            debug!(
                origin = %message.sender(),
                %timestamp,
                "sender restarted its chain"
            );
        }

        let chain = self.successors_of(timestamp);
        let head = chain.last().copied().unwrap_or(timestamp);

        // Whatever is left after draining must still wait on a predecessor
        // after `head`. Entries of a superseded chain are exempt.
        if let Some(stale) = self.buffered.values().find(|m| {
            let ts = m.timestamp();
            let superseded = restart && ts < timestamp;
            !superseded
                && chain.binary_search(&ts).is_err()
                && (ts <= head || m.predecessor() <= Some(head))
        }) {
            return Err(self.violation(stale, last));
        }

        if restart {
            let current = self.buffered.split_off(&timestamp);
            let superseded = core::mem::replace(&mut self.buffered, current);
            if !superseded.is_empty() {
                debug!(
                    origin = %message.sender(),
                    %timestamp,
                    dropped = superseded.len(),
                    "dropping buffered messages of superseded chain"
                );
            }
        }

        let mut delivered = Vec::with_capacity(chain.len() + 1);
        delivered.push(message);
        delivered.extend(chain.iter().filter_map(|ts| self.buffered.remove(ts)));
        self.last_delivered = Some(head);

        if delivered.len() > 1 {
            debug!(
                origin = %delivered[0].sender(),
                delivered = delivered.len(),
                still_buffered = self.buffered.len(),
                "resolved causal gap"
            );
        }
        Ok(delivered)
    }

    /// Timestamps of the buffered messages that follow `start`, in chain
    /// order (and therefore ascending).
    fn successors_of(&self, start: Timestamp) -> Vec<Timestamp> {
        let mut chain = Vec::new();
        let mut cursor = start;
        while let Some((&next, _)) = self
            .buffered
            .range((Bound::Excluded(cursor), Bound::Unbounded))
            .find(|(_, m)| m.predecessor() == Some(cursor))
        {
            chain.push(next);
            cursor = next;
        }
        chain
    }

    fn violation(&self, message: &Message<P>, last: Option<Timestamp>) -> CausalityViolation {
        let violation = CausalityViolation {
            origin: message.sender().clone(),
            timestamp: message.timestamp(),
            predecessor: message.predecessor(),
            last_delivered: last,
        };
        error!(%violation, "nondeterminism detected");
        violation
    }
}

impl<P> Default for ReceiveBuffer<P> {
    fn default() -> Self {
        Self::new()
    }
}
