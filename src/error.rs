use crate::{EntityId, Timestamp};

/// A message whose chain contradicts what has already been delivered.
///
/// Raised by [`Deduplicator::receive`](crate::Deduplicator::receive) when a
/// message claims a predecessor earlier than the last delivered timestamp,
/// or when a buffered message can no longer be delivered because its chain
/// was overtaken. This indicates corrupted input or an upstream protocol
/// bug. The dispatcher must abort the current turn; the deduplicator state
/// is left as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "causality violation from {origin}: message {timestamp} claims predecessor {claimed} but {delivered} was already delivered",
    claimed = display_opt(.predecessor),
    delivered = display_opt(.last_delivered)
)]
pub struct CausalityViolation {
    /// Sender of the offending message.
    pub origin: EntityId,
    /// Timestamp of the offending message.
    pub timestamp: Timestamp,
    /// Predecessor the offending message claims.
    pub predecessor: Option<Timestamp>,
    /// Last timestamp delivered from `origin` when the violation was found.
    pub last_delivered: Option<Timestamp>,
}

fn display_opt(ts: &Option<Timestamp>) -> alloc::string::String {
    use alloc::string::ToString;
    match ts {
        Some(ts) => ts.to_string(),
        None => "none".into(),
    }
}

/// No timestamp is left after the last one sent to `destination`.
///
/// Returned by [`Deduplicator::try_send`](crate::Deduplicator::try_send)
/// once a chain has reached `u64::MAX` ticks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no timestamp left after {last} on the chain to {destination}")]
pub struct TimestampExhausted {
    /// Destination of the exhausted chain.
    pub destination: EntityId,
    /// Last timestamp sent on that chain.
    pub last: Timestamp,
}

/// Invalid [`LingerPolicy`](crate::LingerPolicy) settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A zero linger window would collect state for messages still in flight.
    #[error("linger window must be greater than zero")]
    ZeroWindow,
}

/// Error encoding or decoding persisted deduplicator state.
#[cfg(feature = "json")]
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Serialization failed.
    #[error("failed to encode deduplicator state: {0}")]
    Encode(#[source] serde_json::Error),
    /// Deserialization failed.
    #[error("failed to decode deduplicator state: {0}")]
    Decode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn violation_message_names_the_chain() {
        let err = CausalityViolation {
            origin: EntityId::new("a"),
            timestamp: Timestamp::from_ticks(9),
            predecessor: Some(Timestamp::from_ticks(3)),
            last_delivered: Some(Timestamp::from_ticks(5)),
        };
        assert_eq!(
            err.to_string(),
            "causality violation from a: message 9 claims predecessor 3 but 5 was already delivered"
        );
    }

    #[test]
    fn violation_message_prints_none() {
        let err = CausalityViolation {
            origin: EntityId::new("a"),
            timestamp: Timestamp::from_ticks(9),
            predecessor: None,
            last_delivered: None,
        };
        assert!(err.to_string().contains("predecessor none but none"));
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::ZeroWindow.to_string(),
            "linger window must be greater than zero"
        );
    }
}
