//! Garbage-collection policy for deduplication state.
//!
//! The dispatcher decides how long a message may linger in flight before it
//! is certainly delivered or discarded. [`LingerPolicy`] turns that window
//! into the watermark [`Deduplicator::collect`] expects and rate-limits
//! sweeps.
//!
//! ```
//! use causal_dedup::{Deduplicator, LingerPolicy, Timestamp};
//!
//! let policy = LingerPolicy::with_window(1_000);
//! let mut d = Deduplicator::<()>::new("me");
//! d.send(&"x".into(), (), Timestamp::from_ticks(500));
//!
//! let stats = d.collect(policy.limit_at(Timestamp::from_ticks(2_000)));
//! assert_eq!(stats.sent_removed, 1);
//! ```

use crate::{CollectStats, ConfigError, Deduplicator, Timestamp};

/// Reorder window durable entities ship with: 30 minutes, in microseconds.
pub const DEFAULT_WINDOW: u64 = 30 * 60 * 1_000_000;

/// Default minimum spacing between sweeps: 1 minute, in microseconds.
pub const DEFAULT_COLLECT_EVERY: u64 = 60 * 1_000_000;

/// How long tracking state must be kept, and how often to sweep it.
///
/// Both values are in timestamp ticks. Every field falls back to its
/// default when missing from a deserialized configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LingerPolicy {
    /// Maximum time a message can stay in flight.
    pub window: u64,
    /// Minimum time between two sweeps.
    pub collect_every: u64,
}

impl LingerPolicy {
    /// A policy with the given window and the default sweep spacing.
    #[must_use]
    pub fn with_window(window: u64) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    /// Check the policy is usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroWindow`] if `window` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    /// The linger watermark at time `now`.
    #[must_use]
    pub fn limit_at(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.window)
    }

    /// Whether a sweep is due, given when the last one ran.
    #[must_use]
    pub fn sweep_due(&self, now: Timestamp, last_sweep: Option<Timestamp>) -> bool {
        match last_sweep {
            None => true,
            Some(last) => now.ticks_since(last) >= self.collect_every,
        }
    }
}

impl Default for LingerPolicy {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            collect_every: DEFAULT_COLLECT_EVERY,
        }
    }
}

impl<P> Deduplicator<P> {
    /// Run [`collect`](Self::collect) with the policy's watermark if a sweep
    /// is due. Returns `None` when the sweep was skipped.
    pub fn collect_due(
        &mut self,
        now: Timestamp,
        policy: &LingerPolicy,
        last_sweep: Option<Timestamp>,
    ) -> Option<CollectStats> {
        if !policy.sweep_due(now, last_sweep) {
            return None;
        }
        Some(self.collect(policy.limit_at(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    fn ts(ticks: u64) -> Timestamp {
        Timestamp::from_ticks(ticks)
    }

    #[test]
    fn default_window_is_thirty_minutes() {
        let policy = LingerPolicy::default();
        assert_eq!(policy.window, 1_800_000_000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        assert_eq!(
            LingerPolicy::with_window(0).validate(),
            Err(ConfigError::ZeroWindow)
        );
    }

    #[test]
    fn limit_saturates_near_epoch() {
        let policy = LingerPolicy::with_window(100);
        assert_eq!(policy.limit_at(ts(40)), Timestamp::ZERO);
        assert_eq!(policy.limit_at(ts(140)), ts(40));
    }

    #[test]
    fn sweep_is_rate_limited() {
        let policy = LingerPolicy {
            window: 100,
            collect_every: 10,
        };
        assert!(policy.sweep_due(ts(0), None));
        assert!(!policy.sweep_due(ts(105), Some(ts(100))));
        assert!(policy.sweep_due(ts(110), Some(ts(100))));
    }

    #[test]
    fn collect_due_uses_policy_limit() {
        let policy = LingerPolicy {
            window: 100,
            collect_every: 10,
        };
        let mut d = Deduplicator::new("me");
        d.send(&"x".into(), (), ts(40));
        d.receive(Message::from_parts("y", ts(30), None, ())).unwrap();

        assert_eq!(d.collect_due(ts(145), &policy, Some(ts(140))), None);
        let stats = d.collect_due(ts(150), &policy, Some(ts(140))).unwrap();
        assert_eq!(stats.sent_removed, 1);
        assert_eq!(stats.received_removed, 1);
        assert!(d.is_empty());
    }
}
