use core::fmt;

/// Logical send time of a message.
///
/// A plain tick count. Timestamps are totally ordered per
/// (sender, destination) pair; across different senders they carry no
/// meaning beyond what the predecessor chain establishes.
///
/// The "no timestamp yet" sentinel is `Option<Timestamp>::None`, which
/// orders before every `Some`.
///
/// # Example
///
/// ```
/// use causal_dedup::Timestamp;
///
/// let t = Timestamp::from_ticks(100);
/// assert_eq!(t.successor(), Timestamp::from_ticks(101));
/// assert!(None < Some(Timestamp::from_ticks(0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(u64);

impl Timestamp {
    /// The earliest representable timestamp.
    pub const ZERO: Self = Self(0);

    /// Create a timestamp from a raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// The raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// The smallest timestamp strictly after this one (`self + ε`).
    ///
    /// Saturates at `u64::MAX` ticks.
    #[must_use]
    pub const fn successor(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The smallest timestamp strictly after this one, or `None` at
    /// `u64::MAX` ticks.
    #[must_use]
    pub const fn checked_successor(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(ticks) => Some(Self(ticks)),
            None => None,
        }
    }

    /// Move this timestamp `ticks` into the past, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, ticks: u64) -> Self {
        Self(self.0.saturating_sub(ticks))
    }

    /// Ticks elapsed from `earlier` to `self`, or zero if `earlier` is later.
    #[must_use]
    pub const fn ticks_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The current wall-clock time, in microseconds since the Unix epoch.
    ///
    /// This method requires the `std` feature. The result is not required to
    /// be monotonic; [`Deduplicator::send`](crate::Deduplicator::send)
    /// corrects for stalled or regressing clocks.
    #[cfg(feature = "std")]
    #[must_use]
    pub fn now() -> Self {
        Self(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_micros() as u64,
        )
    }
}

impl From<u64> for Timestamp {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_is_strictly_greater() {
        let t = Timestamp::from_ticks(41);
        assert!(t.successor() > t);
        assert_eq!(t.successor().ticks(), 42);
    }

    #[test]
    fn successor_saturates() {
        let t = Timestamp::from_ticks(u64::MAX);
        assert_eq!(t.successor(), t);
    }

    #[test]
    fn checked_successor_stops_at_max() {
        assert_eq!(
            Timestamp::from_ticks(7).checked_successor(),
            Some(Timestamp::from_ticks(8))
        );
        assert_eq!(Timestamp::from_ticks(u64::MAX).checked_successor(), None);
    }

    #[test]
    fn none_orders_before_any_timestamp() {
        assert!(None < Some(Timestamp::ZERO));
        assert!(Some(Timestamp::from_ticks(1)) < Some(Timestamp::from_ticks(2)));
    }

    #[test]
    fn saturating_sub_stops_at_zero() {
        assert_eq!(Timestamp::from_ticks(5).saturating_sub(10), Timestamp::ZERO);
        assert_eq!(
            Timestamp::from_ticks(50).saturating_sub(10),
            Timestamp::from_ticks(40)
        );
    }

    #[test]
    fn ticks_since_handles_reversed_order() {
        let early = Timestamp::from_ticks(10);
        let late = Timestamp::from_ticks(25);
        assert_eq!(late.ticks_since(early), 15);
        assert_eq!(early.ticks_since(late), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn now_is_after_epoch() {
        assert!(Timestamp::now() > Timestamp::ZERO);
    }
}
