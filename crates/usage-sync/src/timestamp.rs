use alloc::string::String;

use chrono::{DateTime, SecondsFormat, Utc};

use log::warn;

use crate::clock::Clock;

/// Wall-clock readings earlier than this value, in seconds since the `UNIX`
/// epoch, mean that the clock has never been synchronized.
pub const SANITY_EPOCH: u64 = 1_000_000_000;

/// Anchor of fallback timestamps: `2025-01-01T00:00:00Z`.
pub const FALLBACK_EPOCH: u64 = 1_735_689_600;

/// A point in time, in seconds since the `UNIX` epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    unix_seconds: u64,
    synchronized: bool,
}

impl Timestamp {
    /// Reads the current time from a [`Clock`].
    ///
    /// When the wall-clock is not synchronized, the timestamp is
    /// synthesized from [`FALLBACK_EPOCH`] plus the time elapsed since boot.
    /// Fallback timestamps are strictly increasing across readings taken at
    /// least one second apart, but they are not accurate wall-clock values.
    pub fn now<C: Clock>(clock: &C) -> Self {
        match clock.unix_time().filter(|seconds| *seconds >= SANITY_EPOCH) {
            Some(unix_seconds) => Self {
                unix_seconds,
                synchronized: true,
            },
            None => {
                warn!("Using fallback timestamp, network time is unavailable");
                Self {
                    unix_seconds: FALLBACK_EPOCH + clock.uptime_ms() / 1000,
                    synchronized: false,
                }
            }
        }
    }

    /// Returns the seconds since the `UNIX` epoch.
    #[must_use]
    pub const fn unix_seconds(&self) -> u64 {
        self.unix_seconds
    }

    /// Whether the timestamp comes from a synchronized wall-clock.
    #[must_use]
    pub const fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Formats the timestamp as `RFC 3339`, i.e. `YYYY-MM-DDTHH:MM:SSZ`.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        i64::try_from(self.unix_seconds)
            .ok()
            .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::MockClock;

    use super::{FALLBACK_EPOCH, Timestamp};

    #[test]
    fn synchronized_clock() {
        let clock = MockClock::new(5_000).synchronized_at(1_700_000_000);
        let timestamp = Timestamp::now(&clock);

        assert!(timestamp.is_synchronized());
        assert_eq!(timestamp.unix_seconds(), 1_700_000_000);
        assert_eq!(timestamp.to_rfc3339(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn unsynchronized_clock() {
        let clock = MockClock::new(65_500);
        let timestamp = Timestamp::now(&clock);

        assert!(!timestamp.is_synchronized());
        assert_eq!(timestamp.unix_seconds(), FALLBACK_EPOCH + 65);
        assert_eq!(timestamp.to_rfc3339(), "2025-01-01T00:01:05Z");
    }

    #[test]
    fn implausible_wall_clock() {
        // A clock that reports a few seconds after the epoch has not been set.
        let clock = MockClock::new(1_000).synchronized_at(42);
        let timestamp = Timestamp::now(&clock);

        assert!(!timestamp.is_synchronized());
        assert_eq!(timestamp.unix_seconds(), FALLBACK_EPOCH + 1);
    }

    #[test]
    fn fallback_is_strictly_increasing() {
        let clock = MockClock::new(0);

        let mut previous = Timestamp::now(&clock);
        for _ in 0..10 {
            clock.advance(1_000);
            let current = Timestamp::now(&clock);
            assert!(current > previous);
            assert!(current.to_rfc3339() > previous.to_rfc3339());
            previous = current;
        }
    }

    #[test]
    fn leap_day() {
        let clock = MockClock::new(0).synchronized_at(1_709_164_800);
        assert_eq!(Timestamp::now(&clock).to_rfc3339(), "2024-02-29T00:00:00Z");
    }
}
