/// A time source.
///
/// The monotonic reading is always available and starts at boot, while the
/// wall-clock reading is only available after a successful network time
/// synchronization.
pub trait Clock {
    /// Milliseconds elapsed since boot.
    fn uptime_ms(&self) -> u64;

    /// Seconds elapsed since the `UNIX` epoch, if the clock is synchronized.
    fn unix_time(&self) -> Option<u64>;
}

impl<C: Clock> Clock for &C {
    fn uptime_ms(&self) -> u64 {
        (**self).uptime_ms()
    }

    fn unix_time(&self) -> Option<u64> {
        (**self).unix_time()
    }
}

/// A periodic deadline driven by monotonic readings.
///
/// Used by cooperative loops to run an action every `period_ms`
/// milliseconds without blocking.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    period_ms: u64,
    last_ms: u64,
}

impl Periodic {
    /// Creates a [`Periodic`] deadline whose first period starts at `now_ms`.
    #[must_use]
    pub const fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    /// Returns the period in milliseconds.
    #[must_use]
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Whether a full period has elapsed since the last expiration.
    ///
    /// When it has, the next period starts at `now_ms`.
    pub fn expired(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Periodic;

    #[test]
    fn periodic_expiration() {
        let mut periodic = Periodic::new(30_000, 0);

        assert!(!periodic.expired(0));
        assert!(!periodic.expired(29_999));
        assert!(periodic.expired(30_000));

        // The next period starts at the last expiration.
        assert!(!periodic.expired(45_000));
        assert!(periodic.expired(60_001));
    }

    #[test]
    fn periodic_ignores_clock_going_backwards() {
        let mut periodic = Periodic::new(100, 1_000);
        assert!(!periodic.expired(10));
    }
}
