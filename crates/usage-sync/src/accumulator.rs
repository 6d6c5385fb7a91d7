use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

use log::{debug, info, warn};

use crate::trigger::UsageSource;

// Default number of uses which triggers a notification.
const DEFAULT_THRESHOLD: u32 = 10;

/// A receiver of threshold notifications.
pub trait UsageSink {
    /// Receives the number of uses accumulated when the threshold was
    /// reached.
    ///
    /// Returns `false` if the notification could not be delivered.
    fn on_threshold_reached(&mut self, uses: u32) -> bool;
}

impl<M: RawMutex, const N: usize> UsageSink for Sender<'_, M, u32, N> {
    fn on_threshold_reached(&mut self, uses: u32) -> bool {
        self.try_send(uses).is_ok()
    }
}

/// Counts usage events.
///
/// Once the current count reaches the threshold, it is reset to zero and the
/// sink is notified with the count reached. The lifetime count is never
/// reset.
///
/// Without a sink, the count reached is discarded.
#[derive(Debug)]
pub struct Accumulator<S: UsageSink> {
    current: u32,
    lifetime: u32,
    threshold: u32,
    sink: Option<S>,
}

impl<S: UsageSink> Default for Accumulator<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: UsageSink> Accumulator<S> {
    /// Creates an [`Accumulator`] with a threshold of 10 uses and no sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: 0,
            lifetime: 0,
            threshold: DEFAULT_THRESHOLD,
            sink: None,
        }
    }

    /// Sets the threshold.
    ///
    /// A threshold of `0` is treated as `1`.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = clamp(threshold);
        self
    }

    /// Sets the sink notified when the threshold is reached, replacing the
    /// previous one.
    #[must_use]
    pub fn on_threshold_reached(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Changes the threshold.
    ///
    /// A threshold of `0` is treated as `1`. The current count is not
    /// evaluated against the new threshold until the next increment.
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = clamp(threshold);
        info!("Usage threshold set to {}", self.threshold);
    }

    /// Records a single usage event.
    pub fn increment(&mut self) {
        self.current = self.current.saturating_add(1);
        self.lifetime = self.lifetime.saturating_add(1);

        debug!(
            "Usage detected! Current: {}, lifetime: {}",
            self.current, self.lifetime
        );

        if self.current < self.threshold {
            return;
        }

        let uses = self.current;
        self.current = 0;
        info!("Threshold reached with {uses} uses");

        let Some(sink) = self.sink.as_mut() else {
            warn!("No threshold sink, {uses} uses discarded");
            return;
        };

        if !sink.on_threshold_reached(uses) {
            warn!("Threshold notification of {uses} uses dropped");
        }
    }

    /// Resets the current count. The lifetime count is kept.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Polls a usage source and records an event if it fired.
    ///
    /// Returns whether an event was recorded.
    pub fn update<U: UsageSource>(&mut self, source: &mut U, now_ms: u64) -> bool {
        let fired = source.poll(now_ms);
        if fired {
            self.increment();
        }
        fired
    }

    /// Returns the current count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.current
    }

    /// Returns the number of events recorded since creation.
    #[must_use]
    pub const fn lifetime(&self) -> u32 {
        self.lifetime
    }

    /// Returns the threshold.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

const fn clamp(threshold: u32) -> u32 {
    if threshold == 0 { 1 } else { threshold }
}
