//! Usage event sources.
//!
//! A source is polled on every iteration of the main loop with the current
//! uptime and reports whether a new usage event happened since the previous
//! poll. Sources never block.
//!
//! Two sources are available:
//! - [`PeriodicTrigger`] generates an event at a fixed period. It stands in
//!   for a sensor during bring-up.
//! - [`PinTrigger`] detects debounced activations of a digital input.

use embedded_hal::digital::InputPin;

use log::{debug, error};

// Default debounce time of an input pin, in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// A source of usage events.
pub trait UsageSource {
    /// Whether a usage event happened.
    fn poll(&mut self, now_ms: u64) -> bool;
}

/// A source generating a usage event every `period_ms` milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTrigger {
    period_ms: u64,
    last_ms: u64,
}

impl PeriodicTrigger {
    /// Creates a [`PeriodicTrigger`] whose first period starts at `now_ms`.
    #[must_use]
    pub const fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }
}

impl UsageSource for PeriodicTrigger {
    fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) < self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        debug!("Periodic usage event at {now_ms} ms");
        true
    }
}

/// A source detecting activations of a digital input.
///
/// An activation is a transition of the input to its active level which
/// stays stable for the whole debounce time. Only one event is generated
/// for each activation, however long the input stays active.
pub struct PinTrigger<P: InputPin> {
    pin: P,
    active_low: bool,
    debounce_ms: u64,
    stable: bool,
    candidate: bool,
    changed_ms: u64,
}

impl<P: InputPin> PinTrigger<P> {
    /// Creates a [`PinTrigger`] for an active-high input, with a debounce
    /// time of 50 milliseconds.
    #[must_use]
    pub const fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            stable: false,
            candidate: false,
            changed_ms: 0,
        }
    }

    /// Sets the input as active-low.
    #[must_use]
    pub const fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    /// Sets the debounce time, in milliseconds.
    #[must_use]
    pub const fn debounce(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    fn is_active(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        Ok(high != self.active_low)
    }
}

impl<P: InputPin> UsageSource for PinTrigger<P> {
    fn poll(&mut self, now_ms: u64) -> bool {
        let active = match self.is_active() {
            Ok(active) => active,
            Err(e) => {
                error!("Impossible to read the trigger input: {e:?}");
                return false;
            }
        };

        if active != self.candidate {
            self.candidate = active;
            self.changed_ms = now_ms;
            return false;
        }

        if self.candidate == self.stable
            || now_ms.saturating_sub(self.changed_ms) < self.debounce_ms
        {
            return false;
        }

        self.stable = self.candidate;
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    use super::{PeriodicTrigger, PinTrigger, UsageSource};

    #[test]
    fn periodic() {
        let mut trigger = PeriodicTrigger::new(5_000, 1_000);

        assert!(!trigger.poll(1_000));
        assert!(!trigger.poll(5_999));
        assert!(trigger.poll(6_000));
        assert!(!trigger.poll(6_100));
        assert!(trigger.poll(11_500));
    }

    #[test]
    fn pin_activation() {
        let expectations = [
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
        ];

        let mut trigger = PinTrigger::new(PinMock::new(&expectations));

        assert!(!trigger.poll(0));
        assert!(!trigger.poll(100));
        assert!(!trigger.poll(130));
        assert!(trigger.poll(150));
        // Still active, no new event.
        assert!(!trigger.poll(400));
        assert!(!trigger.poll(500));
        assert!(!trigger.poll(600));

        trigger.pin.done();
    }

    #[test]
    fn pin_bounce() {
        let expectations = [
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
            PinTransaction::get(State::High),
        ];

        let mut trigger = PinTrigger::new(PinMock::new(&expectations)).debounce(50);

        assert!(!trigger.poll(0));
        assert!(!trigger.poll(10));
        assert!(!trigger.poll(20));
        // Stable for less than the debounce time.
        assert!(!trigger.poll(60));
        assert!(trigger.poll(70));

        trigger.pin.done();
    }

    #[test]
    fn pin_active_low() {
        let expectations = [
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
            PinTransaction::get(State::Low),
        ];

        let mut trigger = PinTrigger::new(PinMock::new(&expectations))
            .active_low()
            .debounce(10);

        assert!(!trigger.poll(0));
        assert!(!trigger.poll(5));
        assert!(trigger.poll(15));

        trigger.pin.done();
    }
}
