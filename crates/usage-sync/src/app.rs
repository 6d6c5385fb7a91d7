use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use embedded_hal::digital::OutputPin;

use log::error;

use rand_core::RngCore;

use crate::accumulator::Accumulator;
use crate::clock::{Clock, Periodic};
use crate::engine::SyncEngine;
use crate::led::StatusLed;
use crate::link::{Link, LinkWatch};
use crate::transport::Transport;
use crate::trigger::UsageSource;

/// Interval between two iterations of the main loop, in milliseconds.
pub const TICK_MS: u64 = 100;

// Interval between two heartbeats, in milliseconds.
const HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// A periodic summary of the device activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// Loop iterations since boot.
    pub loops: u64,
    /// Uses accumulated towards the next threshold.
    pub current_uses: u32,
    /// Uses detected since boot.
    pub lifetime_uses: u32,
    /// Successful submissions since boot.
    pub total_sent: u32,
    /// Whether the network link is up.
    pub connected: bool,
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Heartbeat: loops={}, uses={}, lifetime={}, sent={}, link={}",
            self.loops,
            self.current_uses,
            self.lifetime_uses,
            self.total_sent,
            if self.connected { "up" } else { "down" }
        )
    }
}

/// Outcome of a loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    /// The link is down and a reconnection should be started.
    pub reconnect: bool,
    /// A heartbeat is due.
    pub heartbeat: Option<Heartbeat>,
}

/// The application context.
///
/// It owns every component of the main loop. Usage events are read from the
/// source and accumulated, then each threshold notification is queued and
/// submitted to the synchronization engine by the same loop iteration.
///
/// The LED is lit while the network link is up.
pub struct App<'a, M, U, P, const N: usize>
where
    M: RawMutex,
    U: UsageSource,
    P: OutputPin,
{
    accumulator: Accumulator<Sender<'a, M, u32, N>>,
    notifications: Receiver<'a, M, u32, N>,
    source: U,
    led: StatusLed<P>,
    watch: LinkWatch,
    heartbeat: Periodic,
    loops: u64,
}

impl<'a, M, U, P, const N: usize> App<'a, M, U, P, N>
where
    M: RawMutex,
    U: UsageSource,
    P: OutputPin,
{
    /// Creates an [`App`].
    ///
    /// Threshold notifications are queued into `channel`. When the channel
    /// is full, further notifications are dropped until the loop drains it.
    pub fn new(
        channel: &'a Channel<M, u32, N>,
        threshold: u32,
        source: U,
        led: StatusLed<P>,
        now_ms: u64,
    ) -> Self {
        Self {
            accumulator: Accumulator::new()
                .with_threshold(threshold)
                .on_threshold_reached(channel.sender()),
            notifications: channel.receiver(),
            source,
            led,
            watch: LinkWatch::new(),
            heartbeat: Periodic::new(HEARTBEAT_INTERVAL_MS, now_ms),
            loops: 0,
        }
    }

    /// Sets the link watch.
    #[must_use]
    pub const fn link_watch(mut self, watch: LinkWatch) -> Self {
        self.watch = watch;
        self
    }

    /// Returns the accumulator.
    #[must_use]
    pub const fn accumulator(&self) -> &Accumulator<Sender<'a, M, u32, N>> {
        &self.accumulator
    }

    /// Returns the status LED.
    pub fn led(&mut self) -> &mut StatusLed<P> {
        &mut self.led
    }

    /// Runs a single loop iteration.
    pub async fn tick<EM, T, L, C, R>(&mut self, engine: &SyncEngine<EM, T, L, C, R>) -> Tick
    where
        EM: RawMutex,
        T: Transport,
        L: Link,
        C: Clock,
        R: RngCore,
    {
        embassy_futures::yield_now().await;

        self.loops = self.loops.wrapping_add(1);
        let now_ms = engine.clock().uptime_ms();

        let reconnect = self
            .watch
            .poll(engine.link(), now_ms)
            .is_some_and(|check| check.reconnect);

        let _ = self.accumulator.update(&mut self.source, now_ms);

        while let Ok(uses) = self.notifications.try_receive() {
            // Failures are logged and kept by the engine.
            let _ = engine.record_usage(uses).await;
        }

        let connected = engine.is_ready();
        if self.led.is_on() != connected
            && let Err(e) = self.led.set_state(connected)
        {
            error!("Impossible to drive the status LED: {e:?}");
        }

        let heartbeat = self.heartbeat.expired(now_ms).then(|| Heartbeat {
            loops: self.loops,
            current_uses: self.accumulator.count(),
            lifetime_uses: self.accumulator.lifetime(),
            total_sent: engine.total_sent(),
            connected,
        });

        Tick {
            reconnect,
            heartbeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;

    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

    use crate::clock::Clock;
    use crate::config::SyncConfig;
    use crate::endpoint::Endpoint;
    use crate::engine::SyncEngine;
    use crate::led::StatusLed;
    use crate::link::LinkWatch;
    use crate::tests::{CountingRng, MockClock, MockLink, MockTransport, counter_body};
    use crate::transport::Method;
    use crate::trigger::PeriodicTrigger;

    use super::{App, Heartbeat, TICK_MS};

    const CONFIG: SyncConfig = SyncConfig::new(Endpoint::new("project", "key"), "device_001");

    #[tokio::test]
    async fn threshold_reaches_the_engine() {
        let transport = MockTransport::new()
            .respond(200, &counter_body(10))
            .respond(200, &counter_body(12));
        let link = MockLink::new(true);
        // Past the rate limit window that follows boot.
        let clock = MockClock::new(10_000);
        let engine = SyncEngine::<NoopRawMutex, _, _, _, _>::new(
            CONFIG,
            transport.clone(),
            &link,
            &clock,
            CountingRng::new(0),
        );

        let channel = Channel::<NoopRawMutex, u32, 4>::new();
        let mut led = PinMock::new(&[PinTransaction::set(State::High)]);
        let mut app = App::new(
            &channel,
            2,
            PeriodicTrigger::new(1_000, clock.uptime_ms()),
            StatusLed::new(led.clone()),
            clock.uptime_ms(),
        );

        // One event per second.
        let mut heartbeat = None;
        for _ in 0..200 {
            clock.advance(TICK_MS);
            let tick = app.tick(&engine).await;
            if tick.heartbeat.is_some() {
                heartbeat = tick.heartbeat;
            }
            if engine.total_sent() == 1 {
                break;
            }
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Patch);
        assert_eq!(
            requests[1].body,
            Some(serde_json::json!({ "fields": { "uses": { "integerValue": "12" } } }))
        );
        assert_eq!(app.accumulator().lifetime(), 2);
        assert_eq!(app.accumulator().count(), 0);
        assert!(app.led().is_on());
        assert_eq!(heartbeat, None);

        led.done();
    }

    #[tokio::test]
    async fn heartbeat_and_reconnect() {
        let transport = MockTransport::new();
        let link = MockLink::new(false);
        let clock = MockClock::new(0);
        let engine = SyncEngine::<NoopRawMutex, _, _, _, _>::new(
            CONFIG,
            transport.clone(),
            &link,
            &clock,
            CountingRng::new(0),
        );

        let channel = Channel::<NoopRawMutex, u32, 1>::new();
        let expectations: [PinTransaction; 0] = [];
        let mut led = PinMock::new(&expectations);
        let mut app = App::new(
            &channel,
            100,
            PeriodicTrigger::new(5_000, 0),
            StatusLed::new(led.clone()),
            0,
        )
        .link_watch(LinkWatch::new().check_interval(10_000));

        let mut reconnects = 0;
        let mut heartbeats = [None; 2];
        let mut index = 0;
        for _ in 0..600 {
            clock.advance(TICK_MS);
            let tick = app.tick(&engine).await;
            if tick.reconnect {
                reconnects += 1;
            }
            if let Some(heartbeat) = tick.heartbeat {
                heartbeats[index] = Some(heartbeat);
                index += 1;
            }
        }

        // Checks at 0.1, 10.1, 20.1, 30.1, 40.1 and 50.1 seconds.
        assert_eq!(reconnects, 6);
        assert_eq!(
            heartbeats,
            [
                Some(Heartbeat {
                    loops: 300,
                    current_uses: 6,
                    lifetime_uses: 6,
                    total_sent: 0,
                    connected: false,
                }),
                Some(Heartbeat {
                    loops: 600,
                    current_uses: 12,
                    lifetime_uses: 12,
                    total_sent: 0,
                    connected: false,
                }),
            ]
        );
        assert!(transport.requests().is_empty());

        led.done();
    }
}
