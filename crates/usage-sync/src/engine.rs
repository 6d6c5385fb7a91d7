use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use log::{error, info, warn};

use rand_core::RngCore;

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::link::Link;
use crate::protocol::{Backend, Session};
use crate::transport::Transport;

/// A synchronization attempt which passed all guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncAttempt {
    /// Number of uses carried by the attempt.
    pub delta: u32,
    /// Uptime, in milliseconds, at which the attempt started.
    pub started_ms: u64,
}

impl SyncAttempt {
    /// Milliseconds elapsed between the start of the attempt and `now_ms`.
    #[must_use]
    pub const fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    sending: bool,
    last_attempt_ms: u64,
    total_sent: u32,
    last_sent_ms: Option<u64>,
    last_error: Option<Error>,
}

struct Io<T, R> {
    transport: T,
    rng: R,
}

// Clears the in-flight flag whatever the outcome of the attempt.
struct InFlight<'a, M: RawMutex> {
    state: &'a BlockingMutex<M, RefCell<EngineState>>,
}

impl<M: RawMutex> Drop for InFlight<'_, M> {
    fn drop(&mut self) {
        self.state.lock(|state| state.borrow_mut().sending = false);
    }
}

/// The synchronization engine.
///
/// The engine submits usage deltas to the document store with the
/// [`Backend`] protocol selected in its [`SyncConfig`].
///
/// Before any network activity, an attempt must pass three guards, in this
/// order:
///
/// 1. No other attempt is in flight
/// 2. The minimum send interval has elapsed since the last attempt which
///    passed this guard. The window starts at boot, so an attempt made
///    earlier than the minimum interval after boot is rate limited.
/// 3. The network link is up
///
/// Rejected attempts return an error and do not touch the network.
///
/// Every method takes a shared reference, so the engine can be shared
/// between tasks. A second call to [`SyncEngine::record_usage`] made while
/// the first one awaits the network is rejected, it is never queued.
pub struct SyncEngine<M, T, L, C, R>
where
    M: RawMutex,
    T: Transport,
    L: Link,
    C: Clock,
    R: RngCore,
{
    config: SyncConfig,
    link: L,
    clock: C,
    state: BlockingMutex<M, RefCell<EngineState>>,
    io: Mutex<M, Io<T, R>>,
}

impl<M, T, L, C, R> SyncEngine<M, T, L, C, R>
where
    M: RawMutex,
    T: Transport,
    L: Link,
    C: Clock,
    R: RngCore,
{
    /// Creates a [`SyncEngine`].
    ///
    /// The random number generator is only used to build the identifiers
    /// of log documents.
    pub fn new(config: SyncConfig, transport: T, link: L, clock: C, rng: R) -> Self {
        info!(
            "Sync engine initialized for project `{}`, device `{}`, {} backend",
            config.endpoint().project_id(),
            config.device_id(),
            config.backend().name()
        );

        Self {
            config,
            link,
            clock,
            state: BlockingMutex::new(RefCell::new(EngineState::default())),
            io: Mutex::new(Io { transport, rng }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the network link.
    #[must_use]
    pub const fn link(&self) -> &L {
        &self.link
    }

    /// Whether the network link is up.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.link.is_connected()
    }

    /// Whether an attempt is in flight.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.state.lock(|state| state.borrow().sending)
    }

    /// Number of successful submissions since boot.
    #[must_use]
    pub fn total_sent(&self) -> u32 {
        self.state.lock(|state| state.borrow().total_sent)
    }

    /// Uptime, in milliseconds, of the last successful submission.
    #[must_use]
    pub fn last_sent_time(&self) -> Option<u64> {
        self.state.lock(|state| state.borrow().last_sent_ms)
    }

    /// The error of the last failed attempt.
    ///
    /// A successful attempt does not clear it.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.state.lock(|state| state.borrow().last_error.clone())
    }

    /// Submits a usage delta.
    ///
    /// # Errors
    ///
    /// - [`crate::error::ErrorKind::AttemptInProgress`], another attempt is
    ///   in flight
    /// - [`crate::error::ErrorKind::RateLimited`], the minimum send interval
    ///   has not elapsed yet
    /// - [`crate::error::ErrorKind::NotReady`], the network link is down
    /// - Any error produced by the backend protocol. The remote document
    ///   may or may not have been updated, since requests are never retried.
    pub async fn record_usage(&self, delta: u32) -> Result<()> {
        let (attempt, in_flight) = self
            .begin(delta)
            .inspect_err(|e| warn!("Usage of {delta} not sent: {e}"))
            .map_err(|e| self.fail(e))?;

        info!("Sending {delta} uses");

        let result = self.submit(delta).await;
        let now_ms = self.clock.uptime_ms();

        let result = match result {
            Ok(()) => {
                let total_sent = self.state.lock(|state| {
                    let mut state = state.borrow_mut();
                    state.total_sent = state.total_sent.saturating_add(1);
                    state.last_sent_ms = Some(now_ms);
                    state.total_sent
                });
                info!(
                    "Usage recorded in {} ms! Total sends: {total_sent}",
                    attempt.elapsed_ms(now_ms)
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to record {} uses after {} ms: {e}",
                    attempt.delta,
                    attempt.elapsed_ms(now_ms)
                );
                Err(self.fail(e))
            }
        };

        drop(in_flight);
        result
    }

    fn begin(&self, delta: u32) -> Result<(SyncAttempt, InFlight<'_, M>)> {
        let now_ms = self.clock.uptime_ms();

        self.state.lock(|state| {
            let mut state = state.borrow_mut();

            if state.sending {
                return Err(Error::attempt_in_progress());
            }

            if now_ms.saturating_sub(state.last_attempt_ms) < self.config.min_send_interval_ms {
                return Err(Error::rate_limited());
            }
            state.last_attempt_ms = now_ms;

            if !self.link.is_connected() {
                return Err(Error::not_ready());
            }

            state.sending = true;
            Ok(())
        })?;

        Ok((
            SyncAttempt {
                delta,
                started_ms: now_ms,
            },
            InFlight { state: &self.state },
        ))
    }

    async fn submit(&self, delta: u32) -> Result<()> {
        let mut io = self.io.lock().await;
        let Io { transport, rng } = &mut *io;

        let mut session = Session::new(
            transport,
            &self.config.endpoint,
            self.config.request_timeout_ms,
        );

        match &self.config.backend {
            Backend::Counter(counter) => counter.submit(&mut session, delta).await,
            Backend::Log(log) => {
                log.submit(&mut session, self.config.device_id, &self.clock, rng, delta)
                    .await
            }
        }
    }

    // Stores the error and hands it back to the caller.
    fn fail(&self, e: Error) -> Error {
        self.state
            .lock(|state| state.borrow_mut().last_error = Some(e.clone()));
        e
    }
}
