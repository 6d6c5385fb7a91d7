use core::cell::Cell;
use core::net::{IpAddr, SocketAddr};

use alloc::format;

use embassy_net::Stack;
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embassy_time::{Duration, Instant, Timer, with_timeout};

use log::{error, info, warn};

use sntpc::{NtpContext, NtpTimestampGenerator, get_time};

use usage_sync::clock::Clock;

use crate::error::{Error, ErrorKind, Result};

// NTP server pool.
const NTP_SERVER: &str = "pool.ntp.org";
// NTP server port.
const NTP_PORT: u16 = 123;
// Local port of the NTP socket.
const LOCAL_PORT: u16 = 1123;
// Synchronization attempts before giving up.
const SYNC_ATTEMPTS: u32 = 10;
// Delay between two synchronization attempts.
const RETRY_DELAY_MS: u64 = 500;
// Time to wait for an NTP answer.
const QUERY_TIMEOUT_MS: u64 = 2_000;

// Socket buffer size.
const BUFFER_SIZE: usize = 256;
// Packet metadata length.
const PACKET_METADATA_LENGTH: usize = 2;

// Wall-clock reading taken at a given uptime.
#[derive(Clone, Copy)]
struct Anchor {
    unix_seconds: u64,
    uptime_ms: u64,
}

// Local timestamps used to compute the NTP round trip.
#[derive(Clone, Copy, Default)]
struct BootTime {
    micros: u64,
}

impl NtpTimestampGenerator for BootTime {
    fn init(&mut self) {
        self.micros = Instant::now().as_micros();
    }

    fn timestamp_sec(&self) -> u64 {
        self.micros / 1_000_000
    }

    fn timestamp_subsec_micros(&self) -> u32 {
        (self.micros % 1_000_000) as u32
    }
}

/// A [`Clock`] whose wall-clock reading is synchronized through `NTP`.
///
/// Before the first successful synchronization, only the monotonic reading
/// is available.
pub struct NetworkClock {
    anchor: CriticalSectionMutex<Cell<Option<Anchor>>>,
}

impl Default for NetworkClock {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkClock {
    /// Creates an unsynchronized [`NetworkClock`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            anchor: CriticalSectionMutex::new(Cell::new(None)),
        }
    }

    /// Synchronizes the wall-clock.
    ///
    /// Up to 10 queries are sent, 500 milliseconds apart.
    ///
    /// # Errors
    ///
    /// No query succeeded.
    pub async fn synchronize(&self, stack: Stack<'static>) -> Result<()> {
        info!("Synchronizing time with `{NTP_SERVER}`...");

        for attempt in 1..=SYNC_ATTEMPTS {
            match query(stack).await {
                Ok(unix_seconds) => {
                    let uptime_ms = Instant::now().as_millis();
                    self.anchor.lock(|anchor| {
                        anchor.set(Some(Anchor {
                            unix_seconds,
                            uptime_ms,
                        }));
                    });
                    info!("Time synchronized: {unix_seconds} seconds since the epoch");
                    return Ok(());
                }
                Err(e) => warn!("NTP attempt {attempt}/{SYNC_ATTEMPTS} failed: {e}"),
            }
            Timer::after_millis(RETRY_DELAY_MS).await;
        }

        error!("NTP sync failed");
        Err(Error::new(ErrorKind::Time, "NTP sync failed"))
    }
}

impl Clock for NetworkClock {
    fn uptime_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    fn unix_time(&self) -> Option<u64> {
        let anchor = self.anchor.lock(Cell::get)?;
        let elapsed_ms = self.uptime_ms().saturating_sub(anchor.uptime_ms);
        Some(anchor.unix_seconds + elapsed_ms / 1000)
    }
}

async fn query(stack: Stack<'static>) -> Result<u64> {
    let addresses = stack.dns_query(NTP_SERVER, DnsQueryType::A).await?;
    let address: IpAddr = addresses
        .first()
        .copied()
        .ok_or_else(|| Error::new(ErrorKind::Network, "No address for the NTP server"))?
        .into();

    let mut rx_meta = [PacketMetadata::EMPTY; PACKET_METADATA_LENGTH];
    let mut rx_buffer = [0; BUFFER_SIZE];
    let mut tx_meta = [PacketMetadata::EMPTY; PACKET_METADATA_LENGTH];
    let mut tx_buffer = [0; BUFFER_SIZE];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(LOCAL_PORT)?;

    let context = NtpContext::new(BootTime::default());
    let result = with_timeout(
        Duration::from_millis(QUERY_TIMEOUT_MS),
        get_time(SocketAddr::new(address, NTP_PORT), &socket, context),
    )
    .await
    .map_err(|_| Error::new(ErrorKind::Time, "NTP query timed out"))?
    .map_err(|e| Error::new(ErrorKind::Time, format!("NTP query failed: {e:?}")))?;

    Ok(u64::from(result.sec()))
}
