#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

extern crate alloc;

use core::convert::Infallible;

use esp_hal::Config;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

use log::{info, warn};

use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Instant, Timer};

use usage_sync::app::{App, TICK_MS};
use usage_sync::config::SyncConfig;
use usage_sync::endpoint::Endpoint;
use usage_sync::engine::SyncEngine;
use usage_sync::led::StatusLed;
use usage_sync::protocol::log::Log;
use usage_sync::trigger::{PeriodicTrigger, PinTrigger, UsageSource};

use usage_sync_esp32c3::{
    https::HttpsTransport,
    net::{NetworkLink, NetworkStack},
    rng::HardwareRng,
    time::NetworkClock,
    wifi::{self, Wifi},
};

const MAX_HEAP_SIZE: usize = 128 * 1024;

// Blink period of the LED while connecting.
const BLINK_MS: u64 = 250;
// Period of the mock usage events.
const MOCK_TRIGGER_PERIOD_MS: u64 = 5_000;
// Threshold notifications waiting to be sent.
const NOTIFICATIONS: usize = 4;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[toml_cfg::toml_config]
struct DeviceConfig {
    #[default("")]
    ssid: &'static str,
    #[default("")]
    password: &'static str,
    #[default("")]
    project_id: &'static str,
    #[default("")]
    api_key: &'static str,
    #[default("device_001")]
    device_id: &'static str,
    #[default(10)]
    threshold: u32,
    #[default(false)]
    log_backend: bool,
    #[default(true)]
    mock_trigger: bool,
}

// The usage sensor.
enum Sensor {
    Mock(PeriodicTrigger),
    Pin(PinTrigger<Input<'static>>),
}

impl UsageSource for Sensor {
    fn poll(&mut self, now_ms: u64) -> bool {
        match self {
            Self::Mock(trigger) => trigger.poll(now_ms),
            Self::Pin(trigger) => trigger.poll(now_ms),
        }
    }
}

async fn blink(led: &mut StatusLed<Output<'static>>) -> Infallible {
    loop {
        // A GPIO output never fails.
        let _ = led.toggle();
        Timer::after_millis(BLINK_MS).await;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();

    let config = Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(size: MAX_HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);

    info!("ESP RTOS started!");

    let rng = Rng::new();

    // Retrieve device configuration.
    let device_config = DEVICE_CONFIG;

    // The on-board LED is lit by a low output.
    let mut led = StatusLed::new(Output::new(
        peripherals.GPIO8,
        Level::High,
        OutputConfig::default(),
    ))
    .active_low();

    let wifi = Wifi::configure(peripherals.WIFI, spawner).expect("Failed to configure Wi-Fi");

    let interface = match select(
        wifi.connect(device_config.ssid, device_config.password),
        blink(&mut led),
    )
    .await
    {
        Either::First(interface) => interface.expect("Failed to connect to Wi-Fi"),
        Either::Second(never) => match never {},
    };

    // The number of sockets must be increased depending on the needs.
    //
    // In this case, the value is 3 because we have:
    // - 1 DNS socket
    // - 1 TCP socket for HTTPS requests
    // - 1 UDP socket for NTP
    let stack = NetworkStack::build::<3>(rng, interface, spawner)
        .await
        .expect("Failed to create network stack.");

    let clock = NetworkClock::new();
    if clock.synchronize(stack).await.is_err() {
        warn!("Log documents will carry fallback timestamps");
    }

    let mut sync_config = SyncConfig::new(
        Endpoint::new(device_config.project_id, device_config.api_key),
        device_config.device_id,
    );
    if device_config.log_backend {
        sync_config = sync_config.log(Log::new());
    }

    let engine = SyncEngine::<NoopRawMutex, _, _, _, _>::new(
        sync_config,
        HttpsTransport::new(stack, rng),
        NetworkLink::new(stack),
        &clock,
        HardwareRng::new(rng),
    );

    let sensor = if device_config.mock_trigger {
        info!("Using a mock sensor, one use every {MOCK_TRIGGER_PERIOD_MS} ms");
        Sensor::Mock(PeriodicTrigger::new(
            MOCK_TRIGGER_PERIOD_MS,
            Instant::now().as_millis(),
        ))
    } else {
        Sensor::Pin(PinTrigger::new(Input::new(
            peripherals.GPIO9,
            InputConfig::default().with_pull(Pull::Down),
        )))
    };

    let notifications = Channel::<NoopRawMutex, u32, NOTIFICATIONS>::new();
    let mut app = App::new(
        &notifications,
        device_config.threshold,
        sensor,
        led,
        Instant::now().as_millis(),
    );

    info!(
        "Usage monitor running, threshold of {} uses",
        device_config.threshold
    );

    loop {
        let tick = app.tick(&engine).await;

        if tick.reconnect {
            wifi::reconnect();
        }

        if let Some(heartbeat) = tick.heartbeat {
            info!("{heartbeat}, free heap: {} bytes", esp_alloc::HEAP.free());
        }

        Timer::after_millis(TICK_MS).await;
    }
}
