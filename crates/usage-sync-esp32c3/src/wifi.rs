use esp_hal::peripherals::WIFI;

use esp_radio::Controller;
use esp_radio::wifi::{
    ClientConfig, Interfaces, ModeConfig, WifiController, WifiDevice, WifiEvent,
};

use embassy_executor::Spawner;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;

use log::{error, info, warn};

use crate::error::Result;
use crate::mk_static;

// Delay between two connection attempts.
const RETRY_DELAY_MS: u64 = 5_000;

// Reconnection requests coming from the main loop.
static RECONNECT: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Requests a reconnection of the station interface.
///
/// The request is ignored while a connection attempt is in progress.
pub fn reconnect() {
    RECONNECT.signal(());
}

/// The `Wi-Fi` controller.
pub struct Wifi {
    controller: WifiController<'static>,
    interfaces: Interfaces<'static>,
    spawner: Spawner,
}

impl Wifi {
    /// Configures the radio for the station mode.
    ///
    /// # Errors
    ///
    /// Failure to initialize the radio or the `Wi-Fi` controller.
    pub fn configure(peripheral: WIFI<'static>, spawner: Spawner) -> Result<Self> {
        let radio = mk_static!(Controller<'static>, esp_radio::init()?);
        let (controller, interfaces) =
            esp_radio::wifi::new(radio, peripheral, Default::default())?;

        Ok(Self {
            controller,
            interfaces,
            spawner,
        })
    }

    /// Connects to an access point.
    ///
    /// Blocks until the connection succeeds, retrying every 5 seconds, then
    /// spawns the task which keeps the connection alive.
    ///
    /// # Errors
    ///
    /// Failure to start the controller or to spawn the connection task.
    pub async fn connect(
        mut self,
        ssid: &'static str,
        password: &'static str,
    ) -> Result<WifiDevice<'static>> {
        let config = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(ssid.into())
                .with_password(password.into()),
        );
        self.controller.set_config(&config)?;

        info!("Starting Wi-Fi...");
        self.controller.start_async().await?;

        info!("Connecting to `{ssid}`...");
        while let Err(e) = self.controller.connect_async().await {
            warn!("Wi-Fi connection failed: {e:?}, retrying...");
            Timer::after_millis(RETRY_DELAY_MS).await;
        }
        info!("Wi-Fi connected!");

        self.spawner.spawn(maintain(self.controller))?;

        Ok(self.interfaces.sta)
    }
}

#[embassy_executor::task]
async fn maintain(mut controller: WifiController<'static>) {
    loop {
        if matches!(controller.is_connected(), Ok(true)) {
            let _ = select(
                controller.wait_for_event(WifiEvent::StaDisconnected),
                RECONNECT.wait(),
            )
            .await;
            warn!("Wi-Fi disconnected");
            Timer::after_millis(RETRY_DELAY_MS).await;
        }

        info!("Reconnecting to Wi-Fi...");
        match controller.connect_async().await {
            Ok(()) => info!("Wi-Fi reconnected!"),
            Err(e) => {
                error!("Wi-Fi reconnection failed: {e:?}");
                Timer::after_millis(RETRY_DELAY_MS).await;
            }
        }
        RECONNECT.reset();
    }
}
