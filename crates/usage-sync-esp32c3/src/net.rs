use alloc::boxed::Box;

use esp_hal::rng::Rng;

use esp_radio::wifi::WifiDevice;

use embassy_executor::Spawner;
use embassy_net::{Config, DhcpConfig, Runner, Stack, StackResources};
use embassy_time::Timer;

use log::info;

use usage_sync::link::Link;

use crate::error::Result;

const MILLISECONDS_TO_WAIT: u64 = 100;

#[embassy_executor::task]
async fn task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

/// The network stack builder.
pub struct NetworkStack;

impl NetworkStack {
    /// Builds the network stack and waits for a valid `IP` configuration.
    ///
    /// `SOCKET_STACK_SIZE` is the number of sockets open at the same time:
    /// one for `DNS`, one for each `HTTPS` connection and one for `NTP`.
    ///
    /// # Errors
    ///
    /// Failure to spawn the network stack task.
    pub async fn build<const SOCKET_STACK_SIZE: usize>(
        rng: Rng,
        wifi_interface: WifiDevice<'static>,
        spawner: Spawner,
    ) -> Result<Stack<'static>> {
        let config = Config::dhcpv4(DhcpConfig::default());
        let seed = u64::from(rng.random()) << 32 | u64::from(rng.random());

        // `mk_static` does not accept generics, const generics included.
        let resources = Box::leak(Box::new(StackResources::<SOCKET_STACK_SIZE>::new()));

        let (stack, runner) = embassy_net::new(wifi_interface, config, resources, seed);

        spawner.spawn(task(runner))?;

        info!("Waiting to get IP address...");
        while !stack.is_config_up() {
            Timer::after_millis(MILLISECONDS_TO_WAIT).await;
        }

        if let Some(config) = stack.config_v4() {
            info!("Got IP address {}", config.address.address());
        }

        Ok(stack)
    }
}

/// The network link of the station interface.
///
/// The link is connected when the `Wi-Fi` association is up and `DHCP`
/// assigned an address.
#[derive(Clone, Copy)]
pub struct NetworkLink(Stack<'static>);

impl NetworkLink {
    /// Creates a [`NetworkLink`] for the given stack.
    #[must_use]
    pub const fn new(stack: Stack<'static>) -> Self {
        Self(stack)
    }
}

impl Link for NetworkLink {
    fn is_connected(&self) -> bool {
        self.0.is_link_up() && self.0.is_config_up()
    }
}
