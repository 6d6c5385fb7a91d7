//! `usage-sync-esp32c3` is a library crate for building usage monitoring
//! firmware with `usage-sync` on an `ESP32-C3` microcontroller.
//!
//! It provides APIs to:
//!
//! - Connect a device to a `Wi-Fi` access point and keep it connected
//! - Build the network stack and expose its state as a [`usage_sync::link::Link`]
//! - Send `HTTPS` requests to the document store
//! - Synchronize the wall-clock through `NTP`
//! - Produce random nonces with the hardware random number generator
//!
//! The usage accumulator, the synchronization engine and the main loop live
//! in `usage-sync`. This crate only provides the board implementations of
//! their collaborators.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

/// Error management.
pub mod error;
/// The `HTTPS` transport.
pub mod https;
/// The network stack builder and the link state.
pub mod net;
/// The hardware random number generator.
pub mod rng;
/// The network-synchronized clock.
pub mod time;
/// The `Wi-Fi` controller.
pub mod wifi;

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}

pub(crate) use mk_static;
