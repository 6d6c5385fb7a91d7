//! `usage-sync` counts discrete usage events on a device and reports the
//! aggregated usage to a Firestore document store through its REST API.
//!
//! This crate provides APIs to:
//!
//! - Accumulate usage events and notify a sink once a threshold is reached
//! - Detect usage events from a periodic source or a debounced input pin
//! - Drive a status LED
//! - Run the main loop of a usage monitor
//! - Encode and decode the typed-field JSON envelope used by Firestore
//! - Synchronize usage with a remote document, either by updating a single
//!   counter document or by appending one log document per submission
//!
//! The synchronization engine is the core of the crate. It never runs two
//! attempts at the same time, enforces a minimum interval between attempts
//! and refuses to send anything while the network link is down. Every
//! attempt either completes, fails, or times out, and there are no retries:
//! the next threshold notification is the retry.
//!
//! Network, time and link are external collaborators, modelled as the
//! [`transport::Transport`], [`clock::Clock`] and [`link::Link`] traits,
//! so that the crate can be driven by firmware or by host tests alike.
//!
//! This crate can be compiled for both `std` and `no_std` environments.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

/// Usage accumulator and threshold notifications.
pub mod accumulator;
/// The application context driving the main loop.
pub mod app;
/// Monotonic and wall-clock time sources.
pub mod clock;
/// Synchronization engine configuration.
pub mod config;
/// Firestore `REST` endpoints.
pub mod endpoint;
/// The synchronization engine.
pub mod engine;
/// Typed-field JSON envelope.
pub mod envelope;
/// Error management.
pub mod error;
/// Status LED.
pub mod led;
/// Network link capability and link state tracking.
pub mod link;
/// Backend protocols.
pub mod protocol;
/// Timestamp generation.
pub mod timestamp;
/// HTTP transport abstraction.
pub mod transport;
/// Usage event sources.
pub mod trigger;
