//! Core firmware logic for MQTT alarm beacons and safety sensor nodes
//!
//! Handles the beacon's bounded event history, command decoding and the
//! single-threaded control loop. Designed for ESP32-class devices.
//!
//! Key constraints:
//! - One thread, cooperative polling, no locking
//! - History bounded to a fixed number of events
//! - Hardware and network reached only through the traits in [`traits`]
//!
//! ```no_run
//! use beacon_core::{Beacon, BeaconConfig, ConfigError};
//! use beacon_core::time::TimeSource;
//! use beacon_core::traits::{Buzzer, Delay, Link, Transport};
//!
//! fn run<T, L, C, B, D>(transport: T, link: L, clock: C, buzzer: B, delay: D) -> Result<(), ConfigError>
//! where
//!     T: Transport,
//!     L: Link,
//!     C: TimeSource,
//!     B: Buzzer,
//!     D: Delay,
//! {
//!     let config = BeaconConfig::new("BEACON_001")?;
//!     let mut beacon = Beacon::new(config, transport, link, clock, buzzer, delay);
//!
//!     beacon.start();
//!     loop {
//!         beacon.poll();
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod battery;
pub mod beacon;
pub mod buzzer;
pub mod commands;
pub mod config;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod events;
pub mod history;
pub mod time;
pub mod traits;

// Public API
pub use beacon::{Beacon, DeviceState};
pub use commands::{Command, CommandDialect};
pub use config::BeaconConfig;
pub use errors::{ConfigError, ConfigResult, DecodeError};
pub use events::{Event, EventKind};
pub use history::{Appended, HistoryLog, HistorySnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
