//! Hardware and Transport Seams
//!
//! The firmware talks to four kinds of collaborators it does not own: the
//! pub/sub transport, the Wi-Fi link, the buzzer pin and the blocking delay
//! provider. Each gets a small trait here so the control loop can run against
//! real ESP32 peripherals, a host MQTT client, or test doubles with no change.
//!
//! ## Design Notes
//!
//! - **Static dispatch**: the beacon is generic over these traits, so the
//!   firmware build monomorphizes to direct calls.
//! - **Non-blocking inbound**: [`Transport::poll_inbound`] returns
//!   `nb::Result` and yields `WouldBlock` when no message is waiting, the same
//!   convention embedded HAL drivers use.
//! - **Unchecked outputs**: pin and publish errors are surfaced as `Result`
//!   but the loop only logs them.
//!
//! ## Example Implementation
//!
//! ```rust
//! use beacon_core::traits::Buzzer;
//!
//! struct ConsoleBuzzer;
//!
//! impl Buzzer for ConsoleBuzzer {
//!     type Error = core::convert::Infallible;
//!
//!     fn set_level(&mut self, on: bool) -> Result<(), Self::Error> {
//!         // Drive GPIO5 here
//!         let _ = on;
//!         Ok(())
//!     }
//! }
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::environment::{EnvironmentReading, Tone};

/// Message delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on
    pub topic: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Build a message
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publish/subscribe transport (MQTT in production)
pub trait Transport {
    /// Transport-specific failure
    type Error: Debug;

    /// Open a session with the broker using `client_id`
    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error>;

    /// Check if the session is up
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic on the current session
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Publish a payload
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the next inbound message, `WouldBlock` when none is queued
    fn poll_inbound(&mut self) -> nb::Result<InboundMessage, Self::Error>;
}

/// Network association (Wi-Fi station)
pub trait Link {
    /// Start associating with the configured access point
    fn begin(&mut self);

    /// Check whether the station is associated
    fn is_associated(&self) -> bool;

    /// Signal strength of the current association (RSSI, dBm)
    fn signal_strength(&self) -> i32;
}

/// Buzzer output pin
pub trait Buzzer {
    /// Pin driver failure
    type Error: Debug;

    /// Drive the pin high (`true`) or low (`false`)
    fn set_level(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// Blocking delay provider
pub trait Delay {
    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Battery level probe
pub trait BatteryGauge {
    /// Charge level in percent
    fn percent(&mut self) -> u8;
}

/// Environmental sensor bank read once per sensor-node cycle
pub trait EnvironmentSensors {
    /// Take one reading from every sensor
    fn read(&mut self) -> EnvironmentReading;
}

/// Status LEDs and tone generator of the sensor node
pub trait Indicators {
    /// Set the red and green LEDs
    fn set_leds(&mut self, red: bool, green: bool);

    /// Start a tone on the buzzer
    fn tone(&mut self, tone: Tone);
}

/// Destination for sensor-node readings (cloud dashboard)
pub trait ReadingSink {
    /// Delivery failure
    type Error: Debug;

    /// Deliver one reading
    fn submit(&mut self, reading: &EnvironmentReading) -> Result<(), Self::Error>;
}
