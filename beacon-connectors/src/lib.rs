//! Network Connectors for Beacon Devices
//!
//! ## Overview
//!
//! Host-side implementations of the seams declared in `beacon_core::traits`.
//! Each connector is gated behind a feature so a build only pulls in the
//! protocol stack it uses.
//!
//! ### MQTT (`mqtt` feature)
//!
//! [`mqtt::MqttConnector`] implements `Transport` on top of the rumqttc
//! synchronous client. The beacon drives it from its single-threaded loop:
//! every `poll_inbound` call advances the client's event loop by at most one
//! event, which also services keep-alive pings and outgoing publishes.
//!
//! ### HTTP (`http` feature)
//!
//! [`http::ThingSpeakUploader`] implements `ReadingSink` for the sensor node.
//! Readings are pushed as a single GET to the ThingSpeak update endpoint.
//!
//! ## Example Usage
//!
//! ```no_run
//! use beacon_connectors::mqtt::{MqttConfig, MqttConnector};
//! use beacon_core::traits::Transport;
//!
//! let mut mqtt = MqttConnector::new(MqttConfig::new("broker.emqx.io").port(1883));
//! mqtt.connect("Beacon-BEACON_001")?;
//! mqtt.publish("beacon/BEACON_001/status", br#"{"alarm_active":false}"#)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "http")]
pub mod http;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector, MqttError};

#[cfg(feature = "http")]
pub use http::{HttpError, ThingSpeakConfig, ThingSpeakUploader};

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total payload bytes sent
    pub bytes_sent: u64,
    /// Total messages received
    pub messages_received: u64,
    /// Number of successful connects after the first
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub(crate) fn record_failure(&mut self, error: &impl std::fmt::Display) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }
}
