//! Event Types for the Beacon History Log
//!
//! ## Overview
//!
//! An [`Event`] records one notable occurrence on the device: startup, a
//! connectivity change, an alarm toggle, or a periodic status tick. Each event
//! carries a snapshot of the device at insertion time (alarm flag, Wi-Fi
//! signal strength, battery level) so the dashboard can reconstruct what the
//! beacon looked like when it happened, not when the history was exported.
//!
//! ## Wire Format
//!
//! Events serialize as flat JSON objects:
//!
//! ```text
//! {
//!   "timestamp": 12345,            ms since boot
//!   "event_type": "alarm_activated",
//!   "details": "remote command",
//!   "alarm_status": true,
//!   "wifi_rssi": -61,
//!   "battery_level": 93
//! }
//! ```

use alloc::string::String;
use serde::Serialize;

use crate::time::Timestamp;

/// Event kind tag
///
/// Closed vocabulary, serialized as a snake_case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Beacon constructed, first entry of every history
    SystemStart,
    /// Wi-Fi association established
    WifiConnected,
    /// Wi-Fi association dropped
    WifiLost,
    /// Broker session established and command topic subscribed
    MqttConnected,
    /// Broker session dropped
    MqttDisconnected,
    /// Alarm switched on
    AlarmActivated,
    /// Alarm switched off
    AlarmDeactivated,
    /// Periodic status timer fired
    StatusUpdate,
}

impl EventKind {
    /// Get the wire tag
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::SystemStart => "system_start",
            EventKind::WifiConnected => "wifi_connected",
            EventKind::WifiLost => "wifi_lost",
            EventKind::MqttConnected => "mqtt_connected",
            EventKind::MqttDisconnected => "mqtt_disconnected",
            EventKind::AlarmActivated => "alarm_activated",
            EventKind::AlarmDeactivated => "alarm_deactivated",
            EventKind::StatusUpdate => "status_update",
        }
    }
}

/// One entry of the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Milliseconds since boot
    pub timestamp: Timestamp,
    /// What happened
    pub event_type: EventKind,
    /// Free-text detail
    pub details: String,
    /// Alarm flag at insertion time
    pub alarm_status: bool,
    /// Wi-Fi RSSI at insertion time
    pub wifi_rssi: i32,
    /// Battery percentage at insertion time
    pub battery_level: u8,
}

/// Device snapshot captured into every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Milliseconds since boot
    pub timestamp: Timestamp,
    /// Alarm flag at the time
    pub alarm_status: bool,
    /// Signal strength in dBm
    pub wifi_rssi: i32,
    /// Battery percentage
    pub battery_level: u8,
}

impl Event {
    /// Build an event from a device snapshot
    pub fn new(kind: EventKind, details: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            event_type: kind,
            details: details.into(),
            alarm_status: snapshot.alarm_status,
            wifi_rssi: snapshot.wifi_rssi,
            battery_level: snapshot.battery_level,
        }
    }
}
