//! Constants for Beacon Firmware
//!
//! Every interval, threshold and size used by the firmware is defined here.
//! The values match the field-deployed sketches so a reflashed device behaves
//! the same on the wire and at the buzzer.

// ===== HISTORY LOG =====

/// Default number of events kept in the history log.
///
/// A full export serializes to roughly 14KB. Transports must accept
/// packets of at least that size (the host MQTT connector allows 32KB).
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Export the history after this many cumulative insertions.
pub const DEFAULT_HISTORY_FLUSH_EVERY: u32 = 10;

/// Command tag carried by every exported history snapshot.
pub const HISTORY_UPDATE_TAG: &str = "history_update";

// ===== IDENTIFIERS =====

/// Longest beacon id that fits the inline id buffer.
pub const MAX_BEACON_ID_LEN: usize = 32;

/// Longest MQTT topic that fits the inline topic buffer.
pub const MAX_TOPIC_LEN: usize = 96;

/// Prefix of the MQTT client id (`Beacon-<id>`).
pub const CLIENT_ID_PREFIX: &str = "Beacon-";

/// Shared dashboard topic receiving history snapshots from every beacon.
pub const DEFAULT_HISTORY_TOPIC: &str = "beacon/dashboard";

// ===== LOOP TIMING =====

/// Interval between periodic status publications.
pub const STATUS_INTERVAL_MS: u32 = 5_000;

/// Half-period of the alarm siren (buzzer level flips this often).
pub const ALARM_TOGGLE_INTERVAL_MS: u32 = 300;

/// Pause between failed MQTT connection attempts.
pub const MQTT_RETRY_DELAY_MS: u32 = 2_000;

/// Poll period while waiting for Wi-Fi association.
pub const WIFI_POLL_INTERVAL_MS: u32 = 100;

// ===== BATTERY PLACEHOLDER =====

/// Lowest value produced by the synthetic battery gauge.
pub const SYNTHETIC_BATTERY_MIN_PCT: u8 = 80;

/// Highest value produced by the synthetic battery gauge.
pub const SYNTHETIC_BATTERY_MAX_PCT: u8 = 100;

// ===== SENSOR NODE =====

/// Temperature at or above which the heat alert fires.
pub const HEAT_ALERT_C: f32 = 30.0;

/// Raw smoke-proxy ADC level at or above which the smoke alert fires.
pub const SMOKE_ALERT_LEVEL: u16 = 500;

/// ThingSpeak accepts one update per channel every 15 seconds.
pub const SENSOR_UPLOAD_INTERVAL_MS: u32 = 15_000;

/// Chirp played on a new motion detection.
pub const MOTION_TONE_HZ: u16 = 2_000;
/// Duration of the motion chirp.
pub const MOTION_TONE_MS: u32 = 300;

/// Tone played while the heat alert is active.
pub const HEAT_TONE_HZ: u16 = 440;
/// Duration of the heat tone.
pub const HEAT_TONE_MS: u32 = 500;

/// Tone played while the smoke alert is active.
pub const SMOKE_TONE_HZ: u16 = 1_000;
/// Duration of the smoke tone.
pub const SMOKE_TONE_MS: u32 = 500;
