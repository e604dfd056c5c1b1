//! Beacon configuration
//!
//! Built once at startup and validated up front, so the control loop never has
//! to handle a bad id or an impossible history size.
//!
//! ```rust
//! use beacon_core::config::BeaconConfig;
//! use beacon_core::commands::CommandDialect;
//!
//! let config = BeaconConfig::new("BEACON_001")?
//!     .history_capacity(50)?
//!     .status_interval_ms(10_000);
//!
//! assert_eq!(config.command_topic(), "beacon/BEACON_001/command");
//! assert_eq!(config.client_id(), "Beacon-BEACON_001");
//!
//! // Legacy free-text beacons listen on the Portuguese topic
//! let legacy = BeaconConfig::free_text("BEACON_002")?;
//! assert_eq!(legacy.dialect(), CommandDialect::FreeText);
//! assert_eq!(legacy.command_topic(), "beacon/BEACON_002/comando");
//! # Ok::<(), beacon_core::ConfigError>(())
//! ```

use core::fmt::Write;
use core::num::{NonZeroU32, NonZeroUsize};
use heapless::String;

use crate::commands::CommandDialect;
use crate::constants::{
    ALARM_TOGGLE_INTERVAL_MS, CLIENT_ID_PREFIX, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_HISTORY_FLUSH_EVERY, DEFAULT_HISTORY_TOPIC, MAX_BEACON_ID_LEN, MAX_TOPIC_LEN,
    MQTT_RETRY_DELAY_MS, STATUS_INTERVAL_MS, WIFI_POLL_INTERVAL_MS,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::history::HistoryLog;

/// Inline beacon identifier
pub type BeaconId = String<MAX_BEACON_ID_LEN>;

/// Inline MQTT topic
pub type Topic = String<MAX_TOPIC_LEN>;

/// Validated beacon configuration
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    beacon_id: BeaconId,
    client_id: Topic,
    command_topic: Topic,
    status_topic: Topic,
    history_topic: Topic,
    dialect: CommandDialect,
    history_capacity: NonZeroUsize,
    history_flush_every: NonZeroU32,
    status_interval_ms: u32,
    alarm_toggle_interval_ms: u32,
    mqtt_retry_delay_ms: u32,
    wifi_poll_interval_ms: u32,
}

impl BeaconConfig {
    /// Structured-command beacon with the default topics
    pub fn new(beacon_id: &str) -> ConfigResult<Self> {
        let id = parse_beacon_id(beacon_id)?;

        Ok(Self {
            client_id: format_topic(format_args!("{}{}", CLIENT_ID_PREFIX, beacon_id))?,
            command_topic: format_topic(format_args!("beacon/{}/command", beacon_id))?,
            status_topic: format_topic(format_args!("beacon/{}/status", beacon_id))?,
            history_topic: format_topic(format_args!("{}", DEFAULT_HISTORY_TOPIC))?,
            beacon_id: id,
            dialect: CommandDialect::Structured,
            history_capacity: non_zero_capacity(DEFAULT_HISTORY_CAPACITY)?,
            history_flush_every: non_zero_flush(DEFAULT_HISTORY_FLUSH_EVERY)?,
            status_interval_ms: STATUS_INTERVAL_MS,
            alarm_toggle_interval_ms: ALARM_TOGGLE_INTERVAL_MS,
            mqtt_retry_delay_ms: MQTT_RETRY_DELAY_MS,
            wifi_poll_interval_ms: WIFI_POLL_INTERVAL_MS,
        })
    }

    /// Legacy free-text beacon listening on `beacon/<id>/comando`
    pub fn free_text(beacon_id: &str) -> ConfigResult<Self> {
        let mut config = Self::new(beacon_id)?;
        config.dialect = CommandDialect::FreeText;
        config.command_topic = format_topic(format_args!("beacon/{}/comando", beacon_id))?;
        Ok(config)
    }

    /// Set the maximum number of events kept in memory
    pub fn history_capacity(mut self, capacity: usize) -> ConfigResult<Self> {
        self.history_capacity = non_zero_capacity(capacity)?;
        Ok(self)
    }

    /// Export the history every `every` insertions
    pub fn history_flush_every(mut self, every: u32) -> ConfigResult<Self> {
        self.history_flush_every = non_zero_flush(every)?;
        Ok(self)
    }

    /// Override the command topic
    pub fn with_command_topic(mut self, topic: &str) -> ConfigResult<Self> {
        self.command_topic = parse_topic(topic)?;
        Ok(self)
    }

    /// Override the status topic
    pub fn with_status_topic(mut self, topic: &str) -> ConfigResult<Self> {
        self.status_topic = parse_topic(topic)?;
        Ok(self)
    }

    /// Override the dashboard topic receiving history snapshots
    pub fn with_history_topic(mut self, topic: &str) -> ConfigResult<Self> {
        self.history_topic = parse_topic(topic)?;
        Ok(self)
    }

    /// Set the command payload dialect
    pub fn with_dialect(mut self, dialect: CommandDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the periodic status interval
    pub fn status_interval_ms(mut self, ms: u32) -> Self {
        self.status_interval_ms = ms;
        self
    }

    /// Set the siren toggle period
    pub fn alarm_toggle_interval_ms(mut self, ms: u32) -> Self {
        self.alarm_toggle_interval_ms = ms;
        self
    }

    /// Set the pause between broker connect attempts
    pub fn mqtt_retry_delay_ms(mut self, ms: u32) -> Self {
        self.mqtt_retry_delay_ms = ms;
        self
    }

    /// Set the Wi-Fi association poll period
    pub fn wifi_poll_interval_ms(mut self, ms: u32) -> Self {
        self.wifi_poll_interval_ms = ms;
        self
    }

    /// Beacon identifier
    pub fn beacon_id(&self) -> &str {
        &self.beacon_id
    }

    /// MQTT client id (`Beacon-<id>`)
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Topic commands arrive on
    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    /// Topic status reports go to
    pub fn status_topic(&self) -> &str {
        &self.status_topic
    }

    /// Topic history exports go to
    pub fn history_topic(&self) -> &str {
        &self.history_topic
    }

    /// Command payload dialect
    pub fn dialect(&self) -> CommandDialect {
        self.dialect
    }

    /// Periodic status interval in ms
    pub fn status_interval(&self) -> u32 {
        self.status_interval_ms
    }

    /// Siren toggle period in ms
    pub fn alarm_toggle_interval(&self) -> u32 {
        self.alarm_toggle_interval_ms
    }

    /// Broker reconnect pause in ms
    pub fn mqtt_retry_delay(&self) -> u32 {
        self.mqtt_retry_delay_ms
    }

    /// Wi-Fi association poll period in ms
    pub fn wifi_poll_interval(&self) -> u32 {
        self.wifi_poll_interval_ms
    }

    /// Build an empty history log sized by this config
    pub fn new_history(&self) -> HistoryLog {
        HistoryLog::new(self.history_capacity, self.history_flush_every)
    }
}

fn parse_beacon_id(id: &str) -> ConfigResult<BeaconId> {
    if id.is_empty() {
        return Err(ConfigError::EmptyBeaconId);
    }

    let mut out = BeaconId::new();
    out.push_str(id).map_err(|_| ConfigError::BeaconIdTooLong {
        len: id.len(),
        max: MAX_BEACON_ID_LEN,
    })?;
    Ok(out)
}

fn parse_topic(topic: &str) -> ConfigResult<Topic> {
    let mut out = Topic::new();
    out.push_str(topic).map_err(|_| ConfigError::TopicTooLong {
        len: topic.len(),
        max: MAX_TOPIC_LEN,
    })?;
    Ok(out)
}

fn format_topic(args: core::fmt::Arguments<'_>) -> ConfigResult<Topic> {
    let mut out = Topic::new();
    if out.write_fmt(args).is_err() {
        let mut measured = Measure(0);
        let _ = measured.write_fmt(args);
        return Err(ConfigError::TopicTooLong {
            len: measured.0,
            max: MAX_TOPIC_LEN,
        });
    }
    Ok(out)
}

/// Byte counter for formatted output that did not fit
struct Measure(usize);

impl Write for Measure {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

fn non_zero_capacity(capacity: usize) -> ConfigResult<NonZeroUsize> {
    NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)
}

fn non_zero_flush(every: u32) -> ConfigResult<NonZeroU32> {
    NonZeroU32::new(every).ok_or(ConfigError::ZeroFlushInterval)
}
