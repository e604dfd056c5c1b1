//! Beacon Control Loop
//!
//! ## Overview
//!
//! A [`Beacon`] owns everything the firmware needs: the configuration, the
//! hardware seams, the [`DeviceState`] flags and the [`HistoryLog`]. The host
//! calls [`Beacon::start`] once and then [`Beacon::poll`] forever:
//!
//! ```text
//! start():  Wi-Fi associate (blocking) → MQTT connect (blocking, retries)
//!
//! poll():   ┌─ link down?        → record wifi_lost, re-associate
//!           ├─ transport down?   → record mqtt_disconnected, reconnect
//!           ├─ drain inbound     → decode → apply command
//!           ├─ alarm sounding?   → flip buzzer every 300 ms
//!           └─ status due?       → record status_update, publish status
//! ```
//!
//! Timed work compares elapsed milliseconds against [`Interval`]s rather than
//! sleeping, so the transport is serviced on every pass. The only blocking
//! calls are the connect loops and the locate / self-test beep patterns.
//!
//! ## History Export
//!
//! [`Beacon::record`] appends an event snapshotting the alarm flag, RSSI and
//! battery level at that moment. Every `flush_every` insertions (10 by
//! default) the full history is published to the dashboard topic. A
//! `get_history` command publishes it immediately.
//!
//! ## Failure Handling
//!
//! Nothing here returns an error. Connect failures are retried forever after a
//! fixed pause, publish failures are logged, and undecodable commands are
//! ignored without touching state.

use alloc::boxed::Box;
use alloc::format;
use log::{debug, info, warn};
use serde::Serialize;

use crate::battery::SyntheticBattery;
use crate::buzzer::{self, BeepPattern};
use crate::commands::{self, Command};
use crate::config::BeaconConfig;
use crate::events::{Event, EventKind, Snapshot};
use crate::history::{Appended, HistoryLog};
use crate::time::{Interval, TimeSource, Timestamp};
use crate::traits::{BatteryGauge, Buzzer, Delay, InboundMessage, Link, Transport};

/// Mutable device flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// Alarm switched on by command
    pub alarm_active: bool,
    /// Siren requested while the alarm is active
    pub buzzer_enabled: bool,
    /// Current buzzer pin level
    pub buzzer_level: bool,
    /// Wi-Fi association established
    pub wifi_connected: bool,
    /// Broker session established
    pub mqtt_connected: bool,
}

/// Status message published on the status topic
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    /// Reporting beacon
    pub beacon_id: &'a str,
    /// Alarm switched on
    pub alarm_active: bool,
    /// Siren enabled
    pub buzzer_on: bool,
    /// Signal strength in dBm
    pub wifi_rssi: i32,
    /// Battery percentage
    pub battery_level: u8,
    /// All-time history insertions
    pub history_count: u32,
    /// Milliseconds since boot
    pub timestamp: Timestamp,
}

/// Beacon firmware state and control loop
pub struct Beacon<T, L, C, B, D> {
    config: BeaconConfig,
    transport: T,
    link: L,
    clock: C,
    buzzer: B,
    delay: D,
    battery: Box<dyn BatteryGauge>,
    state: DeviceState,
    history: HistoryLog,
    status_timer: Interval,
    alarm_timer: Interval,
}

impl<T, L, C, B, D> Beacon<T, L, C, B, D>
where
    T: Transport,
    L: Link,
    C: TimeSource,
    B: Buzzer,
    D: Delay,
{
    /// Create a beacon with an empty history seeded by `system_start`
    pub fn new(config: BeaconConfig, transport: T, link: L, clock: C, buzzer: B, delay: D) -> Self {
        let now = clock.now();
        let history = config.new_history();
        let status_timer = Interval::new(config.status_interval(), now);
        let alarm_timer = Interval::new(config.alarm_toggle_interval(), now);

        let mut beacon = Self {
            config,
            transport,
            link,
            clock,
            buzzer,
            delay,
            battery: Box::new(SyntheticBattery::default()),
            state: DeviceState::default(),
            history,
            status_timer,
            alarm_timer,
        };

        let details = format!("beacon {} started", beacon.config.beacon_id());
        beacon.record(EventKind::SystemStart, details);
        beacon
    }

    /// Replace the battery gauge
    pub fn with_battery(mut self, gauge: impl BatteryGauge + 'static) -> Self {
        self.battery = Box::new(gauge);
        self
    }

    /// Bring up Wi-Fi and the broker session, blocking until both are up
    pub fn start(&mut self) {
        info!(
            "beacon {} starting, commands on {}",
            self.config.beacon_id(),
            self.config.command_topic()
        );
        self.connect_wifi();
        self.connect_mqtt();
    }

    /// Associate with the access point, polling until it succeeds
    pub fn connect_wifi(&mut self) {
        info!("connecting Wi-Fi");
        self.link.begin();
        while !self.link.is_associated() {
            self.delay.delay_ms(self.config.wifi_poll_interval());
        }

        self.state.wifi_connected = true;
        let rssi = self.link.signal_strength();
        info!("Wi-Fi connected, rssi {}", rssi);
        self.record(EventKind::WifiConnected, format!("rssi {} dBm", rssi));
    }

    /// Connect to the broker and subscribe, retrying forever
    pub fn connect_mqtt(&mut self) {
        loop {
            match self.transport.connect(self.config.client_id()) {
                Ok(()) => break,
                Err(e) => {
                    warn!(
                        "MQTT connect failed: {:?}, retrying in {} ms",
                        e,
                        self.config.mqtt_retry_delay()
                    );
                    self.delay.delay_ms(self.config.mqtt_retry_delay());
                }
            }
        }

        if let Err(e) = self.transport.subscribe(self.config.command_topic()) {
            warn!("subscribe to {} failed: {:?}", self.config.command_topic(), e);
        }

        self.state.mqtt_connected = true;
        info!("MQTT connected, subscribed to {}", self.config.command_topic());
        let details = format!("subscribed to {}", self.config.command_topic());
        self.record(EventKind::MqttConnected, details);
        self.publish_status();
    }

    /// Run one pass of the control loop
    pub fn poll(&mut self) {
        if !self.link.is_associated() {
            if self.state.wifi_connected {
                self.state.wifi_connected = false;
                warn!("Wi-Fi association lost");
                self.record(EventKind::WifiLost, "association lost");
            }
            self.connect_wifi();
        }

        if !self.transport.is_connected() {
            if self.state.mqtt_connected {
                self.state.mqtt_connected = false;
                warn!("MQTT session lost");
                self.record(EventKind::MqttDisconnected, "broker session lost");
            }
            self.connect_mqtt();
        }

        self.drain_inbound();

        let now = self.clock.now();
        self.drive_alarm(now);

        if self.status_timer.due(now) {
            self.record(EventKind::StatusUpdate, "periodic status");
            self.publish_status();
        }
    }

    fn drain_inbound(&mut self) {
        loop {
            match self.transport.poll_inbound() {
                Ok(message) => self.handle_message(&message),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    warn!("inbound poll failed: {:?}", e);
                    break;
                }
            }
        }
    }

    fn drive_alarm(&mut self, now: Timestamp) {
        if self.state.alarm_active && self.state.buzzer_enabled {
            if self.alarm_timer.due(now) {
                let level = !self.state.buzzer_level;
                self.set_buzzer(level);
            }
        } else if self.state.buzzer_level {
            self.set_buzzer(false);
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        buzzer::drive(&mut self.buzzer, on);
        self.state.buzzer_level = on;
    }

    /// Decode and apply one inbound message
    pub fn handle_message(&mut self, message: &InboundMessage) {
        if message.topic != self.config.command_topic() {
            debug!("ignoring message on {}", message.topic);
            return;
        }

        match commands::decode(self.config.dialect(), &message.payload, self.config.beacon_id()) {
            Ok(command) => self.apply(command),
            Err(e) => debug!("ignoring command on {}: {}", message.topic, e),
        }
    }

    /// Apply a decoded command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ActivateAlarm => {
                if !self.state.alarm_active {
                    self.state.alarm_active = true;
                    self.state.buzzer_enabled = true;
                    self.alarm_timer.reset(self.clock.now());
                    self.set_buzzer(true);
                    info!("alarm activated");
                    self.record(EventKind::AlarmActivated, "remote command");
                }
                self.publish_status();
            }
            Command::DeactivateAlarm => {
                if self.state.alarm_active {
                    self.state.alarm_active = false;
                    self.state.buzzer_enabled = false;
                    self.set_buzzer(false);
                    info!("alarm deactivated");
                    self.record(EventKind::AlarmDeactivated, "remote command");
                }
                self.publish_status();
            }
            Command::GetHistory => {
                info!("history requested");
                self.publish_history();
            }
            Command::Locate => {
                info!("locate requested");
                self.play(BeepPattern::LOCATE);
            }
            Command::TestBuzzer => {
                info!("buzzer self-test");
                self.play(BeepPattern::SELF_TEST);
            }
            Command::Unknown => debug!("unknown command ignored"),
        }
    }

    fn play(&mut self, pattern: BeepPattern) {
        buzzer::play(&mut self.buzzer, &mut self.delay, pattern);
        self.state.buzzer_level = false;
        self.alarm_timer.reset(self.clock.now());
    }

    /// Append an event and export the history when a flush is due
    pub fn record(&mut self, kind: EventKind, details: impl Into<alloc::string::String>) -> Appended {
        let snapshot = Snapshot {
            timestamp: self.clock.now(),
            alarm_status: self.state.alarm_active,
            wifi_rssi: self.link.signal_strength(),
            battery_level: self.battery.percent(),
        };

        let appended = self.history.append(Event::new(kind, details, snapshot));
        if appended.evicted > 0 {
            debug!("history full, evicted {} oldest", appended.evicted);
        }
        if appended.flush_due {
            self.publish_history();
        }
        appended
    }

    /// Publish the current device status
    pub fn publish_status(&mut self) {
        let report = StatusReport {
            beacon_id: self.config.beacon_id(),
            alarm_active: self.state.alarm_active,
            buzzer_on: self.state.buzzer_enabled,
            wifi_rssi: self.link.signal_strength(),
            battery_level: self.battery.percent(),
            history_count: self.history.total_events(),
            timestamp: self.clock.now(),
        };

        match serde_json::to_vec(&report) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(self.config.status_topic(), &payload) {
                    warn!("status publish failed: {:?}", e);
                }
            }
            Err(e) => warn!("status encode failed: {}", e),
        }
    }

    /// Export the history snapshot to the dashboard topic
    pub fn publish_history(&mut self) {
        let snapshot = self.history.snapshot(self.config.beacon_id(), self.clock.now());

        match serde_json::to_vec(&snapshot) {
            Ok(payload) => {
                debug!("exporting {} history entries", self.history.len());
                if let Err(e) = self.transport.publish(self.config.history_topic(), &payload) {
                    warn!("history publish failed: {:?}", e);
                }
            }
            Err(e) => warn!("history encode failed: {}", e),
        }
    }

    /// Current device flags
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Event history
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Active configuration
    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Mutably borrow the Wi-Fi link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Borrow the buzzer driver
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    /// Borrow the delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }
}
