//! Common test doubles for beacon integration tests
//!
//! This module provides:
//! - A scripted in-memory transport that records publishes
//! - A Wi-Fi link that associates after a configurable number of polls
//! - A buzzer that records pin levels
//! - A delay that records pauses and advances the shared test clock

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use beacon_core::{
    battery::FixedBattery,
    time::{ManualClock, TimeSource},
    traits::{Buzzer, Delay, InboundMessage, Link, Transport},
    Beacon, BeaconConfig,
};

pub const BEACON_ID: &str = "BEACON_001";
pub const RSSI: i32 = -61;
pub const BATTERY: u8 = 88;

pub type TestBeacon = Beacon<MockTransport, MockLink, ManualClock, RecordingBuzzer, RecordingDelay>;

/// Transport double with scripted connect failures and an inbound queue
#[derive(Debug, Default)]
pub struct MockTransport {
    pub connected: bool,
    pub connect_failures: u32,
    pub connect_attempts: u32,
    pub client_ids: Vec<String>,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub inbound: VecDeque<InboundMessage>,
    pub fail_publish: bool,
}

impl MockTransport {
    pub fn failing_connects(count: u32) -> Self {
        Self {
            connect_failures: count,
            ..Self::default()
        }
    }

    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessage::new(topic, payload));
    }

    /// Decoded JSON payloads published on `topic`, oldest first
    pub fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| serde_json::from_slice(payload).expect("published payload is JSON"))
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = &'static str;

    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error> {
        self.connect_attempts += 1;
        self.client_ids.push(client_id.to_string());
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err("connection refused");
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        if self.fail_publish {
            return Err("publish rejected");
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn poll_inbound(&mut self) -> nb::Result<InboundMessage, Self::Error> {
        self.inbound.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Wi-Fi double that reports associated after `polls_until_up` checks
#[derive(Debug)]
pub struct MockLink {
    pub polls_until_up: Cell<u32>,
    pub associated: Cell<bool>,
    pub begin_calls: u32,
    pub rssi: i32,
}

impl MockLink {
    pub fn up() -> Self {
        Self::after_polls(0)
    }

    pub fn after_polls(polls: u32) -> Self {
        Self {
            polls_until_up: Cell::new(polls),
            associated: Cell::new(polls == 0),
            begin_calls: 0,
            rssi: RSSI,
        }
    }

    pub fn drop_association(&mut self, polls_until_up: u32) {
        self.associated.set(false);
        self.polls_until_up.set(polls_until_up);
    }
}

impl Link for MockLink {
    fn begin(&mut self) {
        self.begin_calls += 1;
    }

    fn is_associated(&self) -> bool {
        if !self.associated.get() {
            let remaining = self.polls_until_up.get();
            if remaining == 0 {
                self.associated.set(true);
            } else {
                self.polls_until_up.set(remaining - 1);
            }
        }
        self.associated.get()
    }

    fn signal_strength(&self) -> i32 {
        self.rssi
    }
}

/// Buzzer double recording every level written
#[derive(Debug, Default)]
pub struct RecordingBuzzer {
    pub levels: Vec<bool>,
}

impl Buzzer for RecordingBuzzer {
    type Error = core::convert::Infallible;

    fn set_level(&mut self, on: bool) -> Result<(), Self::Error> {
        self.levels.push(on);
        Ok(())
    }
}

/// Delay double that records pauses and moves the clock forward
#[derive(Debug)]
pub struct RecordingDelay {
    pub calls: Vec<u32>,
    clock: ManualClock,
}

impl RecordingDelay {
    pub fn new(clock: ManualClock) -> Self {
        Self { calls: Vec::new(), clock }
    }

    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| ms as u64).sum()
    }
}

impl Delay for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
        self.clock.advance(ms as u64);
    }
}

pub fn config() -> BeaconConfig {
    BeaconConfig::new(BEACON_ID).expect("valid test config")
}

/// Beacon wired to fresh doubles, plus a handle on its clock
pub fn beacon_with(config: BeaconConfig, transport: MockTransport, link: MockLink) -> (TestBeacon, ManualClock) {
    let clock = ManualClock::new(0);
    let delay = RecordingDelay::new(clock.clone());
    let beacon = Beacon::new(config, transport, link, clock.clone(), RecordingBuzzer::default(), delay)
        .with_battery(FixedBattery(BATTERY));
    (beacon, clock)
}

pub fn beacon() -> (TestBeacon, ManualClock) {
    beacon_with(config(), MockTransport::default(), MockLink::up())
}

/// Beacon that has completed `start()`
pub fn started_beacon() -> (TestBeacon, ManualClock) {
    let (mut beacon, clock) = beacon();
    beacon.start();
    (beacon, clock)
}

pub fn command(beacon_id: &str, command: &str) -> Vec<u8> {
    format!(r#"{{"beacon_id":"{}","command":"{}"}}"#, beacon_id, command).into_bytes()
}

pub fn event_types(beacon: &TestBeacon) -> Vec<&'static str> {
    beacon.history().iter().map(|e| e.event_type.as_str()).collect()
}

pub fn now(clock: &ManualClock) -> u64 {
    clock.now()
}
