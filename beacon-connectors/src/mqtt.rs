//! MQTT transport for beacons
//!
//! Wraps the rumqttc synchronous client. The client's event loop lives in
//! [`rumqttc::Connection`] and only makes progress when it is polled, so the
//! connector polls it from [`Transport::connect`] (until the broker's ConnAck)
//! and from [`Transport::poll_inbound`] (one bounded wait per call).
//!
//! A connection error tears the session down and reports the transport as
//! disconnected. The beacon loop notices and calls `connect` again, which
//! builds a fresh client.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use beacon_core::traits::{InboundMessage, Transport};
use log::{debug, info, warn};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError};
use thiserror::Error;

use crate::ConnectionStats;

/// MQTT-specific errors
#[derive(Debug, Error)]
pub enum MqttError {
    /// Request could not be queued to the event loop
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Network or protocol failure reported by the event loop
    #[error("Connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Broker did not acknowledge the connection in time
    #[error("No ConnAck within {0:?}")]
    ConnectTimeout(Duration),

    /// Event loop stopped
    #[error("Event loop disconnected")]
    Disconnected,

    /// Operation needs an established session
    #[error("Not connected")]
    NotConnected,
}

/// MQTT connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host name or address
    pub host: String,
    /// Broker TCP port
    pub port: u16,
    /// Keep-alive interval sent in CONNECT
    pub keep_alive: Duration,
    /// How long `connect` waits for ConnAck
    pub connect_timeout: Duration,
    /// How long one `poll_inbound` call may wait for an event
    pub poll_timeout: Duration,
    /// Request channel capacity between client and event loop
    pub capacity: usize,
    /// Optional username/password
    pub credentials: Option<(String, String)>,
    /// QoS for subscriptions and publishes
    pub qos: QoS,
    /// Largest packet accepted or sent, in bytes
    ///
    /// A full default-capacity history export is about 14KB, above the
    /// client's 10KB default.
    pub max_packet_size: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self::new("broker.emqx.io")
    }
}

impl MqttConfig {
    /// Configuration for `host` with the default port and timings
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 1883,
            keep_alive: Duration::from_secs(60),
            connect_timeout: Duration::from_millis(5000),
            poll_timeout: Duration::from_millis(10),
            capacity: 10,
            credentials: None,
            qos: QoS::AtMostOnce,
            max_packet_size: 32 * 1024,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout = Duration::from_millis(ms);
        self
    }

    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.poll_timeout = Duration::from_millis(ms);
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn max_packet_size(mut self, bytes: usize) -> Self {
        self.max_packet_size = bytes;
        self
    }

    fn options(&self, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options.set_max_packet_size(self.max_packet_size, self.max_packet_size);
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

struct Session {
    client: Client,
    connection: Connection,
}

/// Beacon transport over a rumqttc synchronous client
pub struct MqttConnector {
    config: MqttConfig,
    session: Option<Session>,
    connected: bool,
    ever_connected: bool,
    inbound: VecDeque<InboundMessage>,
    stats: ConnectionStats,
}

impl MqttConnector {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            session: None,
            connected: false,
            ever_connected: false,
            inbound: VecDeque::new(),
            stats: ConnectionStats::default(),
        }
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Messages received but not yet handed out
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Drop the session without sending DISCONNECT
    fn teardown(&mut self, error: &impl std::fmt::Display) {
        if self.connected {
            warn!("mqtt session lost: {}", error);
        }
        self.connected = false;
        self.session = None;
        self.stats.last_error = Some(error.to_string());
    }

    /// Handle one event loop notification, queueing any inbound publish
    fn on_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::Publish(publish)) => {
                self.stats.messages_received += 1;
                self.inbound
                    .push_back(InboundMessage::new(publish.topic, publish.payload.to_vec()));
            }
            Event::Incoming(Packet::Disconnect) => {
                self.teardown(&"broker sent DISCONNECT");
            }
            other => debug!("mqtt event: {:?}", other),
        }
    }

    fn session(&mut self) -> Result<&mut Session, MqttError> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        self.session.as_mut().ok_or(MqttError::NotConnected)
    }
}

impl Transport for MqttConnector {
    type Error = MqttError;

    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error> {
        self.session = None;
        self.connected = false;
        self.inbound.clear();

        info!("connecting to mqtt://{}:{} as {}", self.config.host, self.config.port, client_id);
        let (client, mut connection) = Client::new(self.config.options(client_id), self.config.capacity);

        let deadline = Instant::now() + self.config.connect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MqttError::ConnectTimeout(self.config.connect_timeout));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    debug!("connack: {:?}", ack);
                    break;
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    self.stats.last_error = Some(e.to_string());
                    return Err(MqttError::Connection(e));
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(MqttError::ConnectTimeout(self.config.connect_timeout));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(MqttError::Disconnected),
            }
        }

        if self.ever_connected {
            self.stats.reconnections += 1;
        }
        self.ever_connected = true;
        self.connected = true;
        self.session = Some(Session { client, connection });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        let qos = self.config.qos;
        self.session()?.client.subscribe(topic, qos)?;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        let qos = self.config.qos;
        let result = self
            .session()
            .and_then(|s| s.client.try_publish(topic, qos, false, payload.to_vec()).map_err(MqttError::from));

        match result {
            Ok(()) => {
                self.stats.record_sent(payload.len());
                Ok(())
            }
            Err(e) => {
                self.stats.record_failure(&e);
                Err(e)
            }
        }
    }

    fn poll_inbound(&mut self) -> nb::Result<InboundMessage, Self::Error> {
        if let Some(message) = self.inbound.pop_front() {
            return Ok(message);
        }

        let timeout = self.config.poll_timeout;
        let Some(session) = self.session.as_mut() else {
            return Err(nb::Error::WouldBlock);
        };

        match session.connection.recv_timeout(timeout) {
            Ok(Ok(event)) => self.on_event(event),
            Ok(Err(e)) => {
                self.teardown(&e);
                return Err(nb::Error::Other(MqttError::Connection(e)));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                self.teardown(&MqttError::Disconnected);
                return Err(nb::Error::Other(MqttError::Disconnected));
            }
        }

        self.inbound.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    use beacon_core::constants::DEFAULT_HISTORY_CAPACITY;
    use beacon_core::events::{Event, EventKind, Snapshot};
    use beacon_core::history::HistoryLog;

    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
    const DISCONNECT: [u8; 2] = [0xe0, 0x00];

    /// Read one MQTT control packet, returning the first header byte and body
    fn read_packet(stream: &mut TcpStream) -> std::io::Result<(u8, Vec<u8>)> {
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte)?;
        let header = byte[0];

        let mut len = 0usize;
        let mut shift = 0;
        loop {
            stream.read_exact(&mut byte)?;
            len |= ((byte[0] & 0x7f) as usize) << shift;
            if byte[0] & 0x80 == 0 {
                break;
            }
            shift += 7;
        }

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body)?;
        Ok((header, body))
    }

    /// QoS 0 PUBLISH with a short topic and payload
    fn publish_packet(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut packet = vec![0x30, (2 + topic.len() + payload.len()) as u8, 0, topic.len() as u8];
        packet.extend_from_slice(topic.as_bytes());
        packet.extend_from_slice(payload);
        packet
    }

    /// Loopback broker accepting `sessions` connections in turn. Each CONNECT
    /// is acknowledged before the socket is handed to `script`.
    fn spawn_broker<F>(sessions: usize, script: F) -> u16
    where
        F: Fn(&mut TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            for _ in 0..sessions {
                let (mut stream, _) = listener.accept().unwrap();
                let (header, _) = read_packet(&mut stream).unwrap();
                assert_eq!(header >> 4, 1, "first packet is CONNECT");
                stream.write_all(&CONNACK).unwrap();
                script(&mut stream);
            }
        });

        port
    }

    fn local_connector(port: u16) -> MqttConnector {
        MqttConnector::new(MqttConfig::new("127.0.0.1").port(port).connect_timeout_ms(2000))
    }

    fn full_history_export() -> Vec<u8> {
        let mut log = HistoryLog::default();
        for seq in 0..DEFAULT_HISTORY_CAPACITY as u64 {
            let snapshot = Snapshot {
                timestamp: 1_000_000 + seq,
                alarm_status: seq % 2 == 0,
                wifi_rssi: -61,
                battery_level: 93,
            };
            log.append(Event::new(EventKind::StatusUpdate, "periodic status", snapshot));
        }
        serde_json::to_vec(&log.snapshot("BEACON_001", 2_000_000)).unwrap()
    }

    #[test]
    fn default_config() {
        let config = MqttConfig::default();

        assert_eq!(config.host, "broker.emqx.io");
        assert_eq!(config.port, 1883);
        assert_eq!(config.keep_alive, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_millis(5000));
        assert_eq!(config.poll_timeout, Duration::from_millis(10));
        assert_eq!(config.capacity, 10);
        assert!(config.credentials.is_none());
        assert_eq!(config.max_packet_size, 32 * 1024);
    }

    #[test]
    fn config_builder() {
        let config = MqttConfig::new("localhost")
            .port(8883)
            .keep_alive_secs(30)
            .connect_timeout_ms(250)
            .poll_timeout_ms(1)
            .capacity(0)
            .credentials("beacon", "secret")
            .max_packet_size(64 * 1024);

        assert_eq!(config.port, 8883);
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.poll_timeout, Duration::from_millis(1));
        assert_eq!(config.capacity, 1);
        assert_eq!(config.credentials, Some(("beacon".into(), "secret".into())));
        assert_eq!(config.max_packet_size, 64 * 1024);
    }

    #[test]
    fn options_carry_client_id() {
        let options = MqttConfig::new("localhost").options("Beacon-BEACON_001");
        assert_eq!(options.client_id(), "Beacon-BEACON_001");
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
    }

    #[test]
    fn idle_connector_is_disconnected() {
        let mut mqtt = MqttConnector::new(MqttConfig::default());

        assert!(!mqtt.is_connected());
        assert!(matches!(mqtt.poll_inbound(), Err(nb::Error::WouldBlock)));
        assert!(matches!(mqtt.publish("t", b"x"), Err(MqttError::NotConnected)));
        assert!(matches!(mqtt.subscribe("t"), Err(MqttError::NotConnected)));
        assert_eq!(mqtt.stats().messages_failed, 1);
    }

    #[test]
    fn unreachable_broker_fails_connect() {
        // Nothing listens on port 1 of the loopback interface
        let config = MqttConfig::new("127.0.0.1").port(1).connect_timeout_ms(1000);
        let mut mqtt = MqttConnector::new(config);

        assert!(mqtt.connect("Beacon-TEST").is_err());
        assert!(!mqtt.is_connected());
    }

    #[test]
    fn connect_waits_for_connack_and_counts_reconnects() {
        let port = spawn_broker(2, |_| {});
        let mut mqtt = local_connector(port);

        mqtt.connect("Beacon-TEST").unwrap();
        assert!(mqtt.is_connected());
        assert_eq!(mqtt.stats().reconnections, 0);

        mqtt.connect("Beacon-TEST").unwrap();
        assert!(mqtt.is_connected());
        assert_eq!(mqtt.stats().reconnections, 1);
    }

    #[test]
    fn inbound_publish_is_delivered() {
        let port = spawn_broker(1, |stream| {
            let packet = publish_packet("beacon/B/command", br#"{"command":"locate"}"#);
            stream.write_all(&packet).unwrap();
            thread::sleep(Duration::from_millis(1000));
        });
        let mut mqtt = local_connector(port);
        mqtt.connect("Beacon-TEST").unwrap();

        let message = (0..200)
            .find_map(|_| mqtt.poll_inbound().ok())
            .expect("publish delivered");

        assert_eq!(message.topic, "beacon/B/command");
        assert_eq!(message.payload, br#"{"command":"locate"}"#);
        assert_eq!(mqtt.stats().messages_received, 1);
        assert!(mqtt.is_connected());
    }

    #[test]
    fn broker_disconnect_tears_session_down() {
        let port = spawn_broker(1, |stream| {
            stream.write_all(&DISCONNECT).unwrap();
            thread::sleep(Duration::from_millis(1000));
        });
        let mut mqtt = local_connector(port);
        mqtt.connect("Beacon-TEST").unwrap();

        for _ in 0..200 {
            if !mqtt.is_connected() {
                break;
            }
            let _ = mqtt.poll_inbound();
        }

        assert!(!mqtt.is_connected());
        assert!(matches!(mqtt.publish("beacon/B/status", b"{}"), Err(MqttError::NotConnected)));
    }

    #[test]
    fn full_history_export_fits_one_publish() {
        let payload = full_history_export();
        assert!(payload.len() > 10 * 1024, "export is {} bytes", payload.len());

        let (tx, rx) = mpsc::channel();
        let port = spawn_broker(1, move |stream| {
            while let Ok((header, body)) = read_packet(stream) {
                if header >> 4 == 3 {
                    let _ = tx.send(body.len());
                    break;
                }
            }
            thread::sleep(Duration::from_millis(1000));
        });
        let mut mqtt = local_connector(port);
        mqtt.connect("Beacon-TEST").unwrap();
        mqtt.publish("beacon/dashboard", &payload).unwrap();

        let mut received = None;
        for _ in 0..200 {
            if let Err(nb::Error::Other(e)) = mqtt.poll_inbound() {
                panic!("session dropped: {}", e);
            }
            if let Ok(len) = rx.try_recv() {
                received = Some(len);
                break;
            }
        }

        // Body is the length-prefixed topic plus the payload
        assert_eq!(received, Some(2 + "beacon/dashboard".len() + payload.len()));
        assert!(mqtt.is_connected());
    }

    #[test]
    fn queued_publish_is_handed_out() {
        let mut mqtt = MqttConnector::new(MqttConfig::default());
        mqtt.inbound.push_back(InboundMessage::new("beacon/B/command", &b"{}"[..]));

        assert_eq!(mqtt.pending(), 1);
        let message = mqtt.poll_inbound().unwrap();
        assert_eq!(message.topic, "beacon/B/command");
        assert_eq!(mqtt.pending(), 0);
    }
}
