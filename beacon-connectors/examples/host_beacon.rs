//! Run a beacon on the host against a public MQTT broker
//!
//! ```text
//! BEACON_ID=BEACON_042 MQTT_BROKER=test.mosquitto.org RUST_LOG=info \
//!     cargo run -p beacon-connectors --example host_beacon
//! ```
//!
//! Then publish to `beacon/BEACON_042/command`:
//!
//! ```text
//! {"beacon_id":"BEACON_042","command":"activate_alarm"}
//! ```
//!
//! Set `BEACON_DIALECT=free_text` to listen on `beacon/<id>/comando` for
//! plain `ativar_beacon` / `desativar_beacon` messages instead.

use std::convert::Infallible;
use std::env;
use std::thread;
use std::time::Duration;

use beacon_connectors::mqtt::{MqttConfig, MqttConnector};
use beacon_core::time::MonotonicTime;
use beacon_core::traits::{Buzzer, Delay, Link};
use beacon_core::{Beacon, BeaconConfig};
use log::info;
use tracing_subscriber::EnvFilter;

/// Host network is always up
struct HostLink;

impl Link for HostLink {
    fn begin(&mut self) {}

    fn is_associated(&self) -> bool {
        true
    }

    fn signal_strength(&self) -> i32 {
        -50
    }
}

/// Logs buzzer edges instead of driving a pin
#[derive(Default)]
struct ConsoleBuzzer {
    level: bool,
}

impl Buzzer for ConsoleBuzzer {
    type Error = Infallible;

    fn set_level(&mut self, on: bool) -> Result<(), Self::Error> {
        if on != self.level {
            info!("buzzer {}", if on { "ON" } else { "off" });
            self.level = on;
        }
        Ok(())
    }
}

struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default features bridge `log` records into the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let beacon_id = env::var("BEACON_ID").unwrap_or_else(|_| "BEACON_001".to_string());
    let broker = env::var("MQTT_BROKER").unwrap_or_else(|_| "broker.emqx.io".to_string());

    let config = match env::var("BEACON_DIALECT").as_deref() {
        Ok("free_text") => BeaconConfig::free_text(&beacon_id)?,
        _ => BeaconConfig::new(&beacon_id)?,
    };
    info!("beacon {} listening on {}", config.beacon_id(), config.command_topic());

    let transport = MqttConnector::new(MqttConfig::new(broker));
    let mut beacon = Beacon::new(
        config,
        transport,
        HostLink,
        MonotonicTime::new(),
        ConsoleBuzzer::default(),
        ThreadDelay,
    );

    beacon.start();
    loop {
        beacon.poll();
    }
}
