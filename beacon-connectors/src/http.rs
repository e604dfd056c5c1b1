//! ThingSpeak HTTP uploader for the sensor node
//!
//! Each reading becomes one GET against the channel update endpoint:
//!
//! ```text
//! http://api.thingspeak.com/update?api_key=KEY&field1=23.50&field2=41.00&field3=312&field4=0
//! ```
//!
//! | Field    | Value                         |
//! |----------|-------------------------------|
//! | `field1` | temperature, °C, 2 decimals   |
//! | `field2` | relative humidity, 2 decimals |
//! | `field3` | raw smoke level               |
//! | `field4` | motion, `0` or `1`            |
//!
//! A failed DHT read shows up as `nan`. Any HTTP response counts as delivered,
//! including error statuses and ThingSpeak's `0` body for rate-limited
//! updates. Only transport failures are reported as errors.

use std::fmt::Write as _;
use std::time::Duration;

use beacon_core::environment::EnvironmentReading;
use beacon_core::traits::ReadingSink;
use log::{debug, warn};
use thiserror::Error;

use crate::ConnectionStats;

/// Default channel update endpoint
pub const THINGSPEAK_UPDATE_URL: &str = "http://api.thingspeak.com/update";

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// ThingSpeak channel settings
#[derive(Debug, Clone)]
pub struct ThingSpeakConfig {
    /// Update endpoint, without query
    pub url: String,
    /// Channel write key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl ThingSpeakConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            url: THINGSPEAK_UPDATE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            user_agent: format!("beacon-sensor/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Full update URL for one reading
    pub fn update_url(&self, reading: &EnvironmentReading) -> String {
        let mut url = String::with_capacity(self.url.len() + self.api_key.len() + 64);
        url.push_str(&self.url);
        // Writing to a String cannot fail
        let _ = write!(
            url,
            "?api_key={}&field1={}&field2={}&field3={}&field4={}",
            self.api_key,
            decimal(reading.temperature_c),
            decimal(reading.humidity_pct),
            reading.smoke_level,
            u8::from(reading.motion),
        );
        url
    }
}

fn decimal(value: f32) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// Uploads sensor readings to a ThingSpeak channel
pub struct ThingSpeakUploader {
    config: ThingSpeakConfig,
    agent: ureq::Agent,
    stats: ConnectionStats,
    last_status: Option<u16>,
}

impl ThingSpeakUploader {
    pub fn new(config: ThingSpeakConfig) -> Result<Self, HttpError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(HttpError::Config("URL must start with http:// or https://".into()));
        }
        if config.api_key.is_empty() {
            return Err(HttpError::Config("API key is empty".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: ConnectionStats::default(),
            last_status: None,
        })
    }

    pub fn config(&self) -> &ThingSpeakConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Status code of the most recent response
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }
}

impl ReadingSink for ThingSpeakUploader {
    type Error = HttpError;

    fn submit(&mut self, reading: &EnvironmentReading) -> Result<(), Self::Error> {
        let url = self.config.update_url(reading);

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                warn!("thingspeak answered {}", code);
                response
            }
            Err(ureq::Error::Transport(e)) => {
                let error = HttpError::Request(e.to_string());
                self.stats.record_failure(&error);
                return Err(error);
            }
        };

        let status = response.status();
        let entry = response.into_string().unwrap_or_default();
        if entry.trim() == "0" {
            warn!("thingspeak rejected update (rate limited)");
        } else {
            debug!("thingspeak entry {}", entry.trim());
        }

        self.last_status = Some(status);
        self.stats.record_sent(url.len());
        Ok(())
    }
}
