//! Environmental Safety Sensor Node
//!
//! ## Overview
//!
//! The sensor node samples a temperature/humidity sensor, an analog smoke
//! proxy and a PIR motion input every 15 seconds. Each sample is scored
//! against fixed thresholds to drive two LEDs and a buzzer, then pushed to the
//! cloud dashboard.
//!
//! ## Alert Rules
//!
//! ```text
//! heat   : temperature >= 30 °C       → red on, green off, 440 Hz / 500 ms
//! smoke  : smoke level >= 500 (raw)   → red on,            1000 Hz / 500 ms
//! motion : PIR low → high transition  →                    2000 Hz / 300 ms
//! normal : no heat                    → green on
//! ```
//!
//! Motion only chirps on the rising edge. A person standing still in front of
//! the sensor keeps the PIR high but does not retrigger the tone.
//!
//! A failed temperature read reports NaN. NaN never compares greater or equal
//! to the threshold, so a dead sensor shows green rather than a false alarm.

use heapless::Vec;
use log::{info, warn};

use crate::constants::{
    HEAT_ALERT_C, HEAT_TONE_HZ, HEAT_TONE_MS, MOTION_TONE_HZ, MOTION_TONE_MS,
    SENSOR_UPLOAD_INTERVAL_MS, SMOKE_ALERT_LEVEL, SMOKE_TONE_HZ, SMOKE_TONE_MS,
};
use crate::traits::{Delay, EnvironmentSensors, Indicators, Link, ReadingSink};

/// One sample from the sensor bank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    /// Air temperature, NaN when the sensor read failed
    pub temperature_c: f32,
    /// Relative humidity, NaN when the sensor read failed
    pub humidity_pct: f32,
    /// Raw smoke-proxy ADC level
    pub smoke_level: u16,
    /// PIR output level
    pub motion: bool,
}

/// Buzzer tone request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    /// Tone pitch
    pub frequency_hz: u16,
    /// Tone length
    pub duration_ms: u32,
}

impl Tone {
    /// Short high chirp for new motion
    pub const MOTION: Self = Self { frequency_hz: MOTION_TONE_HZ, duration_ms: MOTION_TONE_MS };
    /// Low tone for high temperature
    pub const HEAT: Self = Self { frequency_hz: HEAT_TONE_HZ, duration_ms: HEAT_TONE_MS };
    /// Mid tone for smoke
    pub const SMOKE: Self = Self { frequency_hz: SMOKE_TONE_HZ, duration_ms: SMOKE_TONE_MS };
}

/// Alert thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Heat alert at or above this temperature
    pub heat_alert_c: f32,
    /// Smoke alert at or above this raw level
    pub smoke_alert_level: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heat_alert_c: HEAT_ALERT_C,
            smoke_alert_level: SMOKE_ALERT_LEVEL,
        }
    }
}

/// Result of scoring one reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Temperature at or above threshold
    pub heat_alert: bool,
    /// Smoke level at or above threshold
    pub smoke_alert: bool,
    /// PIR went high since the last sample
    pub motion_started: bool,
    /// Red LED level
    pub red_led: bool,
    /// Green LED level
    pub green_led: bool,
    /// Tones to start, in order
    pub tones: Vec<Tone, 3>,
}

/// Scores readings and tracks the PIR edge
#[derive(Debug, Clone, Default)]
pub struct EnvironmentMonitor {
    thresholds: Thresholds,
    previous_motion: bool,
}

impl EnvironmentMonitor {
    /// Monitor with custom thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            previous_motion: false,
        }
    }

    /// Active thresholds
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Score a reading and remember its motion level for the next edge check
    pub fn assess(&mut self, reading: &EnvironmentReading) -> Assessment {
        let motion_started = reading.motion && !self.previous_motion;
        self.previous_motion = reading.motion;

        let heat_alert = reading.temperature_c >= self.thresholds.heat_alert_c;
        let smoke_alert = reading.smoke_level >= self.thresholds.smoke_alert_level;

        let mut tones = Vec::new();
        // Capacity 3 matches the three possible alerts
        if motion_started {
            let _ = tones.push(Tone::MOTION);
        }
        if heat_alert {
            let _ = tones.push(Tone::HEAT);
        }
        if smoke_alert {
            let _ = tones.push(Tone::SMOKE);
        }

        Assessment {
            heat_alert,
            smoke_alert,
            motion_started,
            red_led: heat_alert || smoke_alert,
            green_led: !heat_alert,
            tones,
        }
    }
}

/// Summary of one sensor-node cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Sample number, starting at 0
    pub sample: u32,
    /// Raw sample
    pub reading: EnvironmentReading,
    /// Alert decisions for the sample
    pub assessment: Assessment,
    /// True when the sink accepted the reading
    pub uploaded: bool,
}

/// Sensor-node control loop
pub struct SensorNode<S, I, K, L, D> {
    sensors: S,
    indicators: I,
    sink: K,
    link: L,
    delay: D,
    monitor: EnvironmentMonitor,
    upload_interval_ms: u32,
    samples: u32,
    failed_uploads: u32,
}

impl<S, I, K, L, D> SensorNode<S, I, K, L, D>
where
    S: EnvironmentSensors,
    I: Indicators,
    K: ReadingSink,
    L: Link,
    D: Delay,
{
    /// Node with default thresholds and a 15 s cadence
    pub fn new(sensors: S, indicators: I, sink: K, link: L, delay: D) -> Self {
        Self {
            sensors,
            indicators,
            sink,
            link,
            delay,
            monitor: EnvironmentMonitor::default(),
            upload_interval_ms: SENSOR_UPLOAD_INTERVAL_MS,
            samples: 0,
            failed_uploads: 0,
        }
    }

    /// Replace the alert thresholds
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.monitor = EnvironmentMonitor::new(thresholds);
        self
    }

    /// Set the pause after each cycle
    pub fn with_upload_interval_ms(mut self, ms: u32) -> Self {
        self.upload_interval_ms = ms;
        self
    }

    /// Associate with the network, polling until it comes up
    pub fn connect(&mut self, poll_interval_ms: u32) {
        self.link.begin();
        while !self.link.is_associated() {
            self.delay.delay_ms(poll_interval_ms);
        }
        info!("sensor node associated, rssi {}", self.link.signal_strength());
    }

    /// Read, alert, upload, then wait out the upload interval
    pub fn cycle(&mut self) -> CycleReport {
        let reading = self.sensors.read();
        let assessment = self.monitor.assess(&reading);

        info!(
            "sample {}: {:.2} C, {:.2} %, smoke {}, motion {}",
            self.samples, reading.temperature_c, reading.humidity_pct, reading.smoke_level, reading.motion
        );
        if assessment.motion_started {
            info!("motion detected");
        }
        if assessment.smoke_alert {
            warn!("high smoke level: {}", reading.smoke_level);
        }

        self.indicators.set_leds(assessment.red_led, assessment.green_led);
        for tone in &assessment.tones {
            self.indicators.tone(*tone);
        }

        let uploaded = if self.link.is_associated() {
            match self.sink.submit(&reading) {
                Ok(()) => true,
                Err(e) => {
                    self.failed_uploads = self.failed_uploads.saturating_add(1);
                    warn!("upload failed: {:?}", e);
                    false
                }
            }
        } else {
            false
        };

        let report = CycleReport {
            sample: self.samples,
            reading,
            assessment,
            uploaded,
        };

        self.samples = self.samples.wrapping_add(1);
        self.delay.delay_ms(self.upload_interval_ms);

        report
    }

    /// Cycles completed
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Uploads rejected by the sink
    pub fn failed_uploads(&self) -> u32 {
        self.failed_uploads
    }

    /// Borrow the LED and buzzer panel
    pub fn indicators(&self) -> &I {
        &self.indicators
    }

    /// Borrow the upload sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutably borrow the upload sink
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Borrow the delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }
}
