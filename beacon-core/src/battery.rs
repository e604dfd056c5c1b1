//! Battery level sources
//!
//! The current hardware has no fuel gauge. [`SyntheticBattery`] stands in with
//! a uniformly sampled value so dashboards have a plausible number to render.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::constants::{SYNTHETIC_BATTERY_MAX_PCT, SYNTHETIC_BATTERY_MIN_PCT};
use crate::traits::BatteryGauge;

/// Placeholder gauge sampling uniformly in [80, 100]
#[derive(Debug, Clone)]
pub struct SyntheticBattery {
    rng: SmallRng,
}

impl SyntheticBattery {
    /// Deterministic sequence from `seed`
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }
}

impl Default for SyntheticBattery {
    fn default() -> Self {
        Self::new(0x00be_ac01)
    }
}

impl BatteryGauge for SyntheticBattery {
    fn percent(&mut self) -> u8 {
        self.rng.gen_range(SYNTHETIC_BATTERY_MIN_PCT..=SYNTHETIC_BATTERY_MAX_PCT)
    }
}

/// Constant reading, for devices on mains power and for tests
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery(pub u8);

impl BatteryGauge for FixedBattery {
    fn percent(&mut self) -> u8 {
        self.0
    }
}
