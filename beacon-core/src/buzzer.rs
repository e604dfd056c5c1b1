//! Buzzer beep patterns
//!
//! Fixed on/off patterns played on demand. Playback blocks the loop for the
//! whole pattern and always leaves the pin low.

use log::warn;

use crate::traits::{Buzzer, Delay};

/// Repeated on/off beep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    /// Number of beeps
    pub repeats: u8,
    /// Time the pin is held high per beep
    pub on_ms: u32,
    /// Pause after each beep
    pub off_ms: u32,
}

impl BeepPattern {
    /// Five short chirps to find the device by ear
    pub const LOCATE: Self = Self { repeats: 5, on_ms: 100, off_ms: 100 };

    /// Three long beeps to confirm the buzzer works
    pub const SELF_TEST: Self = Self { repeats: 3, on_ms: 500, off_ms: 200 };

    /// Total blocking time
    pub const fn duration_ms(&self) -> u32 {
        self.repeats as u32 * (self.on_ms + self.off_ms)
    }
}

/// Play a pattern to completion
pub fn play<B: Buzzer, D: Delay>(buzzer: &mut B, delay: &mut D, pattern: BeepPattern) {
    for _ in 0..pattern.repeats {
        drive(buzzer, true);
        delay.delay_ms(pattern.on_ms);
        drive(buzzer, false);
        delay.delay_ms(pattern.off_ms);
    }
}

/// Set the pin level, logging driver failures
pub(crate) fn drive<B: Buzzer>(buzzer: &mut B, on: bool) {
    if let Err(e) = buzzer.set_level(on) {
        warn!("buzzer pin write failed: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        levels: Vec<bool>,
        delays: Vec<u32>,
    }

    impl Buzzer for Recorder {
        type Error = core::convert::Infallible;

        fn set_level(&mut self, on: bool) -> Result<(), Self::Error> {
            self.levels.push(on);
            Ok(())
        }
    }

    struct Delays(Vec<u32>);

    impl Delay for Delays {
        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn locate_pattern_timing() {
        let mut buzzer = Recorder::default();
        let mut delay = Delays(Vec::new());

        play(&mut buzzer, &mut delay, BeepPattern::LOCATE);

        assert_eq!(buzzer.levels.len(), 10);
        assert_eq!(buzzer.levels.last(), Some(&false));
        assert_eq!(delay.0, [100; 10]);
        assert_eq!(BeepPattern::LOCATE.duration_ms(), 1000);
    }

    #[test]
    fn self_test_pattern_timing() {
        let mut buzzer = Recorder::default();
        let mut delay = Delays(Vec::new());

        play(&mut buzzer, &mut delay, BeepPattern::SELF_TEST);

        assert_eq!(buzzer.levels, [true, false, true, false, true, false]);
        assert_eq!(delay.0, [500, 200, 500, 200, 500, 200]);
        assert_eq!(BeepPattern::SELF_TEST.duration_ms(), 2100);
    }

    #[test]
    fn pin_errors_do_not_abort_pattern() {
        struct Broken(u32);

        impl Buzzer for Broken {
            type Error = &'static str;

            fn set_level(&mut self, _on: bool) -> Result<(), Self::Error> {
                self.0 += 1;
                Err("gpio fault")
            }
        }

        let mut buzzer = Broken(0);
        let mut delay = Delays(Vec::new());
        play(&mut buzzer, &mut delay, BeepPattern::LOCATE);

        assert_eq!(buzzer.0, 10);
    }
}
