//! Blinking indicator LED.

use core::time::Duration;

use crate::time::Millis;

/// Indicator output with its own toggle clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Indicator {
    lit: bool,
    toggled_at: Millis,
}

impl Indicator {
    pub const fn new() -> Self {
        Self {
            lit: false,
            toggled_at: Millis::ZERO,
        }
    }

    pub const fn is_lit(&self) -> bool {
        self.lit
    }

    /// Toggles the LED whenever `period` has passed since the last toggle.
    pub fn blink(&mut self, now: Millis, period: Duration) {
        if now.has_elapsed(self.toggled_at, period) {
            self.lit = !self.lit;
            self.toggled_at = now;
        }
    }

    /// Forces the LED off without touching the toggle clock.
    pub fn off(&mut self) {
        self.lit = false;
    }
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_once_per_period() {
        let period = Duration::from_millis(500);
        let mut indicator = Indicator::new();

        indicator.blink(Millis::new(500), period);
        assert!(indicator.is_lit());
        indicator.blink(Millis::new(999), period);
        assert!(indicator.is_lit());
        indicator.blink(Millis::new(1_000), period);
        assert!(!indicator.is_lit());
    }

    #[test]
    fn off_keeps_toggle_clock() {
        let period = Duration::from_millis(150);
        let mut indicator = Indicator::new();
        indicator.blink(Millis::new(150), period);
        indicator.off();
        assert!(!indicator.is_lit());
        indicator.blink(Millis::new(200), period);
        assert!(!indicator.is_lit());
        indicator.blink(Millis::new(300), period);
        assert!(indicator.is_lit());
    }
}
