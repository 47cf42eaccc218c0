//! Charge relay for the auxiliary battery.
//!
//! The relay closes once the main battery has stayed above the threshold for
//! the charge delay, and opens as soon as it drops back below.

use core::time::Duration;

use crate::config::{CHARGE_DELAY, CHARGE_THRESHOLD_VOLTS};
use crate::time::Millis;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChargeController {
    threshold: f32,
    delay: Duration,
    pending_since: Option<Millis>,
    relay: bool,
}

impl ChargeController {
    pub const fn new(threshold: f32, delay: Duration) -> Self {
        Self {
            threshold,
            delay,
            pending_since: None,
            relay: false,
        }
    }

    pub const fn relay(&self) -> bool {
        self.relay
    }

    pub const fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Updates the relay from the latest main battery voltage.
    ///
    /// A missing reading leaves the relay and timer untouched. A reading
    /// exactly at the threshold neither starts nor cancels the delay, but a
    /// delay already running may still close the relay.
    pub fn update(&mut self, now: Millis, battery1: Option<f32>) -> bool {
        let Some(volts) = battery1 else {
            return self.relay;
        };

        if volts < self.threshold {
            self.pending_since = None;
            self.relay = false;
            return false;
        }

        if volts > self.threshold && self.pending_since.is_none() {
            self.pending_since = Some(now);
        }
        if let Some(since) = self.pending_since
            && now.has_elapsed(since, self.delay)
        {
            self.relay = true;
        }

        self.relay
    }
}

impl Default for ChargeController {
    fn default() -> Self {
        Self::new(CHARGE_THRESHOLD_VOLTS, CHARGE_DELAY)
    }
}
