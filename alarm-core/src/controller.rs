//! One poll cycle of the whole controller.
//!
//! The controller owns every piece of per-cycle state and is fed a snapshot of
//! the outside world. Firmware and emulator differ only in where that snapshot
//! comes from and what they do with the outputs.

use crate::alarm::{AlarmMachine, AlarmPhase};
use crate::charger::ChargeController;
use crate::config::{AlarmConfig, ConfigError};
use crate::dashboard::{Dashboard, DisplayIntent};
use crate::inputs::{InputBank, RawInputs, SensorReadings};
use crate::passphrase::{FACTORY_PASSPHRASE, Passphrase};
use crate::sensors::Readings;
use crate::telemetry::TickEvents;
use crate::time::Millis;

/// Snapshot of the outside world for one cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickInputs {
    pub now: Millis,
    pub raw: RawInputs,
    /// Encoder position, when the board has one.
    pub encoder: Option<i16>,
    /// At most one keypad character per cycle.
    pub key: Option<char>,
    pub readings: Readings,
}

/// Everything the caller should apply after a cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutputs {
    pub relay: bool,
    pub indicator: bool,
    pub charge_relay: bool,
    pub phase: AlarmPhase,
    pub display: Option<DisplayIntent>,
    pub events: TickEvents,
}

/// Alarm, dashboard and charger driven from one debounced input bank.
#[derive(Clone, Debug)]
pub struct Controller<const N: usize> {
    inputs: InputBank,
    alarm: AlarmMachine<N>,
    dashboard: Dashboard,
    charger: ChargeController,
    last_inputs: SensorReadings,
}

impl Controller<4> {
    pub fn with_defaults() -> Self {
        Self::new(AlarmConfig::DEFAULT, FACTORY_PASSPHRASE)
    }
}

impl<const N: usize> Controller<N> {
    pub fn new(config: AlarmConfig, passphrase: Passphrase<N>) -> Self {
        Self::from_parts(AlarmMachine::new(config, passphrase), Dashboard::new())
    }

    pub fn try_new(config: AlarmConfig, passphrase: Passphrase<N>) -> Result<Self, ConfigError> {
        let alarm = AlarmMachine::try_new(config, passphrase)?;
        Ok(Self::from_parts(alarm, Dashboard::new()))
    }

    pub fn from_parts(alarm: AlarmMachine<N>, dashboard: Dashboard) -> Self {
        Self {
            inputs: InputBank::new(),
            alarm,
            dashboard,
            charger: ChargeController::default(),
            last_inputs: SensorReadings::default(),
        }
    }

    pub const fn alarm(&self) -> &AlarmMachine<N> {
        &self.alarm
    }

    pub const fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub const fn charger(&self) -> &ChargeController {
        &self.charger
    }

    /// Debounced input state from the most recent cycle.
    pub const fn last_inputs(&self) -> &SensorReadings {
        &self.last_inputs
    }

    /// Runs one cycle: inputs, alarm, dashboard, then charger.
    pub fn tick(&mut self, inputs: &TickInputs) -> TickOutputs {
        let mut events = TickEvents::new();

        let sensed = self.inputs.sample(inputs.raw, inputs.now);
        self.last_inputs = sensed;

        let alarm = self
            .alarm
            .tick(inputs.now, &sensed.doors, inputs.key, &mut events);
        let display = self.dashboard.update(
            inputs.now,
            sensed.menu.activated,
            inputs.encoder,
            &inputs.readings,
        );
        let charge_relay = self.charger.update(inputs.now, inputs.readings.battery1_v);

        TickOutputs {
            relay: alarm.relay,
            indicator: alarm.indicator,
            charge_relay,
            phase: alarm.phase,
            display,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::AlarmEvent;

    #[test]
    fn first_tick_draws_screen_and_stays_disarmed() {
        let mut controller = Controller::with_defaults();
        let outputs = controller.tick(&TickInputs::default());
        assert_eq!(outputs.phase, AlarmPhase::Normal);
        assert!(!outputs.relay);
        assert!(!outputs.charge_relay);
        assert!(outputs.display.is_some());
        assert!(outputs.events.is_empty());
    }

    #[test]
    fn arming_key_reaches_alarm_machine() {
        let mut controller = Controller::with_defaults();
        let outputs = controller.tick(&TickInputs {
            now: Millis::new(10),
            key: Some('#'),
            ..TickInputs::default()
        });
        assert_eq!(outputs.events.as_slice(), &[AlarmEvent::CountdownStarted]);
        assert!(controller.alarm().countdown_active());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AlarmConfig::DEFAULT;
        config.arming_key = '*';
        assert_eq!(
            Controller::try_new(config, FACTORY_PASSPHRASE).err(),
            Some(ConfigError::KeyCollision('*'))
        );
    }
}
