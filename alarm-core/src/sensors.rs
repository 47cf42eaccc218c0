//! Environment and battery readings refreshed on their own schedules.
//!
//! The 1-Wire temperature sensor is slow, so it is read every
//! [`TEMPERATURE_REFRESH`]; the analog channels are cheap and follow
//! [`ANALOG_REFRESH`]. A reading that cannot be taken is stored as `None` and
//! rendered as missing rather than stale.

use crate::config::{ANALOG_REFRESH, TEMPERATURE_REFRESH};
use crate::time::{Interval, Millis};

/// Latest environment and battery values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Readings {
    pub temperature_c: Option<f32>,
    pub battery1_v: Option<f32>,
    pub battery2_v: Option<f32>,
    pub battery2_a: Option<f32>,
}

/// Analog inputs sampled by the front end.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnalogChannel {
    MainBatteryVoltage,
    AuxBatteryVoltage,
    AuxBatteryCurrent,
}

impl AnalogChannel {
    pub const ALL: [AnalogChannel; 3] = [
        AnalogChannel::MainBatteryVoltage,
        AnalogChannel::AuxBatteryVoltage,
        AnalogChannel::AuxBatteryCurrent,
    ];
}

/// Linear conversion from ADC counts to engineering units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnalogScale {
    reference: f32,
    full_scale: f32,
}

impl AnalogScale {
    /// 10-bit converter against a 5 V reference.
    pub const DEFAULT: Self = Self::new(5.0, 1024.0);

    pub const fn new(reference: f32, full_scale: f32) -> Self {
        Self {
            reference,
            full_scale,
        }
    }

    pub fn volts(&self, raw: u16) -> f32 {
        f32::from(raw) * self.reference / self.full_scale
    }
}

impl Default for AnalogScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Source of temperature readings.
pub trait TemperatureSensor {
    /// Returns `None` when no sensor answered.
    fn read_celsius(&mut self) -> Option<f32>;
}

/// Source of raw analog samples.
pub trait AnalogFrontEnd {
    fn read_raw(&mut self, channel: AnalogChannel) -> Option<u16>;
}

/// Stand-in for boards built without a temperature sensor.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTemperatureSensor;

impl TemperatureSensor for NoopTemperatureSensor {
    fn read_celsius(&mut self) -> Option<f32> {
        None
    }
}

/// Refresh cadence for every sensor source.
#[derive(Copy, Clone, Debug)]
pub struct SensorSchedule {
    temperature: Interval,
    analog: Interval,
    scale: AnalogScale,
    current_scale: AnalogScale,
}

impl SensorSchedule {
    pub const fn new(scale: AnalogScale, current_scale: AnalogScale) -> Self {
        Self {
            temperature: Interval::new(TEMPERATURE_REFRESH),
            analog: Interval::new(ANALOG_REFRESH),
            scale,
            current_scale,
        }
    }

    /// Refreshes whatever is due; returns `true` when `readings` changed.
    pub fn refresh<A, P>(
        &mut self,
        now: Millis,
        readings: &mut Readings,
        analog: &mut A,
        sensor: &mut P,
    ) -> bool
    where
        A: AnalogFrontEnd + ?Sized,
        P: TemperatureSensor + ?Sized,
    {
        let before = *readings;

        if self.temperature.poll(now) {
            readings.temperature_c = sensor.read_celsius();
        }

        if self.analog.poll(now) {
            for channel in AnalogChannel::ALL {
                let scale = match channel {
                    AnalogChannel::AuxBatteryCurrent => self.current_scale,
                    _ => self.scale,
                };
                let value = analog.read_raw(channel).map(|raw| scale.volts(raw));
                match channel {
                    AnalogChannel::MainBatteryVoltage => readings.battery1_v = value,
                    AnalogChannel::AuxBatteryVoltage => readings.battery2_v = value,
                    AnalogChannel::AuxBatteryCurrent => readings.battery2_a = value,
                }
            }
        }

        *readings != before
    }
}

impl Default for SensorSchedule {
    fn default() -> Self {
        Self::new(AnalogScale::DEFAULT, AnalogScale::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAnalog {
        raw: u16,
        reads: usize,
    }

    impl AnalogFrontEnd for FixedAnalog {
        fn read_raw(&mut self, channel: AnalogChannel) -> Option<u16> {
            self.reads += 1;
            match channel {
                AnalogChannel::AuxBatteryCurrent => None,
                _ => Some(self.raw),
            }
        }
    }

    struct CountingSensor(usize);

    impl TemperatureSensor for CountingSensor {
        fn read_celsius(&mut self) -> Option<f32> {
            self.0 += 1;
            Some(21.5)
        }
    }

    #[test]
    fn default_scale_maps_full_range_to_five_volts() {
        let scale = AnalogScale::default();
        assert!((scale.volts(0) - 0.0).abs() < f32::EPSILON);
        assert!((scale.volts(512) - 2.5).abs() < 1e-6);
        assert!((scale.volts(1024) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn refresh_follows_independent_cadences() {
        let mut schedule = SensorSchedule::default();
        let mut readings = Readings::default();
        let mut analog = FixedAnalog { raw: 1000, reads: 0 };
        let mut sensor = CountingSensor(0);

        assert!(schedule.refresh(Millis::new(0), &mut readings, &mut analog, &mut sensor));
        assert_eq!(sensor.0, 1);
        assert_eq!(analog.reads, 3);
        assert!(readings.temperature_c.is_some_and(|c| (c - 21.5).abs() < 1e-6));
        assert!(readings.battery1_v.is_some());
        assert_eq!(readings.battery2_a, None);

        assert!(!schedule.refresh(Millis::new(50), &mut readings, &mut analog, &mut sensor));
        assert_eq!(analog.reads, 3);

        analog.raw = 900;
        assert!(schedule.refresh(Millis::new(100), &mut readings, &mut analog, &mut sensor));
        assert_eq!(analog.reads, 6);
        assert_eq!(sensor.0, 1);

        schedule.refresh(Millis::new(15_000), &mut readings, &mut analog, &mut sensor);
        assert_eq!(sensor.0, 2);
    }

    #[test]
    fn missing_sensor_reports_none() {
        let mut schedule = SensorSchedule::default();
        let mut readings = Readings {
            temperature_c: Some(3.0),
            ..Readings::default()
        };
        let mut analog = FixedAnalog { raw: 0, reads: 0 };
        schedule.refresh(
            Millis::new(0),
            &mut readings,
            &mut analog,
            &mut NoopTemperatureSensor,
        );
        assert_eq!(readings.temperature_c, None);
    }
}
