//! Battery voltage and current sampling through ADC1.

use alarm_core::sensors::{AnalogChannel, AnalogFrontEnd};
use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::peripherals::ADC1;

/// Embassy ADC wrapper for the three battery channels.
pub struct BatteryAdc<'d> {
    adc: Adc<'d, ADC1>,
    main_voltage: AnyAdcChannel<ADC1>,
    aux_voltage: AnyAdcChannel<ADC1>,
    aux_current: AnyAdcChannel<ADC1>,
    discard_next: bool,
}

impl<'d> BatteryAdc<'d> {
    /// Configures a 10-bit conversion so readings share the default scale.
    pub fn new(
        mut adc: Adc<'d, ADC1>,
        main_voltage: AnyAdcChannel<ADC1>,
        aux_voltage: AnyAdcChannel<ADC1>,
        aux_current: AnyAdcChannel<ADC1>,
    ) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        adc.set_resolution(Resolution::BITS10);
        Self {
            adc,
            main_voltage,
            aux_voltage,
            aux_current,
            discard_next: true,
        }
    }
}

impl AnalogFrontEnd for BatteryAdc<'_> {
    fn read_raw(&mut self, channel: AnalogChannel) -> Option<u16> {
        if self.discard_next {
            let _ = self.adc.blocking_read(&mut self.main_voltage);
            self.discard_next = false;
        }

        let pin = match channel {
            AnalogChannel::MainBatteryVoltage => &mut self.main_voltage,
            AnalogChannel::AuxBatteryVoltage => &mut self.aux_voltage,
            AnalogChannel::AuxBatteryCurrent => &mut self.aux_current,
        };
        Some(self.adc.blocking_read(pin))
    }
}
