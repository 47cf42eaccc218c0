//! Board wiring for the camper alarm controller.
//!
//! | Signal          | Pin       | Notes                         |
//! |-----------------|-----------|-------------------------------|
//! | Menu button     | PA0       | active high, pulled down      |
//! | Entry door      | PA1       | active high, pulled down      |
//! | Door 2 / 3      | PA9 / PA10| active high, pulled down      |
//! | Battery 1 / 2 U | PA2 / PA3 | ADC, divided to 5 V full scale|
//! | Battery 2 I     | PA4       | ADC, shunt amplifier          |
//! | 1-Wire sensor   | PA5       | open drain                    |
//! | Encoder A / B   | PA6 / PA7 | EXTI, pulled up               |
//! | Siren relay     | PA8       |                               |
//! | Indicator LED   | PA15      |                               |
//! | Charge relay    | PB7       |                               |
//! | Keypad rows     | PB0..PB3  | driven low one at a time      |
//! | Keypad columns  | PB4..PB6  | pulled up                     |
//! | LCD backpack    | PB8 / PB9 | I2C1 SCL / SDA                |

pub mod analog;
pub mod keypad;
pub mod lcd;
pub mod onewire;

use alarm_core::controller::TickOutputs;
use alarm_core::inputs::RawInputs;
use embassy_stm32::gpio::{Input, Level, Output};

/// Contact inputs sampled at the start of every cycle.
pub struct Contacts<'d> {
    menu: Input<'d>,
    doors: [Input<'d>; 3],
}

impl<'d> Contacts<'d> {
    pub fn new(menu: Input<'d>, doors: [Input<'d>; 3]) -> Self {
        Self { menu, doors }
    }

    pub fn read_raw(&self) -> RawInputs {
        RawInputs {
            menu: self.menu.is_high(),
            doors: [
                self.doors[0].is_high(),
                self.doors[1].is_high(),
                self.doors[2].is_high(),
            ],
        }
    }
}

/// Relay and LED outputs.
pub struct Outputs<'d> {
    siren: Output<'d>,
    indicator: Output<'d>,
    charge: Output<'d>,
}

impl<'d> Outputs<'d> {
    pub fn new(siren: Output<'d>, indicator: Output<'d>, charge: Output<'d>) -> Self {
        Self {
            siren,
            indicator,
            charge,
        }
    }

    pub fn apply(&mut self, outputs: &TickOutputs) {
        self.siren.set_level(Level::from(outputs.relay));
        self.indicator.set_level(Level::from(outputs.indicator));
        self.charge.set_level(Level::from(outputs.charge_relay));
    }

    /// Drives everything inactive.
    pub fn release_all(&mut self) {
        self.siren.set_low();
        self.indicator.set_low();
        self.charge.set_low();
    }
}
