//! Bit-banged 1-Wire bus with a single DS18B20 temperature sensor.
//!
//! Conversions take up to 750 ms, so each read returns the result of the
//! conversion started by the previous read and then starts a new one. The
//! first read after boot therefore reports nothing.

use alarm_core::sensors::TemperatureSensor;
use embassy_stm32::gpio::OutputOpenDrain;
use embassy_time::{Duration, block_for};

const SKIP_ROM: u8 = 0xCC;
const CONVERT_T: u8 = 0x44;
const READ_SCRATCHPAD: u8 = 0xBE;
const SCRATCHPAD_LEN: usize = 9;

const fn micros(value: u64) -> Duration {
    Duration::from_micros(value)
}

pub struct Ds18b20<'d> {
    pin: OutputOpenDrain<'d>,
    converting: bool,
}

impl<'d> Ds18b20<'d> {
    /// `pin` must idle high through an external pull-up.
    pub fn new(pin: OutputOpenDrain<'d>) -> Self {
        Self {
            pin,
            converting: false,
        }
    }

    /// Issues a reset pulse; returns `true` when a device answered.
    fn reset(&mut self) -> bool {
        critical_section::with(|_| {
            self.pin.set_low();
            block_for(micros(480));
            self.pin.set_high();
            block_for(micros(70));
            let present = self.pin.is_low();
            block_for(micros(410));
            present
        })
    }

    fn write_bit(&mut self, bit: bool) {
        critical_section::with(|_| {
            self.pin.set_low();
            if bit {
                block_for(micros(6));
                self.pin.set_high();
                block_for(micros(64));
            } else {
                block_for(micros(60));
                self.pin.set_high();
                block_for(micros(10));
            }
        });
    }

    fn read_bit(&mut self) -> bool {
        critical_section::with(|_| {
            self.pin.set_low();
            block_for(micros(6));
            self.pin.set_high();
            block_for(micros(9));
            let bit = self.pin.is_high();
            block_for(micros(55));
            bit
        })
    }

    fn write_byte(&mut self, byte: u8) {
        for shift in 0..8 {
            self.write_bit((byte >> shift) & 1 == 1);
        }
    }

    fn read_byte(&mut self) -> u8 {
        (0..8).fold(0u8, |byte, shift| {
            if self.read_bit() {
                byte | (1 << shift)
            } else {
                byte
            }
        })
    }

    fn start_conversion(&mut self) -> bool {
        if !self.reset() {
            return false;
        }
        self.write_byte(SKIP_ROM);
        self.write_byte(CONVERT_T);
        true
    }

    /// Raw temperature in 1/16 °C steps.
    fn read_scratchpad(&mut self) -> Option<i16> {
        if !self.reset() {
            return None;
        }
        self.write_byte(SKIP_ROM);
        self.write_byte(READ_SCRATCHPAD);

        let mut data = [0u8; SCRATCHPAD_LEN];
        for byte in &mut data {
            *byte = self.read_byte();
        }
        if crc8(&data[..SCRATCHPAD_LEN - 1]) != data[SCRATCHPAD_LEN - 1] {
            return None;
        }
        Some(i16::from_le_bytes([data[0], data[1]]))
    }
}

impl TemperatureSensor for Ds18b20<'_> {
    fn read_celsius(&mut self) -> Option<f32> {
        let reading = if self.converting {
            self.read_scratchpad().map(|raw| f32::from(raw) / 16.0)
        } else {
            None
        };
        self.converting = self.start_conversion();
        reading
    }
}

/// Dallas/Maxim CRC-8 (polynomial 0x31, reflected).
fn crc8(bytes: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in bytes {
        let mut data = byte;
        for _ in 0..8 {
            let mix = (crc ^ data) & 1;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            data >>= 1;
        }
    }
    crc
}
