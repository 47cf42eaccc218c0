//! 16x2 character display behind a PCF8574 I2C backpack.

use core::fmt::Write as _;

use alarm_core::dashboard::{CharacterDisplay, DisplayField};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Blocking;
use embassy_time::Delay;
use heapless::String;
use lcd_lcm1602_i2c::{Backlight, Lcd};

pub const DEFAULT_ADDRESS: u8 = 0x27;
pub const LCD_COLUMNS: u8 = 16;
const LCD_ROWS: u8 = 2;
const ROW_TEXT_CAPACITY: usize = 16;

pub type LcdBus = I2c<'static, Blocking>;

/// Dashboard renderer over the LCM1602 driver.
pub struct CharacterLcd {
    lcd: Lcd<'static, LcdBus, Delay>,
}

impl CharacterLcd {
    /// Runs the controller power-on sequence; fails when nothing answers at `address`.
    pub fn init(
        bus: &'static mut LcdBus,
        delay: &'static mut Delay,
        address: u8,
    ) -> Result<Self, i2c::Error> {
        let lcd = Lcd::new(bus, delay)
            .address(address)
            .cursor_on(false)
            .rows(LCD_ROWS)
            .init()?;
        Ok(Self { lcd })
    }
}

impl CharacterDisplay for CharacterLcd {
    type Error = i2c::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.lcd.clear()
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.lcd
            .backlight(if on { Backlight::On } else { Backlight::Off })
    }

    /// Writes the field and blanks the rest of the row so shorter values
    /// do not leave stale digits behind.
    fn write_field(&mut self, field: &DisplayField) -> Result<(), Self::Error> {
        let column = field.column.min(LCD_COLUMNS - 1);
        let width = usize::from(LCD_COLUMNS - column);

        let mut text: String<ROW_TEXT_CAPACITY> = String::new();
        // Overlong text is cut at the display edge.
        let _ = write!(text, "{}", field.content);
        while text.len() < width {
            let _ = text.push(' ');
        }
        let visible = text.get(..width).unwrap_or(text.as_str());

        self.lcd.set_cursor(field.row, column)?;
        self.lcd.write_str(visible)
    }
}
