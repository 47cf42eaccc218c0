//! Paged status screen on the 16x2 character display.
//!
//! The menu button wakes the backlight, and once the screen is lit each further
//! click moves to the next page. Turning the encoder selects a page directly.
//! The dashboard only describes what should be shown; a [`CharacterDisplay`]
//! implementation turns a [`DisplayIntent`] into bus traffic.

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::config::BACKLIGHT_TIMEOUT;
use crate::sensors::Readings;
use crate::time::Millis;

/// Column where values start; labels sit at column 0.
pub const VALUE_COLUMN: u8 = 12;

/// Most fields a single page writes.
pub const MAX_FIELDS: usize = 4;

/// Pages shown on the display, in menu order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuPage {
    Climate,
    MainBattery,
    AuxBattery,
}

impl MenuPage {
    pub const COUNT: i16 = 3;

    /// Maps any encoder position onto a page, wrapping in both directions.
    pub const fn from_index(index: i16) -> Self {
        match index.rem_euclid(Self::COUNT) {
            0 => MenuPage::Climate,
            1 => MenuPage::MainBattery,
            _ => MenuPage::AuxBattery,
        }
    }

    pub const fn index(self) -> i16 {
        match self {
            MenuPage::Climate => 0,
            MenuPage::MainBattery => 1,
            MenuPage::AuxBattery => 2,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub const fn label(self) -> &'static str {
        match self {
            MenuPage::Climate => "climate",
            MenuPage::MainBattery => "battery1",
            MenuPage::AuxBattery => "battery2",
        }
    }
}

/// What a field shows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldContent {
    Label(&'static str),
    Number { value: f32, decimals: u8 },
    /// The reading is unavailable.
    Missing,
}

impl fmt::Display for FieldContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldContent::Label(text) => f.write_str(text),
            FieldContent::Number { value, decimals } => {
                write!(f, "{value:.prec$}", prec = usize::from(*decimals))
            }
            FieldContent::Missing => f.write_str("--"),
        }
    }
}

/// Text placed at a fixed cursor position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DisplayField {
    pub row: u8,
    pub column: u8,
    pub content: FieldContent,
}

impl DisplayField {
    pub const fn label(row: u8, text: &'static str) -> Self {
        Self {
            row,
            column: 0,
            content: FieldContent::Label(text),
        }
    }

    pub fn value(row: u8, reading: Option<f32>, decimals: u8) -> Self {
        let content = match reading {
            Some(value) => FieldContent::Number { value, decimals },
            None => FieldContent::Missing,
        };
        Self {
            row,
            column: VALUE_COLUMN,
            content,
        }
    }
}

/// Complete description of a screen refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayIntent {
    /// Wipe the screen before writing; set when the page changed.
    pub clear: bool,
    pub backlight: bool,
    pub page: MenuPage,
    pub fields: Vec<DisplayField, MAX_FIELDS>,
}

/// Character display driver.
pub trait CharacterDisplay {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error>;

    fn write_field(&mut self, field: &DisplayField) -> Result<(), Self::Error>;

    /// Applies an intent in order: backlight, optional clear, then fields.
    fn render(&mut self, intent: &DisplayIntent) -> Result<(), Self::Error> {
        self.set_backlight(intent.backlight)?;
        if intent.clear {
            self.clear()?;
        }
        for field in &intent.fields {
            self.write_field(field)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Shown {
    page: MenuPage,
    backlight: bool,
    readings: Readings,
}

/// Page selection and backlight timing.
#[derive(Clone, Debug)]
pub struct Dashboard {
    page: MenuPage,
    backlight: bool,
    timeout: Duration,
    last_activity: Option<Millis>,
    last_encoder: Option<i16>,
    shown: Option<Shown>,
}

impl Dashboard {
    pub const fn new() -> Self {
        Self::with_timeout(BACKLIGHT_TIMEOUT)
    }

    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            page: MenuPage::Climate,
            backlight: true,
            timeout,
            last_activity: None,
            last_encoder: None,
            shown: None,
        }
    }

    pub const fn page(&self) -> MenuPage {
        self.page
    }

    pub const fn backlight(&self) -> bool {
        self.backlight
    }

    /// Runs one cycle; returns an intent only when the screen must change.
    pub fn update(
        &mut self,
        now: Millis,
        clicked: bool,
        encoder: Option<i16>,
        readings: &Readings,
    ) -> Option<DisplayIntent> {
        let last_activity = *self.last_activity.get_or_insert(now);

        if clicked {
            if self.backlight {
                self.page = self.page.next();
            }
            self.wake(now);
        } else if let Some(position) = encoder
            && self.last_encoder != Some(position)
        {
            self.last_encoder = Some(position);
            self.page = MenuPage::from_index(position);
            self.wake(now);
        } else if self.backlight && now.has_elapsed(last_activity, self.timeout) {
            self.backlight = false;
        }

        let next = Shown {
            page: self.page,
            backlight: self.backlight,
            readings: *readings,
        };
        if self.shown == Some(next) {
            return None;
        }

        let clear = self.shown.is_none_or(|shown| shown.page != next.page);
        self.shown = Some(next);
        Some(DisplayIntent {
            clear,
            backlight: self.backlight,
            page: self.page,
            fields: page_fields(self.page, readings),
        })
    }

    fn wake(&mut self, now: Millis) {
        self.backlight = true;
        self.last_activity = Some(now);
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

fn page_fields(page: MenuPage, readings: &Readings) -> Vec<DisplayField, MAX_FIELDS> {
    let mut fields = Vec::new();
    let mut row = |row: u8, label: &'static str, reading: Option<f32>, decimals: u8| {
        let _ = fields.push(DisplayField::label(row, label));
        let _ = fields.push(DisplayField::value(row, reading, decimals));
    };
    match page {
        MenuPage::Climate => row(0, "Temp [C]", readings.temperature_c, 1),
        MenuPage::MainBattery => row(0, "BAT 1 [U]", readings.battery1_v, 2),
        MenuPage::AuxBattery => {
            row(0, "BAT 2 [U]", readings.battery2_v, 2);
            row(1, "BAT 2 [I]", readings.battery2_a, 2);
        }
    }
    fields
}
