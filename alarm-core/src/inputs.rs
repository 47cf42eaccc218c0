//! Bank of debounced inputs sampled once per poll cycle.

use crate::debounce::{DebouncedInput, InputId};
use crate::time::Millis;

/// Raw pin levels captured at the start of a cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RawInputs {
    pub menu: bool,
    pub doors: [bool; 3],
}

/// Debounced view of one contact for the current cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InputReading {
    /// An idle-to-active edge was detected this cycle.
    pub activated: bool,
    /// The debounced level is currently active.
    pub active: bool,
}

impl InputReading {
    pub const fn new(activated: bool, active: bool) -> Self {
        Self { activated, active }
    }

    /// Edge this cycle or held active.
    pub const fn engaged(&self) -> bool {
        self.activated || self.active
    }
}

/// Door contact readings consumed by the alarm state machine.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DoorReadings {
    pub entry: InputReading,
    pub door2: InputReading,
    pub door3: InputReading,
}

/// Everything the debounced bank reports for a cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SensorReadings {
    pub menu: InputReading,
    pub doors: DoorReadings,
}

/// Menu button and door contacts, all idle low.
#[derive(Copy, Clone, Debug)]
pub struct InputBank {
    menu: DebouncedInput,
    entry: DebouncedInput,
    door2: DebouncedInput,
    door3: DebouncedInput,
}

impl InputBank {
    pub const fn new() -> Self {
        Self {
            menu: DebouncedInput::new(InputId::MenuButton, false),
            entry: DebouncedInput::new(InputId::EntryDoor, false),
            door2: DebouncedInput::new(InputId::Door2, false),
            door3: DebouncedInput::new(InputId::Door3, false),
        }
    }

    /// Samples every input; all four run each cycle regardless of alarm state.
    pub fn sample(&mut self, raw: RawInputs, now: Millis) -> SensorReadings {
        SensorReadings {
            menu: read(&mut self.menu, raw.menu, now),
            doors: DoorReadings {
                entry: read(&mut self.entry, raw.doors[0], now),
                door2: read(&mut self.door2, raw.doors[1], now),
                door3: read(&mut self.door3, raw.doors[2], now),
            },
        }
    }
}

impl Default for InputBank {
    fn default() -> Self {
        Self::new()
    }
}

fn read(input: &mut DebouncedInput, raw: bool, now: Millis) -> InputReading {
    let event = input.sample(raw, now);
    InputReading::new(event.is_activated(), input.is_active())
}
