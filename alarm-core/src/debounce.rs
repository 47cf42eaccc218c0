//! Time-window debouncing for contact inputs.
//!
//! A raw level is trusted once it has held unchanged for longer than the
//! debounce window. Only idle-to-active transitions are reported as events;
//! callers that care about the current level use [`DebouncedInput::is_active`].
//!
//! Every input keeps its own transition timestamp, so bouncing on one door
//! contact never delays the others.

use core::time::Duration;

use crate::config::DEBOUNCE_WINDOW;
use crate::time::Millis;

/// Logical inputs wired to debounced contacts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputId {
    MenuButton,
    /// Door that starts the entry delay.
    EntryDoor,
    /// Doors that trigger the siren immediately.
    Door2,
    Door3,
}

impl InputId {
    pub const fn label(self) -> &'static str {
        match self {
            InputId::MenuButton => "menu",
            InputId::EntryDoor => "door1",
            InputId::Door2 => "door2",
            InputId::Door3 => "door3",
        }
    }
}

/// Result of a single [`DebouncedInput::sample`] call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DebounceEvent {
    None,
    ActivatedEdge,
}

impl DebounceEvent {
    pub const fn is_activated(self) -> bool {
        matches!(self, DebounceEvent::ActivatedEdge)
    }
}

/// One debounced contact.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DebouncedInput {
    id: InputId,
    idle_level: bool,
    raw_level: bool,
    stable_level: bool,
    last_transition: Millis,
    window: Duration,
}

impl DebouncedInput {
    /// Creates an input resting at `idle_level` with the default window.
    pub const fn new(id: InputId, idle_level: bool) -> Self {
        Self::with_window(id, idle_level, DEBOUNCE_WINDOW)
    }

    pub const fn with_window(id: InputId, idle_level: bool, window: Duration) -> Self {
        Self {
            id,
            idle_level,
            raw_level: idle_level,
            stable_level: idle_level,
            last_transition: Millis::ZERO,
            window,
        }
    }

    pub const fn id(&self) -> InputId {
        self.id
    }

    pub const fn stable_level(&self) -> bool {
        self.stable_level
    }

    /// Returns `true` while the debounced level differs from the idle level.
    pub const fn is_active(&self) -> bool {
        self.stable_level != self.idle_level
    }

    /// Feeds one raw sample taken at `now`.
    pub fn sample(&mut self, raw_level: bool, now: Millis) -> DebounceEvent {
        if raw_level != self.raw_level {
            self.last_transition = now;
        }

        let mut event = DebounceEvent::None;
        if now.duration_since(self.last_transition) > self.window
            && raw_level != self.stable_level
        {
            self.stable_level = raw_level;
            if self.stable_level != self.idle_level {
                event = DebounceEvent::ActivatedEdge;
            }
        }

        self.raw_level = raw_level;
        event
    }
}
