//! Alarm telemetry events shared by firmware and host targets.
//!
//! The state machine reports what it did during a tick as a short list of
//! strongly typed events. Targets decide how to surface them: the firmware
//! mirrors them over defmt and keeps a ring of recent records, the emulator
//! prints them.

use core::fmt;

use heapless::Vec;

use crate::alarm::AlarmPhase;
use crate::debounce::InputId;

/// Upper bound on events a single tick can produce.
pub const MAX_TICK_EVENTS: usize = 8;

/// Events emitted during one tick.
pub type TickEvents = Vec<AlarmEvent, MAX_TICK_EVENTS>;

/// Discriminated alarm events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlarmEvent {
    CountdownStarted,
    CountdownCancelled,
    PhaseChanged { from: AlarmPhase, to: AlarmPhase },
    Triggered(InputId),
    EntryDoorOpened,
    EntryDelayExpired,
    AlarmCycleElapsed { retries: u8 },
    RetriesExhausted,
    PassphraseProgress { cursor: u8 },
    PassphraseReset,
    Disarmed,
}

impl AlarmEvent {
    /// Events that deserve operator attention.
    pub const fn is_warning(self) -> bool {
        matches!(
            self,
            AlarmEvent::Triggered(_) | AlarmEvent::EntryDelayExpired | AlarmEvent::RetriesExhausted
        )
    }
}

impl fmt::Display for AlarmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmEvent::CountdownStarted => f.write_str("countdown-started"),
            AlarmEvent::CountdownCancelled => f.write_str("countdown-cancelled"),
            AlarmEvent::PhaseChanged { from, to } => write!(f, "phase {from} -> {to}"),
            AlarmEvent::Triggered(input) => write!(f, "triggered {}", input.label()),
            AlarmEvent::EntryDoorOpened => f.write_str("entry-door-opened"),
            AlarmEvent::EntryDelayExpired => f.write_str("entry-delay-expired"),
            AlarmEvent::AlarmCycleElapsed { retries } => write!(f, "alarm-cycle retries={retries}"),
            AlarmEvent::RetriesExhausted => f.write_str("retries-exhausted"),
            AlarmEvent::PassphraseProgress { cursor } => write!(f, "passphrase cursor={cursor}"),
            AlarmEvent::PassphraseReset => f.write_str("passphrase-reset"),
            AlarmEvent::Disarmed => f.write_str("disarmed"),
        }
    }
}

/// Appends an event, dropping it if the tick buffer is already full.
pub(crate) fn push_event(events: &mut TickEvents, event: AlarmEvent) {
    let _ = events.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_events_beyond_capacity() {
        let mut events = TickEvents::new();
        for _ in 0..MAX_TICK_EVENTS + 3 {
            push_event(&mut events, AlarmEvent::PassphraseReset);
        }
        assert_eq!(events.len(), MAX_TICK_EVENTS);
    }

    #[test]
    fn warnings_cover_escalation_events() {
        assert!(AlarmEvent::Triggered(InputId::Door2).is_warning());
        assert!(AlarmEvent::RetriesExhausted.is_warning());
        assert!(!AlarmEvent::Disarmed.is_warning());
    }
}
