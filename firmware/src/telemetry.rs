//! Telemetry ring buffer and logging helpers.
//!
//! Every alarm event reported by the controller is stamped with the cycle time
//! and kept in a fixed-capacity ring so the most recent history survives until
//! a debugger attaches. Output level changes are mirrored to defmt (or stdout
//! on the host) as they happen.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use alarm_core::controller::TickOutputs;
use alarm_core::telemetry::AlarmEvent;
use alarm_core::time::Millis;
use heapless::{HistoryBuf, OldestOrdered};

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

pub type EventId = u32;

pub type TelemetryRing = HistoryBuf<TelemetryRecord, TELEMETRY_RING_CAPACITY>;

/// What a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryEvent {
    Alarm(AlarmEvent),
    SirenRelay(bool),
    ChargeRelay(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Millis,
    pub event: TelemetryEvent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OutputLevels {
    relay: bool,
    charge_relay: bool,
}

/// Records controller activity and mirrors it to the log.
pub struct TelemetryRecorder {
    ring: TelemetryRing,
    last_levels: Option<OutputLevels>,
    next_event_id: EventId,
}

impl TelemetryRecorder {
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_levels: None,
            next_event_id: 0,
        }
    }

    /// Recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.recent().is_none()
    }

    /// Records the events and relay changes from one controller cycle.
    pub fn observe(&mut self, now: Millis, outputs: &TickOutputs) {
        for event in &outputs.events {
            self.record(TelemetryEvent::Alarm(*event), now);
            emit_alarm_event(now, event);
        }

        let levels = OutputLevels {
            relay: outputs.relay,
            charge_relay: outputs.charge_relay,
        };
        let previous = self.last_levels.replace(levels);

        if previous.is_none_or(|prev| prev.relay != levels.relay) {
            self.record(TelemetryEvent::SirenRelay(levels.relay), now);
            emit_relay("siren", levels.relay, now);
        }
        if previous.is_none_or(|prev| prev.charge_relay != levels.charge_relay) {
            self.record(TelemetryEvent::ChargeRelay(levels.charge_relay), now);
            emit_relay("charge", levels.charge_relay, now);
        }
    }

    pub fn record(&mut self, event: TelemetryEvent, timestamp: Millis) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });

        id
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "none")]
fn emit_alarm_event(now: Millis, event: &AlarmEvent) {
    if event.is_warning() {
        defmt::warn!(
            "telemetry:alarm t={}ms {}",
            now.as_u32(),
            defmt::Display2Format(event)
        );
    } else {
        defmt::info!(
            "telemetry:alarm t={}ms {}",
            now.as_u32(),
            defmt::Display2Format(event)
        );
    }
}

#[cfg(not(target_os = "none"))]
fn emit_alarm_event(now: Millis, event: &AlarmEvent) {
    let level = if event.is_warning() { "WARN" } else { "INFO" };
    println!("{level} telemetry:alarm t={}ms {event}", now.as_u32());
}

#[cfg(target_os = "none")]
fn emit_relay(name: &'static str, closed: bool, now: Millis) {
    defmt::info!(
        "telemetry:relay {} {} t={}ms",
        name,
        relay_label(closed),
        now.as_u32()
    );
}

#[cfg(not(target_os = "none"))]
fn emit_relay(name: &'static str, closed: bool, now: Millis) {
    println!(
        "INFO telemetry:relay {name} {} t={}ms",
        relay_label(closed),
        now.as_u32()
    );
}

const fn relay_label(closed: bool) -> &'static str {
    if closed { "closed" } else { "open" }
}
