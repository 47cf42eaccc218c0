//! Alarm sequencer driven once per poll cycle.
//!
//! The machine moves between four phases:
//!
//! * `Normal`: disarmed. The arming key starts an exit countdown; any key
//!   during the countdown cancels it.
//! * `Armed`: the indicator blinks slowly. Doors 2 and 3 trigger the siren at
//!   once; the entry door starts the entry delay.
//! * `Unlocking`: the indicator blinks fast while the passphrase is expected.
//! * `Alarming`: the relay sounds the siren for one burst, then the machine
//!   re-arms. After the retry budget is spent the relay stays off and only the
//!   indicator flashes until the passphrase is entered.
//!
//! Each phase has its own transition function; shared effects (phase change
//! bookkeeping, disarming, passphrase checks) live in helpers so every phase's
//! rules can be read in isolation.

use core::fmt;

use crate::config::{AlarmConfig, ConfigError};
use crate::debounce::InputId;
use crate::inputs::DoorReadings;
use crate::passphrase::{FACTORY_PASSPHRASE, MatchProgress, Passphrase, PassphraseMatcher};
use crate::telemetry::{AlarmEvent, TickEvents, push_event};
use crate::time::Millis;

pub mod indicator;

pub use indicator::Indicator;

/// Data-free tag for the current phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlarmPhase {
    Normal,
    Armed,
    Unlocking,
    Alarming,
}

impl AlarmPhase {
    pub const fn label(self) -> &'static str {
        match self {
            AlarmPhase::Normal => "normal",
            AlarmPhase::Armed => "armed",
            AlarmPhase::Unlocking => "unlocking",
            AlarmPhase::Alarming => "alarming",
        }
    }
}

impl fmt::Display for AlarmPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase plus the timestamps that only matter inside it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlarmState {
    Normal { countdown_started: Option<Millis> },
    Armed,
    Unlocking { since: Millis },
    Alarming { since: Millis },
}

impl AlarmState {
    pub const IDLE: Self = AlarmState::Normal {
        countdown_started: None,
    };

    pub const fn phase(&self) -> AlarmPhase {
        match self {
            AlarmState::Normal { .. } => AlarmPhase::Normal,
            AlarmState::Armed => AlarmPhase::Armed,
            AlarmState::Unlocking { .. } => AlarmPhase::Unlocking,
            AlarmState::Alarming { .. } => AlarmPhase::Alarming,
        }
    }
}

/// Output levels after a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlarmOutputs {
    pub relay: bool,
    pub indicator: bool,
    pub phase: AlarmPhase,
}

/// Alarm sequencer with an `N` digit passphrase.
#[derive(Clone, Debug)]
pub struct AlarmMachine<const N: usize> {
    config: AlarmConfig,
    state: AlarmState,
    matcher: PassphraseMatcher<N>,
    retry_count: u8,
    exhausted_reported: bool,
    indicator: Indicator,
    relay: bool,
}

impl AlarmMachine<4> {
    /// Machine with the factory policy and passphrase.
    pub fn with_defaults() -> Self {
        Self::new(AlarmConfig::DEFAULT, FACTORY_PASSPHRASE)
    }
}

impl<const N: usize> AlarmMachine<N> {
    pub fn new(config: AlarmConfig, passphrase: Passphrase<N>) -> Self {
        Self {
            config,
            state: AlarmState::IDLE,
            matcher: PassphraseMatcher::new(passphrase, config.mismatch),
            retry_count: 0,
            exhausted_reported: false,
            indicator: Indicator::new(),
            relay: false,
        }
    }

    /// Validates `config` before building the machine.
    pub fn try_new(config: AlarmConfig, passphrase: Passphrase<N>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, passphrase))
    }

    pub const fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub const fn state(&self) -> AlarmState {
        self.state
    }

    pub const fn phase(&self) -> AlarmPhase {
        self.state.phase()
    }

    pub const fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// 1-based index of the next expected passphrase digit.
    pub const fn passphrase_cursor(&self) -> usize {
        self.matcher.cursor()
    }

    pub const fn countdown_active(&self) -> bool {
        matches!(
            self.state,
            AlarmState::Normal {
                countdown_started: Some(_)
            }
        )
    }

    pub const fn outputs(&self) -> AlarmOutputs {
        AlarmOutputs {
            relay: self.relay,
            indicator: self.indicator.is_lit(),
            phase: self.state.phase(),
        }
    }

    /// Runs one poll cycle.
    pub fn tick(
        &mut self,
        now: Millis,
        doors: &DoorReadings,
        key: Option<char>,
        events: &mut TickEvents,
    ) -> AlarmOutputs {
        if key == Some(self.config.reset_key) {
            self.matcher.reset();
            push_event(events, AlarmEvent::PassphraseReset);
        }

        match self.state {
            AlarmState::Normal { countdown_started } => {
                self.tick_normal(now, countdown_started, key, events);
            }
            AlarmState::Armed => self.tick_armed(now, doors, key, events),
            AlarmState::Unlocking { since } => self.tick_unlocking(now, since, key, events),
            AlarmState::Alarming { since } => self.tick_alarming(now, since, key, events),
        }

        self.outputs()
    }

    fn tick_normal(
        &mut self,
        now: Millis,
        countdown_started: Option<Millis>,
        key: Option<char>,
        events: &mut TickEvents,
    ) {
        self.retry_count = 0;
        self.exhausted_reported = false;

        if let Some(started) = countdown_started {
            if now.has_elapsed(started, self.config.arm_countdown) {
                self.enter(AlarmState::Armed, events);
            } else if key.is_some() {
                self.state = AlarmState::IDLE;
                push_event(events, AlarmEvent::CountdownCancelled);
            }
            return;
        }

        if key == Some(self.config.arming_key) {
            self.state = AlarmState::Normal {
                countdown_started: Some(now),
            };
            push_event(events, AlarmEvent::CountdownStarted);
        }
    }

    fn tick_armed(
        &mut self,
        now: Millis,
        doors: &DoorReadings,
        key: Option<char>,
        events: &mut TickEvents,
    ) {
        self.indicator.blink(now, self.config.armed_blink);

        let instant_trigger = if doors.door2.engaged() {
            Some(InputId::Door2)
        } else if doors.door3.engaged() {
            Some(InputId::Door3)
        } else {
            None
        };

        if let Some(source) = instant_trigger {
            self.indicator.off();
            push_event(events, AlarmEvent::Triggered(source));
            self.enter(AlarmState::Alarming { since: now }, events);
        } else if doors.entry.activated {
            push_event(events, AlarmEvent::EntryDoorOpened);
            self.enter(AlarmState::Unlocking { since: now }, events);
        }

        if self.config.disarm_while_armed
            && let Some(key) = key
            && self.check_passphrase(key, events)
        {
            self.disarm(events);
        }
    }

    fn tick_unlocking(
        &mut self,
        now: Millis,
        since: Millis,
        key: Option<char>,
        events: &mut TickEvents,
    ) {
        self.indicator.blink(now, self.config.disarming_blink);

        if let Some(key) = key
            && self.check_passphrase(key, events)
        {
            self.disarm(events);
            return;
        }

        if now.has_elapsed(since, self.config.entry_delay) {
            push_event(events, AlarmEvent::EntryDelayExpired);
            self.enter(AlarmState::Alarming { since: now }, events);
        }
    }

    fn tick_alarming(
        &mut self,
        now: Millis,
        since: Millis,
        key: Option<char>,
        events: &mut TickEvents,
    ) {
        if self.retry_count < self.config.retry_limit {
            self.indicator.off();
            self.relay = true;
            if now.has_elapsed(since, self.config.alarm_duration) {
                self.relay = false;
                self.retry_count = self.retry_count.saturating_add(1);
                push_event(
                    events,
                    AlarmEvent::AlarmCycleElapsed {
                        retries: self.retry_count,
                    },
                );
                self.enter(AlarmState::Armed, events);
            }
        } else {
            self.relay = false;
            if !self.exhausted_reported {
                self.exhausted_reported = true;
                push_event(events, AlarmEvent::RetriesExhausted);
            }
            self.indicator.blink(now, self.config.disarming_blink);
        }

        if let Some(key) = key
            && self.check_passphrase(key, events)
        {
            self.relay = false;
            self.disarm(events);
        }
    }

    /// Feeds a key to the matcher; returns `true` on a full match.
    fn check_passphrase(&mut self, key: char, events: &mut TickEvents) -> bool {
        match self.matcher.advance(key) {
            MatchProgress::Complete => true,
            MatchProgress::Advanced | MatchProgress::Restarted => {
                let cursor = u8::try_from(self.matcher.cursor()).unwrap_or(u8::MAX);
                push_event(events, AlarmEvent::PassphraseProgress { cursor });
                false
            }
            MatchProgress::Ignored => false,
        }
    }

    fn disarm(&mut self, events: &mut TickEvents) {
        self.indicator.off();
        self.relay = false;
        push_event(events, AlarmEvent::Disarmed);
        self.enter(AlarmState::IDLE, events);
    }

    fn enter(&mut self, next: AlarmState, events: &mut TickEvents) {
        let from = self.state.phase();
        let to = next.phase();
        self.state = next;

        if to == AlarmPhase::Normal {
            self.matcher.reset();
            self.retry_count = 0;
        }
        if from != to {
            push_event(events, AlarmEvent::PhaseChanged { from, to });
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::inputs::InputReading;

    fn at(ms: u32) -> Millis {
        Millis::new(ms)
    }

    fn tick(machine: &mut AlarmMachine<4>, ms: u32, doors: DoorReadings, key: Option<char>) -> TickEvents {
        let mut events = TickEvents::new();
        machine.tick(at(ms), &doors, key, &mut events);
        events
    }

    fn armed_machine() -> AlarmMachine<4> {
        let mut machine = AlarmMachine::with_defaults();
        tick(&mut machine, 0, DoorReadings::default(), Some('#'));
        tick(&mut machine, 5_000, DoorReadings::default(), None);
        assert_eq!(machine.phase(), AlarmPhase::Armed);
        machine
    }

    #[test]
    fn countdown_arms_after_configured_delay() {
        let mut machine = AlarmMachine::with_defaults();
        let events = tick(&mut machine, 100, DoorReadings::default(), Some('#'));
        assert!(events.contains(&AlarmEvent::CountdownStarted));
        assert!(machine.countdown_active());

        tick(&mut machine, 5_099, DoorReadings::default(), None);
        assert_eq!(machine.phase(), AlarmPhase::Normal);

        let events = tick(&mut machine, 5_100, DoorReadings::default(), None);
        assert_eq!(machine.phase(), AlarmPhase::Armed);
        assert!(!machine.countdown_active());
        assert!(events.contains(&AlarmEvent::PhaseChanged {
            from: AlarmPhase::Normal,
            to: AlarmPhase::Armed
        }));
    }

    #[test]
    fn other_keys_do_not_start_countdown() {
        let mut machine = AlarmMachine::with_defaults();
        tick(&mut machine, 0, DoorReadings::default(), Some('5'));
        assert!(!machine.countdown_active());
    }

    #[test]
    fn held_instant_door_triggers_without_edge() {
        let mut machine = armed_machine();
        let doors = DoorReadings {
            door3: InputReading::new(false, true),
            ..DoorReadings::default()
        };
        let events = tick(&mut machine, 6_000, doors, None);
        assert_eq!(machine.phase(), AlarmPhase::Alarming);
        assert!(events.contains(&AlarmEvent::Triggered(InputId::Door3)));
        assert!(!machine.outputs().indicator);
    }

    #[test]
    fn held_entry_door_without_edge_is_ignored() {
        let mut machine = armed_machine();
        let doors = DoorReadings {
            entry: InputReading::new(false, true),
            ..DoorReadings::default()
        };
        tick(&mut machine, 6_000, doors, None);
        assert_eq!(machine.phase(), AlarmPhase::Armed);
    }

    #[test]
    fn armed_indicator_blinks_at_armed_period() {
        let mut machine = armed_machine();
        let mut toggles = 0;
        let mut last = machine.outputs().indicator;
        for ms in (5_010..=7_000).step_by(10) {
            tick(&mut machine, ms, DoorReadings::default(), None);
            let lit = machine.outputs().indicator;
            if lit != last {
                toggles += 1;
                last = lit;
            }
        }
        // 2 s of armed blinking at 500 ms per toggle.
        assert_eq!(toggles, 4);
    }

    #[test]
    fn passphrase_while_armed_can_be_disabled() {
        let config = AlarmConfig::DEFAULT.with_disarm_while_armed(false);
        let mut machine = AlarmMachine::new(config, FACTORY_PASSPHRASE);
        tick(&mut machine, 0, DoorReadings::default(), Some('#'));
        tick(&mut machine, 5_000, DoorReadings::default(), None);
        for (offset, key) in "1234".chars().enumerate() {
            let ms = 5_010 + u32::try_from(offset).unwrap() * 10;
            tick(&mut machine, ms, DoorReadings::default(), Some(key));
        }
        assert_eq!(machine.phase(), AlarmPhase::Armed);
        assert_eq!(machine.passphrase_cursor(), 1);
    }

    #[test]
    fn unlocking_disarm_wins_over_expiring_delay() {
        let mut machine = armed_machine();
        let entry = DoorReadings {
            entry: InputReading::new(true, true),
            ..DoorReadings::default()
        };
        tick(&mut machine, 6_000, entry, None);
        assert_eq!(machine.phase(), AlarmPhase::Unlocking);
        for (offset, key) in "123".chars().enumerate() {
            let ms = 6_100 + u32::try_from(offset).unwrap() * 100;
            tick(&mut machine, ms, DoorReadings::default(), Some(key));
        }
        tick(&mut machine, 11_000, DoorReadings::default(), Some('4'));
        assert_eq!(machine.phase(), AlarmPhase::Normal);
    }

    #[test]
    fn reset_key_discards_progress_in_any_phase() {
        let mut machine = armed_machine();
        tick(&mut machine, 5_100, DoorReadings::default(), Some('1'));
        tick(&mut machine, 5_200, DoorReadings::default(), Some('2'));
        assert_eq!(machine.passphrase_cursor(), 3);

        let events = tick(&mut machine, 5_300, DoorReadings::default(), Some('*'));
        assert!(events.contains(&AlarmEvent::PassphraseReset));
        assert_eq!(machine.passphrase_cursor(), 1);
        assert_eq!(machine.phase(), AlarmPhase::Armed);
    }

    #[test]
    fn zero_retry_budget_goes_straight_to_blinking() {
        let config = AlarmConfig::DEFAULT.with_retry_limit(0);
        let mut machine = AlarmMachine::try_new(config, FACTORY_PASSPHRASE).unwrap();
        tick(&mut machine, 0, DoorReadings::default(), Some('#'));
        tick(&mut machine, 5_000, DoorReadings::default(), None);
        let doors = DoorReadings {
            door2: InputReading::new(true, true),
            ..DoorReadings::default()
        };
        tick(&mut machine, 5_010, doors, None);
        let events = tick(&mut machine, 5_020, doors, None);
        assert!(events.contains(&AlarmEvent::RetriesExhausted));
        assert!(!machine.outputs().relay);

        let config = AlarmConfig::DEFAULT.with_alarm_duration(Duration::from_millis(10));
        assert!(AlarmMachine::try_new(config, FACTORY_PASSPHRASE).is_ok());
    }
}
