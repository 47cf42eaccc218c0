#![cfg_attr(not(test), allow(dead_code))]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use alarm_core::config::POLL_PERIOD;
use alarm_core::controller::{Controller, TickInputs, TickOutputs};
use alarm_core::dashboard::{CharacterDisplay, DisplayField, DisplayIntent};
use alarm_core::encoder::{BoundsPolicy, MENU_ENCODER_RANGE, QuadratureDecoder, SharedEncoder};
use alarm_core::inputs::RawInputs;
use alarm_core::script::{Rotation, SCRIPT_USAGE, ScriptCommand, parse_line, usage};
use alarm_core::sensors::Readings;
use alarm_core::time::Millis;

/// Ticks a contact change is held before returning, enough to pass the debounce window.
const SETTLE_TICKS: u32 = 6;

const LCD_ROWS: usize = 2;
const LCD_COLUMNS: usize = 16;

/// How a response line should be presented.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tone {
    Plain,
    Event,
    Warning,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub tone: Tone,
    pub text: String,
}

impl Response {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct OutputLevels {
    relay: bool,
    indicator: bool,
    charge_relay: bool,
}

impl From<&TickOutputs> for OutputLevels {
    fn from(outputs: &TickOutputs) -> Self {
        Self {
            relay: outputs.relay,
            indicator: outputs.indicator,
            charge_relay: outputs.charge_relay,
        }
    }
}

/// Controller running against a virtual clock advanced in poll-period steps.
pub struct Session {
    controller: Controller<4>,
    encoder: SharedEncoder,
    lcd: TextDisplay,
    now: Millis,
    raw: RawInputs,
    readings: Readings,
    pending_keys: VecDeque<char>,
    levels: OutputLevels,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    /// Boots the controller and runs the first cycle.
    pub fn new(controller: Controller<4>) -> Self {
        let mut session = Self {
            controller,
            encoder: SharedEncoder::new(QuadratureDecoder::new(
                MENU_ENCODER_RANGE,
                BoundsPolicy::Wrap,
            )),
            lcd: TextDisplay::default(),
            now: Millis::ZERO,
            raw: RawInputs::default(),
            readings: Readings::default(),
            pending_keys: VecDeque::new(),
            levels: OutputLevels::default(),
            transcript: None,
        };
        let mut boot = Vec::new();
        session.step(&mut boot);
        session
    }

    /// Mirrors every command and response into a file at `path`.
    pub fn with_transcript(mut self, path: &Path) -> io::Result<Self> {
        self.transcript = Some(TranscriptLogger::new(path)?);
        Ok(self)
    }

    pub const fn controller(&self) -> &Controller<4> {
        &self.controller
    }

    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Current text on the simulated display, one string per row.
    pub fn lcd_rows(&self) -> &[String; LCD_ROWS] {
        &self.lcd.rows
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<Response>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(transcript) = &mut self.transcript {
            transcript.append_line(self.now, '>', trimmed)?;
        }

        let mut responses = Vec::new();
        match parse_line(trimmed) {
            Ok(Some(command)) => self.execute(command, &mut responses),
            Ok(None) => {}
            Err(err) => responses.push(Response::new(Tone::Error, format!("ERR syntax {err}"))),
        }

        if let Some(transcript) = &mut self.transcript {
            for response in &responses {
                transcript.append_line(self.now, '<', &response.text)?;
            }
        }
        Ok(responses)
    }

    fn execute(&mut self, command: ScriptCommand<'_>, responses: &mut Vec<Response>) {
        match command {
            ScriptCommand::Keys(keys) => {
                self.pending_keys.extend(keys.chars());
                while !self.pending_keys.is_empty() {
                    self.step(responses);
                }
            }
            ScriptCommand::Door { door, open } => {
                self.raw.doors[usize::from(door - 1)] = open;
                self.run_ticks(SETTLE_TICKS, responses);
            }
            ScriptCommand::Menu { pressed } => {
                self.raw.menu = pressed;
                self.run_ticks(SETTLE_TICKS, responses);
            }
            ScriptCommand::Rotate { rotation, steps } => {
                for _ in 0..steps {
                    self.turn_detent(rotation);
                }
                self.step(responses);
            }
            ScriptCommand::Wait(duration) => {
                let period = POLL_PERIOD.as_millis().max(1);
                let ticks = duration.as_millis().div_ceil(period);
                self.run_ticks(u32::try_from(ticks).unwrap_or(u32::MAX), responses);
            }
            ScriptCommand::Temperature(celsius) => {
                self.readings.temperature_c = Some(celsius);
                self.step(responses);
            }
            ScriptCommand::Battery { battery, volts } => {
                if battery == 1 {
                    self.readings.battery1_v = Some(volts);
                } else {
                    self.readings.battery2_v = Some(volts);
                }
                self.step(responses);
            }
            ScriptCommand::Current(amps) => {
                self.readings.battery2_a = Some(amps);
                self.step(responses);
            }
            ScriptCommand::Status => self.status(responses),
            ScriptCommand::Help(topic) => help(topic, responses),
        }
    }

    fn run_ticks(&mut self, ticks: u32, responses: &mut Vec<Response>) {
        for _ in 0..ticks {
            self.step(responses);
        }
    }

    /// One poll cycle at the current virtual time, then advances the clock.
    fn step(&mut self, responses: &mut Vec<Response>) {
        let encoder = self.encoder.snapshot();
        if encoder.rotating_left || encoder.rotating_right {
            self.encoder.reset_rotating();
        }

        let inputs = TickInputs {
            now: self.now,
            raw: self.raw,
            encoder: Some(encoder.position),
            key: self.pending_keys.pop_front(),
            readings: self.readings,
        };
        let outputs = self.controller.tick(&inputs);

        for event in &outputs.events {
            let tone = if event.is_warning() {
                Tone::Warning
            } else {
                Tone::Event
            };
            responses.push(Response::new(tone, format!("{} {event}", stamp(self.now))));
        }

        let levels = OutputLevels::from(&outputs);
        if levels.relay != self.levels.relay {
            responses.push(Response::new(
                Tone::Warning,
                format!("{} siren {}", stamp(self.now), on_off(levels.relay)),
            ));
        }
        if levels.charge_relay != self.levels.charge_relay {
            responses.push(Response::new(
                Tone::Event,
                format!("{} charge {}", stamp(self.now), on_off(levels.charge_relay)),
            ));
        }
        self.levels = levels;

        if let Some(intent) = &outputs.display {
            self.show(intent, responses);
        }

        self.now = self.now.wrapping_add(POLL_PERIOD);
    }

    fn show(&mut self, intent: &DisplayIntent, responses: &mut Vec<Response>) {
        let Ok(()) = self.lcd.render(intent);
        let light = if self.lcd.backlight { "lit" } else { "dark" };
        responses.push(Response::new(
            Tone::Plain,
            format!(
                "{} lcd [{}] |{}|{}|",
                stamp(self.now),
                light,
                self.lcd.rows[0],
                self.lcd.rows[1]
            ),
        ));
    }

    /// Drives one full quadrature cycle through the shared decoder.
    fn turn_detent(&self, rotation: Rotation) {
        match rotation {
            Rotation::Right => {
                self.encoder.on_phase_a_changed(true);
                self.encoder.on_phase_b_changed(true);
                self.encoder.on_phase_a_changed(false);
                self.encoder.on_phase_b_changed(false);
            }
            Rotation::Left => {
                self.encoder.on_phase_b_changed(true);
                self.encoder.on_phase_a_changed(true);
                self.encoder.on_phase_b_changed(false);
                self.encoder.on_phase_a_changed(false);
            }
        }
    }

    fn status(&self, responses: &mut Vec<Response>) {
        let alarm = self.controller.alarm();
        let doors = self.controller.last_inputs().doors;
        let mut summary = format!(
            "phase={} retries={} passphrase={}/4 countdown={}",
            alarm.phase(),
            alarm.retry_count(),
            alarm.passphrase_cursor(),
            alarm.countdown_active(),
        );
        let _ = write!(
            summary,
            " siren={} indicator={} charge={}",
            on_off(self.levels.relay),
            on_off(self.levels.indicator),
            on_off(self.levels.charge_relay),
        );
        responses.push(Response::new(Tone::Plain, summary));
        responses.push(Response::new(
            Tone::Plain,
            format!(
                "doors entry={} door2={} door3={} page={} clock={} ms",
                open_closed(doors.entry.active),
                open_closed(doors.door2.active),
                open_closed(doors.door3.active),
                self.controller.dashboard().page().label(),
                self.now.as_u32(),
            ),
        ));
    }
}

fn help(topic: Option<&str>, responses: &mut Vec<Response>) {
    match topic {
        Some(topic) => match usage(topic) {
            Some(line) => responses.push(Response::new(Tone::Plain, line)),
            None => responses.push(Response::new(
                Tone::Error,
                format!("ERR unknown command `{topic}`"),
            )),
        },
        None => {
            for (_, line) in SCRIPT_USAGE {
                responses.push(Response::new(Tone::Plain, *line));
            }
        }
    }
}

fn stamp(now: Millis) -> String {
    format!("[+{:>6} ms]", now.as_u32())
}

const fn on_off(level: bool) -> &'static str {
    if level { "on" } else { "off" }
}

const fn open_closed(active: bool) -> &'static str {
    if active { "open" } else { "closed" }
}

/// Two-row character display backed by strings.
#[derive(Clone, Debug)]
struct TextDisplay {
    rows: [String; LCD_ROWS],
    backlight: bool,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self {
            rows: [" ".repeat(LCD_COLUMNS), " ".repeat(LCD_COLUMNS)],
            backlight: false,
        }
    }
}

impl CharacterDisplay for TextDisplay {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        for row in &mut self.rows {
            *row = " ".repeat(LCD_COLUMNS);
        }
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.backlight = on;
        Ok(())
    }

    fn write_field(&mut self, field: &DisplayField) -> Result<(), Self::Error> {
        let row = &mut self.rows[usize::from(field.row) % LCD_ROWS];
        let column = usize::from(field.column).min(LCD_COLUMNS);
        let text = format!("{:<width$}", field.content, width = LCD_COLUMNS - column);
        let mut cells: Vec<char> = row.chars().collect();
        cells.truncate(column);
        cells.extend(text.chars().take(LCD_COLUMNS - column));
        *row = cells.into_iter().collect();
        Ok(())
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        writeln!(logger.writer, "# Camper alarm emulator transcript")?;
        writeln!(logger.writer, "# Timestamps are virtual milliseconds since boot")?;
        writeln!(logger.writer)?;
        logger.writer.flush()?;
        Ok(logger)
    }

    fn append_line(&mut self, now: Millis, direction: char, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{} {direction} {line}", stamp(now))?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarm_core::alarm::AlarmPhase;
    use alarm_core::config::AlarmConfig;
    use alarm_core::dashboard::MenuPage;
    use alarm_core::passphrase::FACTORY_PASSPHRASE;

    fn session() -> Session {
        Session::new(Controller::with_defaults())
    }

    fn run(session: &mut Session, line: &str) -> Vec<Response> {
        session.handle_command(line).expect("in-memory session")
    }

    fn mentions(responses: &[Response], needle: &str) -> bool {
        responses.iter().any(|response| response.text.contains(needle))
    }

    #[test]
    fn boot_draws_the_climate_page() {
        let session = session();
        assert!(session.lcd_rows()[0].starts_with("Temp"));
        assert!(session.lcd_rows()[0].contains("--"));
        assert_eq!(session.now(), Millis::new(10));
    }

    #[test]
    fn arming_then_disarming_through_keys() {
        let mut session = session();
        let responses = run(&mut session, "key #");
        assert!(mentions(&responses, "countdown-started"));

        let responses = run(&mut session, "wait 6s");
        assert!(mentions(&responses, "phase normal -> armed"));
        assert_eq!(session.controller().alarm().phase(), AlarmPhase::Armed);

        let responses = run(&mut session, "key 1234");
        assert!(mentions(&responses, "disarmed"));
        assert_eq!(session.controller().alarm().phase(), AlarmPhase::Normal);
    }

    #[test]
    fn opening_a_secondary_door_sounds_the_siren() {
        let mut session = session();
        run(&mut session, "key #");
        run(&mut session, "wait 6s");

        let responses = run(&mut session, "door 2 open");
        assert!(mentions(&responses, "triggered door2"));
        assert!(mentions(&responses, "siren on"));
        assert!(responses.iter().any(|response| response.tone == Tone::Warning));
    }

    #[test]
    fn disabled_armed_disarm_ignores_passphrase() {
        let config = AlarmConfig::DEFAULT.with_disarm_while_armed(false);
        let mut session = Session::new(Controller::new(config, FACTORY_PASSPHRASE));
        run(&mut session, "key #");
        run(&mut session, "wait 6s");

        run(&mut session, "key 1234");
        assert_eq!(session.controller().alarm().phase(), AlarmPhase::Armed);
    }

    #[test]
    fn rotation_selects_pages() {
        let mut session = session();
        run(&mut session, "rotate right");
        assert_eq!(session.controller().dashboard().page(), MenuPage::from_index(1));

        run(&mut session, "rotate left 2");
        assert_eq!(session.controller().dashboard().page(), MenuPage::from_index(2));
    }

    #[test]
    fn charged_battery_closes_charge_relay_after_delay() {
        let mut session = session();
        run(&mut session, "battery 1 4.8");
        let responses = run(&mut session, "wait 5100");
        assert!(mentions(&responses, "charge on"));
    }

    #[test]
    fn syntax_errors_and_help() {
        let mut session = session();
        let responses = run(&mut session, "door 7 open");
        assert_eq!(responses[0].tone, Tone::Error);
        assert!(responses[0].text.starts_with("ERR syntax"));

        let before = session.now();
        let responses = run(&mut session, "wait 99999999s");
        assert_eq!(responses[0].tone, Tone::Error);
        assert_eq!(session.now(), before);

        let responses = run(&mut session, "help");
        assert_eq!(responses.len(), SCRIPT_USAGE.len());

        let responses = run(&mut session, "help door");
        assert_eq!(responses[0].text, "door <1-3> <open|close>");
    }

    #[test]
    fn status_reports_phase_and_doors() {
        let mut session = session();
        run(&mut session, "door 1 open");
        let responses = run(&mut session, "status");
        assert!(responses[0].text.starts_with("phase=normal"));
        assert!(responses[1].text.contains("entry=open"));
    }
}
