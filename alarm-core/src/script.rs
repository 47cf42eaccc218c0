#![allow(clippy::module_name_repetitions)]

//! Line-oriented stimulus language for driving the controller off-target.
//!
//! Each line is one command. The emulator reads them from stdin; tests feed
//! them from string literals. Parsing is built on `winnow` over plain `&str`
//! input and never allocates.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{alpha1, dec_uint, space1};
use winnow::combinator::{alt, opt, preceded, separated_pair};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::keypad::is_keypad_char;

/// Encoder turning direction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rotation {
    Left,
    Right,
}

/// One parsed script line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ScriptCommand<'a> {
    /// Keypad characters, queued one per tick.
    Keys(&'a str),
    /// Sets a door contact; doors are numbered from 1.
    Door { door: u8, open: bool },
    Menu { pressed: bool },
    Rotate { rotation: Rotation, steps: u16 },
    Wait(Duration),
    Temperature(f32),
    Battery { battery: u8, volts: f32 },
    Current(f32),
    Status,
    Help(Option<&'a str>),
}

/// Failure to parse a script line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScriptError {
    /// Byte offset into the trimmed line where parsing stopped.
    pub offset: usize,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised command at column {}", self.offset + 1)
    }
}

/// Longest virtual time a single `wait` may advance.
pub const MAX_WAIT: Duration = Duration::from_secs(3_600);

/// Command names with a one-line usage summary.
pub const SCRIPT_USAGE: &[(&str, &str)] = &[
    ("key", "key <0-9*#>...      queue keypad presses, one per tick"),
    ("door", "door <1-3> <open|close>"),
    ("menu", "menu <press|release>"),
    ("rotate", "rotate <left|right> [steps]"),
    ("wait", "wait <n>[ms|s]      advance the virtual clock, at most 1 h"),
    ("temp", "temp <celsius>"),
    ("battery", "battery <1|2> <volts>"),
    ("current", "current <amps>"),
    ("status", "status              print the controller state"),
    ("help", "help [command]"),
];

/// Usage line for `command`, if it exists.
pub fn usage(command: &str) -> Option<&'static str> {
    SCRIPT_USAGE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(command))
        .map(|(_, usage)| *usage)
}

/// Parses one line; blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand<'_>>, ScriptError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    command
        .parse(trimmed)
        .map(Some)
        .map_err(|err| ScriptError {
            offset: err.offset(),
        })
}

fn command<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    alt((
        keys,
        door,
        menu,
        rotate,
        wait,
        temperature,
        battery,
        current,
        "status".value(ScriptCommand::Status),
        help,
    ))
    .parse_next(input)
}

fn keys<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(("key", space1), take_while(1.., is_keypad_char))
        .map(ScriptCommand::Keys)
        .parse_next(input)
}

fn door<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(
        ("door", space1),
        separated_pair(
            alt(('1'.value(1u8), '2'.value(2u8), '3'.value(3u8))),
            space1,
            alt(("open".value(true), "close".value(false))),
        ),
    )
    .map(|(door, open)| ScriptCommand::Door { door, open })
    .parse_next(input)
}

fn menu<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(
        ("menu", space1),
        alt(("press".value(true), "release".value(false))),
    )
    .map(|pressed| ScriptCommand::Menu { pressed })
    .parse_next(input)
}

fn rotate<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(
        ("rotate", space1),
        (
            alt(("left".value(Rotation::Left), "right".value(Rotation::Right))),
            opt(preceded(space1, dec_uint::<_, u16, _>)),
        ),
    )
    .map(|(rotation, steps)| ScriptCommand::Rotate {
        rotation,
        steps: steps.unwrap_or(1),
    })
    .parse_next(input)
}

fn wait<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(
        ("wait", space1),
        (
            dec_uint::<_, u64, _>,
            opt(alt(("ms".value(1u64), "s".value(1_000u64)))),
        ),
    )
    .map(|(amount, unit)| Duration::from_millis(amount.saturating_mul(unit.unwrap_or(1))))
    .verify(|duration: &Duration| *duration <= MAX_WAIT)
    .map(ScriptCommand::Wait)
    .parse_next(input)
}

fn temperature<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(("temp", space1), number)
        .map(ScriptCommand::Temperature)
        .parse_next(input)
}

fn battery<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(
        ("battery", space1),
        separated_pair(alt(('1'.value(1u8), '2'.value(2u8))), space1, number),
    )
    .map(|(battery, volts)| ScriptCommand::Battery { battery, volts })
    .parse_next(input)
}

fn current<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded(("current", space1), number)
        .map(ScriptCommand::Current)
        .parse_next(input)
}

fn help<'a>(input: &mut &'a str) -> ModalResult<ScriptCommand<'a>> {
    preceded("help", opt(preceded(space1, alpha1)))
        .map(ScriptCommand::Help)
        .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f32> {
    take_while(1.., |c: char| c.is_ascii_digit() || c == '.' || c == '-')
        .try_map(|text: &str| text.parse::<f32>())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn parse(line: &str) -> ScriptCommand<'_> {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn parses_keypad_sequences() {
        assert_eq!(parse("key 12#*"), ScriptCommand::Keys("12#*"));
        assert!(parse_line("key 12a").is_err());
        assert!(parse_line("key").is_err());
    }

    #[test]
    fn parses_doors_and_menu() {
        assert_eq!(
            parse("  door 2 open "),
            ScriptCommand::Door {
                door: 2,
                open: true
            }
        );
        assert_eq!(
            parse("door 1 close"),
            ScriptCommand::Door {
                door: 1,
                open: false
            }
        );
        assert!(parse_line("door 4 open").is_err());
        assert_eq!(parse("menu press"), ScriptCommand::Menu { pressed: true });
    }

    #[test]
    fn rotate_defaults_to_one_step() {
        assert_eq!(
            parse("rotate left"),
            ScriptCommand::Rotate {
                rotation: Rotation::Left,
                steps: 1
            }
        );
        assert_eq!(
            parse("rotate right 3"),
            ScriptCommand::Rotate {
                rotation: Rotation::Right,
                steps: 3
            }
        );
    }

    #[test]
    fn wait_accepts_units() {
        assert_eq!(parse("wait 250"), ScriptCommand::Wait(Duration::from_millis(250)));
        assert_eq!(parse("wait 250ms"), ScriptCommand::Wait(Duration::from_millis(250)));
        assert_eq!(parse("wait 5s"), ScriptCommand::Wait(Duration::from_secs(5)));
    }

    #[test]
    fn wait_is_bounded() {
        assert_eq!(parse("wait 3600s"), ScriptCommand::Wait(MAX_WAIT));
        assert!(parse_line("wait 3601s").is_err());
        assert!(parse_line("wait 99999999s").is_err());
        assert!(parse_line("wait 18446744073709551615").is_err());
    }

    #[test]
    fn parses_readings() {
        match parse("battery 1 4.75") {
            ScriptCommand::Battery { battery, volts } => {
                assert_eq!(battery, 1);
                assert!((volts - 4.75).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse("temp -3.5") {
            ScriptCommand::Temperature(celsius) => assert!((celsius + 3.5).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_line("current 1.2.3").is_err());
    }

    #[test]
    fn status_help_and_blank_lines() {
        assert_eq!(parse("status"), ScriptCommand::Status);
        assert_eq!(parse("help"), ScriptCommand::Help(None));
        assert_eq!(parse("help door"), ScriptCommand::Help(Some("door")));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(usage("WAIT").map(|u| u.starts_with("wait")), Some(true));
    }

    #[test]
    fn error_reports_column() {
        let err = parse_line("launch").unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(std::format!("{err}"), "unrecognised command at column 1");
    }
}
