mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use alarm_core::config::AlarmConfig;
use alarm_core::controller::Controller;
use alarm_core::passphrase::{FACTORY_PASSPHRASE, Passphrase};
use crossterm::style::Stylize;

use session::{Response, Session, Tone};

struct Options {
    passphrase: Passphrase<4>,
    disarm_while_armed: bool,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: alarm-emulator [--passphrase <4 digits>] [--no-armed-disarm] [--transcript <path>]"
        );
        process::exit(2);
    });

    let config = AlarmConfig::DEFAULT.with_disarm_while_armed(options.disarm_while_armed);
    let controller = Controller::try_new(config, options.passphrase).unwrap_or_else(|err| {
        eprintln!("invalid configuration: {err}");
        process::exit(2);
    });
    let mut session = Session::new(controller);
    if let Some(path) = &options.transcript {
        session = session.with_transcript(path)?;
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Camper alarm emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed)? {
            print_response(&mut writer, &response)?;
        }
    }

    Ok(())
}

fn print_response(writer: &mut impl Write, response: &Response) -> io::Result<()> {
    let text = response.text.as_str();
    match response.tone {
        Tone::Plain => writeln!(writer, "{text}"),
        Tone::Event => writeln!(writer, "{}", text.cyan()),
        Tone::Warning => writeln!(writer, "{}", text.yellow().bold()),
        Tone::Error => writeln!(writer, "{}", text.red()),
    }
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        passphrase: FACTORY_PASSPHRASE,
        disarm_while_armed: true,
        transcript: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--passphrase=") {
            options.passphrase = parse_passphrase(value)?;
        } else if arg == "--passphrase" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --passphrase".to_string())?;
            options.passphrase = parse_passphrase(&value)?;
        } else if arg == "--no-armed-disarm" {
            options.disarm_while_armed = false;
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --transcript".to_string())?;
            options.transcript = Some(PathBuf::from(value));
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }

    Ok(options)
}

fn parse_passphrase(value: &str) -> Result<Passphrase<4>, String> {
    Passphrase::parse4(value).map_err(|err| format!("Invalid passphrase `{value}`: {err}"))
}
