use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process;

use alarm_core::controller::Controller;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::Session;

/// Replays a script file line by line and writes the transcript next to it.
fn main() -> io::Result<()> {
    let mut args = env::args().skip(1);
    let Some(script) = args.next() else {
        eprintln!("Usage: replay <script> [transcript]");
        process::exit(2);
    };
    let script = Path::new(&script);
    let transcript = args
        .next()
        .map_or_else(|| script.with_extension("log"), Into::into);

    let source = fs::read_to_string(script)?;
    let mut session = Session::new(Controller::with_defaults()).with_transcript(&transcript)?;
    for line in source.lines() {
        let line = line.split("//").next().unwrap_or_default();
        for response in session.handle_command(line)? {
            println!("{}", response.text);
        }
    }
    Ok(())
}
