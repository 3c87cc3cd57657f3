//! Line-based console front end for a keypad session.

use std::io::{self, BufRead, Write};

use tracing::{debug, info};

use crate::cmdline::TokenKind;
use crate::levels::{self, DisplayMode, LevelBuffer, DMX_MIN};
use crate::session::Session;

/// Console commands, as opposed to keys.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Clear,
    Back,
    Levels,
    Mode(DisplayMode),
    Quit,
}

fn read_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (Some(":clear"), None) => Ok(Command::Clear),
        (Some(":back"), None) => Ok(Command::Back),
        (Some(":levels"), None) => Ok(Command::Levels),
        (Some(":quit"), None) => Ok(Command::Quit),
        (Some(":mode"), Some(mode)) => {
            mode.parse().map(Command::Mode).map_err(|err| format!("{}", err))
        }
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}

/// Run the console until `:quit` or end of input.
pub fn serve<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
) -> io::Result<()> {
    info!("[console] Reading keys in {} mode", session.display_mode());

    'line_loop: for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("[console] {}", line);

        if line.starts_with(':') {
            match read_command(line) {
                Ok(Command::Quit) => break 'line_loop,
                Ok(Command::Clear) => session.clear(),
                Ok(Command::Back) => session.backspace(),
                Ok(Command::Levels) => {
                    write_levels(&mut output, session.levels(), session.display_mode())?
                }
                Ok(Command::Mode(mode)) => {
                    session.set_display_mode(mode);
                    writeln!(output, "display mode: {}", mode)?;
                }
                Err(err) => writeln!(output, "error: {}", err)?,
            }
        } else {
            let before = *session.levels();
            let result = session.take_line(line);
            // A command submitted before an error still went out.
            write_changes(&mut output, &before, session.levels(), session.display_mode())?;
            if let Err(err) = result {
                writeln!(output, "error: {}", err)?;
            }
        }

        write_prompt(&mut output, session)?;
    }

    output.flush()
}

/// Show the command line and which keys work next.
fn write_prompt<W: Write>(output: &mut W, session: &Session) -> io::Result<()> {
    let keypad = session.keypad();
    let mut keys: Vec<&str> = vec![];
    for kind in keypad.allowed() {
        match kind {
            TokenKind::Number => keys.push("0-9"),
            TokenKind::HexDigit if session.display_mode() == DisplayMode::Hex => keys.push("A-F"),
            TokenKind::HexDigit => {}
            TokenKind::Plus => keys.push("+"),
            TokenKind::Minus => keys.push("-"),
            TokenKind::Thru => keys.push("Thru"),
            TokenKind::At => keys.push("@"),
            TokenKind::Enter => {}
        }
    }
    if keypad.is_complete() {
        keys.push("Enter");
    }
    writeln!(output, "[{}] next: {}", keypad, keys.join(" "))
}

fn write_changes<W: Write>(
    output: &mut W,
    before: &LevelBuffer,
    after: &LevelBuffer,
    mode: DisplayMode,
) -> io::Result<()> {
    for (ix, (old, new)) in before.iter().zip(after.iter()).enumerate() {
        if old != new {
            writeln!(output, "{} @ {}", ix + DMX_MIN, levels::display_string(*new, mode))?;
        }
    }
    Ok(())
}

fn write_levels<W: Write>(
    output: &mut W,
    levels: &LevelBuffer,
    mode: DisplayMode,
) -> io::Result<()> {
    for (ix, level) in levels.iter().enumerate().filter(|(_, level)| **level > 0) {
        writeln!(output, "{} @ {}", ix + DMX_MIN, levels::display_string(*level, mode))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mode: DisplayMode, input: &str) -> (Session, String) {
        let mut session = Session::new(mode);
        let mut output = vec![];
        serve(&mut session, input.as_bytes(), &mut output).unwrap();
        (session, String::from_utf8(output).unwrap())
    }

    #[test]
    fn submit_prints_changes() {
        let (session, output) = run(DisplayMode::Percent, "1 thru 2 @ 50\n*\n");
        assert_eq!(
            output,
            "[1 Thru 2 @ 50] next: 0-9 Thru Enter\n1 @ 50%\n2 @ 50%\n[1 Thru 2 @ 50 *] next: 0-9\n"
        );
        assert_eq!(session.levels()[1], levels::PERCENT_LEVEL_TABLE[50]);
    }

    #[test]
    fn errors_do_not_stop_the_console() {
        let (session, output) = run(DisplayMode::Decimal, "1 @ ff\n:bogus\n:clear\n1 @ 9 *\n");
        assert!(output.contains("error: hex digits need hex display mode\n"));
        assert!(output.contains("error: unknown command: :bogus\n"));
        assert_eq!(session.levels()[0], 9);
    }

    #[test]
    fn meta_commands() {
        let (session, output) = run(
            DisplayMode::Percent,
            "12\n:back\n:clear\n3 @ 100 *\n:mode hex\n:levels\n:quit\n4 @ 1 *\n",
        );
        assert!(output.contains(
            "[12] next: 0-9 + - Thru @\n[1] next: 0-9 + - Thru @\n[] next: 0-9\n"
        ));
        assert!(output.contains("3 @ 100%\n"));
        assert!(output.contains("display mode: hex\n"));
        assert!(output.contains("\n3 @ FF\n"));
        assert_eq!(session.display_mode(), DisplayMode::Hex);
        // Nothing after :quit runs.
        assert_eq!(session.levels()[3], 0);
    }

    #[test]
    fn changes_shown_when_line_fails_after_submit() {
        let (session, output) = run(DisplayMode::Percent, "1 @ 50 * +\n");
        assert_eq!(output, "1 @ 50%\nerror: Plus is not allowed here\n[1 @ 50 *] next: 0-9\n");
        assert_eq!(session.levels()[0], levels::PERCENT_LEVEL_TABLE[50]);
    }

    #[test]
    fn hex_keys_only_offered_in_hex_mode() {
        let (_, output) = run(DisplayMode::Hex, "1 @\n");
        assert_eq!(output, "[1 @] next: 0-9 A-F + -\n");
        let (_, output) = run(DisplayMode::Percent, "1 @\n");
        assert_eq!(output, "[1 @] next: 0-9 + -\n");
    }

    #[test]
    fn commands_parse() {
        assert_eq!(read_command(":mode decimal"), Ok(Command::Mode(DisplayMode::Decimal)));
        assert!(read_command(":mode octal").is_err());
        assert!(read_command(":clear now").is_err());
    }
}
