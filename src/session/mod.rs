//! An operator session: one keypad driving one universe of levels.

use std::io;

use thiserror::Error;
use tracing::{info, warn};

use crate::cmdline::{Keypad, KeypadError, Token};
use crate::config::{self, Root};
use crate::host::{self, OutputHost};
use crate::levels::{DisplayMode, LevelBuffer, UNIVERSE_SIZE};
use crate::parser::{KeyParser, ParserError};

/// Sessions read keys, keep the levels and hand them to output hosts.
pub struct Session {
    /// Current levels.
    levels: LevelBuffer,
    /// Command line being typed.
    keypad: Keypad,
    /// Key parser/buffer.
    parser: KeyParser,
    /// Units levels are typed and shown in.
    display_mode: DisplayMode,
    /// Configured output hosts.
    hosts: Vec<Box<dyn OutputHost>>,
}

/// Result type for various Session actions.
pub type SessionResult<T> = Result<T, SessionError>;

/// Various runtime errors for the Session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The parser couldn't understand the line.
    #[error(transparent)]
    Parser(#[from] ParserError),
    /// The keypad refused a key.
    #[error(transparent)]
    Keypad(#[from] KeypadError),
    /// Hex digits typed while levels aren't shown in hex.
    #[error("hex digits need hex display mode")]
    HexDisabled,
    /// Setting up a host failed.
    #[error("host {0}: {1}")]
    Host(String, #[source] io::Error),
}

impl Session {
    /// A session with all levels at zero and nowhere to send them.
    pub fn new(display_mode: DisplayMode) -> Session {
        Session {
            levels: [0; UNIVERSE_SIZE],
            keypad: Keypad::new(),
            parser: KeyParser::new(),
            display_mode,
            hosts: vec![],
        }
    }

    /// Try to set up a session and its output hosts from a configuration.
    pub fn from_config(config: &Root) -> SessionResult<Session> {
        let mut session = Session::new(config.settings.display_mode);

        for (id, host) in &config.hosts {
            let output: Box<dyn OutputHost> = match host {
                config::Host::Enttec { path } => Box::new(
                    host::Enttec::new(path.as_deref())
                        .map_err(|err| SessionError::Host(id.clone(), err))?,
                ),
            };
            session.add_host(output);
        }

        Ok(session)
    }

    pub fn add_host(&mut self, host: Box<dyn OutputHost>) {
        self.hosts.push(host);
    }

    pub fn levels(&self) -> &LevelBuffer {
        &self.levels
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Switch level units. A half-typed line is dropped, since its level
    /// digits were typed in the old units.
    pub fn set_display_mode(&mut self, display_mode: DisplayMode) {
        if display_mode != self.display_mode {
            self.keypad.clear();
        }
        self.display_mode = display_mode;
    }

    pub fn clear(&mut self) {
        self.keypad.clear();
    }

    pub fn backspace(&mut self) {
        self.keypad.backspace();
    }

    /// Read a line of keys and press them in order.
    ///
    /// Returns the new levels if the line submitted a command. Keys pressed
    /// before an error stay on the keypad, and a command submitted before
    /// the error has already been applied and sent.
    pub fn take_line(&mut self, line: &str) -> SessionResult<Option<LevelBuffer>> {
        self.parser.read_from(line)?;

        let mut submitted = None;
        for key in &self.parser.keys {
            match key {
                Token::Enter => {
                    let levels = self.keypad.enter(&self.levels, self.display_mode)?;
                    self.levels = levels;
                    Self::send_levels(&mut self.hosts, &levels);
                    submitted = Some(levels);
                }
                Token::HexDigit(_) if self.display_mode != DisplayMode::Hex => {
                    return Err(SessionError::HexDisabled);
                }
                key => self.keypad.push(key.clone())?,
            }
        }
        Ok(submitted)
    }

    fn send_levels(hosts: &mut [Box<dyn OutputHost>], levels: &LevelBuffer) {
        info!("Sending levels to {} host(s)", hosts.len());
        for host in hosts {
            host.take_levels(levels);
            if let Err(err) = host.flush() {
                warn!("Host flush failed: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::PERCENT_LEVEL_TABLE;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Host that records every flush.
    struct Recorder {
        pending: Option<LevelBuffer>,
        flushed: Rc<RefCell<Vec<LevelBuffer>>>,
        fail: bool,
    }

    impl OutputHost for Recorder {
        fn take_levels(&mut self, levels: &LevelBuffer) {
            self.pending = Some(*levels);
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            if let Some(levels) = self.pending.take() {
                self.flushed.borrow_mut().push(levels);
            }
            Ok(())
        }
    }

    fn recording_session(mode: DisplayMode) -> (Session, Rc<RefCell<Vec<LevelBuffer>>>) {
        let flushed = Rc::new(RefCell::new(vec![]));
        let mut session = Session::new(mode);
        session.add_host(Box::new(Recorder {
            pending: None,
            flushed: flushed.clone(),
            fail: false,
        }));
        (session, flushed)
    }

    #[test]
    fn line_with_enter_updates_and_flushes() {
        let (mut session, flushed) = recording_session(DisplayMode::Percent);
        let levels = session.take_line("1 thru 3 @ 50 *").unwrap().unwrap();
        assert!(levels[0..3].iter().all(|&level| level == PERCENT_LEVEL_TABLE[50]));
        assert_eq!(levels[3], 0);
        assert_eq!(session.levels(), &levels);
        assert_eq!(flushed.borrow().len(), 1);
        assert_eq!(flushed.borrow()[0], levels);
    }

    #[test]
    fn keys_carry_over_lines() {
        let (mut session, flushed) = recording_session(DisplayMode::Percent);
        assert_eq!(session.take_line("1 thru").unwrap(), None);
        assert_eq!(session.take_line("5 @").unwrap(), None);
        assert_eq!(session.take_line("1").unwrap(), None);
        assert_eq!(session.take_line("00").unwrap(), None);
        assert_eq!(session.keypad().to_string(), "1 Thru 5 @ 100");
        let levels = session.take_line("enter").unwrap().unwrap();
        assert!(levels[0..5].iter().all(|&level| level == 255));
        assert_eq!(flushed.borrow().len(), 1);
    }

    #[test]
    fn incomplete_enter_is_an_error() {
        let (mut session, flushed) = recording_session(DisplayMode::Percent);
        let err = session.take_line("1 @ *").unwrap_err();
        assert!(matches!(err, SessionError::Keypad(KeypadError::Incomplete)));
        assert_eq!(session.keypad().to_string(), "1 @");
        assert!(flushed.borrow().is_empty());
    }

    #[test]
    fn illegal_key_keeps_earlier_keys() {
        let mut session = Session::new(DisplayMode::Percent);
        let err = session.take_line("1 thru @").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Keypad(KeypadError::NotAllowed(crate::cmdline::TokenKind::At))
        ));
        assert_eq!(session.keypad().to_string(), "1 Thru");
    }

    #[test]
    fn error_after_submit_keeps_the_submit() {
        let (mut session, flushed) = recording_session(DisplayMode::Percent);
        let err = session.take_line("1 @ 50 * +").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Keypad(KeypadError::NotAllowed(crate::cmdline::TokenKind::Plus))
        ));
        assert_eq!(session.levels()[0], PERCENT_LEVEL_TABLE[50]);
        assert_eq!(session.keypad().to_string(), "1 @ 50 *");
        assert_eq!(flushed.borrow().len(), 1);
    }

    #[test]
    fn mode_switch_drops_half_typed_line() {
        let mut session = Session::new(DisplayMode::Hex);
        assert_eq!(session.take_line("1 @ 5a").unwrap(), None);
        session.set_display_mode(DisplayMode::Percent);
        assert!(session.keypad().is_empty());
        assert!(matches!(
            session.take_line("*"),
            Err(SessionError::Keypad(KeypadError::Incomplete))
        ));
        assert_eq!(session.levels()[0], 0);

        assert_eq!(session.take_line("2 @ 10").unwrap(), None);
        session.set_display_mode(DisplayMode::Percent);
        assert_eq!(session.keypad().to_string(), "2 @ 10");
    }

    #[test]
    fn hex_digits_need_hex_mode() {
        let mut session = Session::new(DisplayMode::Decimal);
        assert!(matches!(session.take_line("1 @ ff"), Err(SessionError::HexDisabled)));

        let mut session = Session::new(DisplayMode::Hex);
        let levels = session.take_line("1 @ ff *").unwrap().unwrap();
        assert_eq!(levels[0], 255);
        let levels = session.take_line("2 @ 80 *").unwrap().unwrap();
        assert_eq!(levels[1], 0x80);
        assert_eq!(levels[0], 255);
    }

    #[test]
    fn parser_errors_pass_through() {
        let mut session = Session::new(DisplayMode::Percent);
        assert!(matches!(session.take_line("1 @ full"), Err(SessionError::Parser(_))));
    }

    #[test]
    fn failing_host_does_not_block_submit() {
        let mut session = Session::new(DisplayMode::Decimal);
        session.add_host(Box::new(Recorder {
            pending: None,
            flushed: Rc::new(RefCell::new(vec![])),
            fail: true,
        }));
        let levels = session.take_line("7 @ 70 *").unwrap().unwrap();
        assert_eq!(levels[6], 70);
        assert_eq!(session.levels()[6], 70);
    }

    #[test]
    fn from_config_builds_hosts() {
        let mut root = Root::default();
        root.settings.display_mode = DisplayMode::Hex;
        root.hosts.insert("dry".to_owned(), config::Host::Enttec { path: None });
        let mut session = Session::from_config(&root).unwrap();
        assert_eq!(session.display_mode(), DisplayMode::Hex);
        assert_eq!(session.take_line("1@a*").unwrap().map(|levels| levels[0]), Some(0x0a));
    }
}
