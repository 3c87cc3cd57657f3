//! Console-style command line: `1 Thru 5 - 3 @ 50`.
//!
//! Everything left of `@` picks addresses, everything right of it says what
//! to do with their levels. The functions here are pure; [`Keypad`] is the
//! editing state built on top of them.

use std::collections::BTreeSet;
use std::fmt;

use crate::levels::{self, DisplayMode, LevelBuffer, DMX_MAX, DMX_MIN};

mod keypad;
pub use self::keypad::{Keypad, KeypadError};


/// One key's worth of command line input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Decimal digits. Consecutive digit keys accumulate into one token.
    Number(String),
    /// Digits entered with the A-F keys, only valid in a hex level.
    HexDigit(String),
    Plus,
    Minus,
    Thru,
    At,
    /// Marks a submitted line. Carries no meaning for the level update.
    Enter,
}

/// Discriminant of a [`Token`], used to enable and disable keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Number,
    HexDigit,
    Plus,
    Minus,
    Thru,
    At,
    Enter,
}

impl Token {
    pub fn number(digits: impl Into<String>) -> Token {
        Token::Number(digits.into())
    }

    pub fn hex_digit(digits: impl Into<String>) -> Token {
        Token::HexDigit(digits.into())
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number(_) => TokenKind::Number,
            Token::HexDigit(_) => TokenKind::HexDigit,
            Token::Plus => TokenKind::Plus,
            Token::Minus => TokenKind::Minus,
            Token::Thru => TokenKind::Thru,
            Token::At => TokenKind::At,
            Token::Enter => TokenKind::Enter,
        }
    }

    /// Digit text for number-like tokens.
    pub fn digits(&self) -> Option<&str> {
        match self {
            Token::Number(digits) | Token::HexDigit(digits) => Some(digits),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.digits().is_some()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(digits) | Token::HexDigit(digits) => f.write_str(digits),
            Token::Plus => f.write_str("+"),
            // U+2212, not a dash.
            Token::Minus => f.write_str("\u{2212}"),
            Token::Thru => f.write_str("Thru"),
            Token::At => f.write_str("@"),
            Token::Enter => f.write_str("*"),
        }
    }
}

/// Which token kinds may be appended to `cmdline`.
pub fn allowed_tokens(cmdline: &[Token]) -> BTreeSet<TokenKind> {
    use TokenKind::*;

    let last = match cmdline.last() {
        Some(last) => last,
        // A line always starts with an address.
        None => return [Number].into_iter().collect(),
    };

    let in_level = cmdline.iter().any(|token| *token == Token::At);
    let mut allowed: BTreeSet<TokenKind> = match last {
        Token::Number(_) | Token::HexDigit(_) if !in_level => {
            [Number, Plus, Minus, Thru, At].into_iter().collect()
        }
        Token::Number(_) | Token::HexDigit(_) => [Number, Thru].into_iter().collect(),
        Token::Plus | Token::Minus | Token::Thru => [Number].into_iter().collect(),
        Token::At => [Number, Plus, Minus].into_iter().collect(),
        // The next key after a submitted line starts a new one.
        Token::Enter => return [Number].into_iter().collect(),
    };

    // Hex digits only ever make sense in a level.
    if in_level && allowed.contains(&Number) {
        allowed.insert(HexDigit);
    }
    allowed
}

/// True when `cmdline` has a selection, an `@` and ends on a level number.
pub fn is_complete(cmdline: &[Token]) -> bool {
    let at = match cmdline.iter().position(|token| *token == Token::At) {
        Some(at) => at,
        None => return false,
    };
    cmdline[at + 1..].last().map_or(false, Token::is_number)
}

/// Parse the leading run of valid digits, the way a keypad reads them.
///
/// Saturates instead of overflowing; `None` if there is no leading digit.
fn parse_value(digits: &str, radix: u32) -> Option<u32> {
    let mut value: Option<u32> = None;
    for c in digits.chars() {
        let digit = match c.to_digit(radix) {
            Some(digit) => digit,
            None => break,
        };
        value = Some(value.unwrap_or(0).saturating_mul(radix).saturating_add(digit));
    }
    value
}

/// Addresses in the order they were first added.
#[derive(Debug, Default)]
struct Selection {
    addrs: Vec<usize>,
    present: BTreeSet<usize>,
}

impl Selection {
    fn add_range(&mut self, start: usize, end: usize) {
        for addr in start..=end {
            if self.present.insert(addr) {
                self.addrs.push(addr);
            }
        }
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        if start > end {
            return;
        }
        self.addrs.retain(|addr| !(start..=end).contains(addr));
        self.present.retain(|addr| !(start..=end).contains(addr));
    }

    fn len(&self) -> usize {
        self.addrs.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Absolute,
    Raise,
    Lower,
}

/// Walk the address part of the line, stopping after the `@`.
///
/// Returns the selection and the index of the first level token.
fn read_selection(cmdline: &[Token]) -> (Selection, usize) {
    let mut selection = Selection::default();
    let mut op = SetOp::Add;
    let mut thru = false;
    let mut last_number: u32 = 1;

    for (ix, token) in cmdline.iter().enumerate() {
        match token {
            Token::Number(digits) | Token::HexDigit(digits) => {
                let value = match parse_value(digits, 10) {
                    Some(value) => value,
                    None => continue,
                };
                let start = if thru { last_number } else { value };
                let start = (start as usize).max(DMX_MIN);
                let end = (value as usize).min(DMX_MAX);
                match op {
                    SetOp::Add => selection.add_range(start, end),
                    SetOp::Remove => selection.remove_range(start, end),
                }
                last_number = value;
            }
            Token::Plus => {
                op = SetOp::Add;
                thru = false;
            }
            Token::Minus => {
                op = SetOp::Remove;
                thru = false;
            }
            Token::Thru => thru = true,
            Token::At => return (selection, ix + 1),
            Token::Enter => {}
        }
    }
    (selection, cmdline.len())
}

/// Walk the level part of the line.
///
/// Returns the levels to hand out to the selection (in operator units) and
/// how to combine them with what's already there.
fn read_levels(tokens: &[Token], selection_len: usize, mode: DisplayMode) -> (Vec<f64>, Change) {
    let mut level_range: Vec<f64> = vec![];
    let mut change = Change::Absolute;
    let mut thru = false;

    for token in tokens {
        match token {
            Token::Number(digits) | Token::HexDigit(digits) => {
                let value = match parse_value(digits, mode.radix()) {
                    Some(value) => f64::from(value),
                    None => continue,
                };
                if !thru {
                    level_range = vec![value];
                    continue;
                }

                // 1 Thru 5 @ 10 Thru 50 => 1@10, 2@20, 3@30, 4@40, 5@50
                let start = level_range.first().copied().unwrap_or(value);
                level_range.clear();
                if selection_len > 1 {
                    let step = (value - start) / (selection_len - 1) as f64;
                    level_range.extend((0..selection_len).map(|i| start + i as f64 * step));
                }
            }
            Token::Plus => {
                change = Change::Raise;
                thru = false;
            }
            Token::Minus => {
                change = Change::Lower;
                thru = false;
            }
            Token::Thru => {
                change = Change::Absolute;
                thru = true;
            }
            Token::At | Token::Enter => {}
        }
    }
    (level_range, change)
}

/// Compute new levels from a complete command line.
///
/// Incomplete lines, and complete ones that don't produce a level, leave
/// `levels` as it was.
pub fn apply_command_line(
    cmdline: &[Token],
    levels: &LevelBuffer,
    mode: DisplayMode,
) -> LevelBuffer {
    let mut levels = *levels;
    if !is_complete(cmdline) {
        return levels;
    }

    let (selection, level_start) = read_selection(cmdline);
    let (level_range, change) = read_levels(&cmdline[level_start..], selection.len(), mode);
    if level_range.is_empty() {
        // "1 @ Enter" does nothing.
        return levels;
    }

    for (i, &addr) in selection.addrs.iter().enumerate() {
        if !(DMX_MIN..=DMX_MAX).contains(&addr) {
            continue;
        }
        let current = levels::actual_to_user(levels[addr - 1], mode);
        // A short level list repeats across a longer selection.
        let level = level_range[i % level_range.len()];
        let new_level = match change {
            Change::Absolute => level,
            Change::Raise => current + level,
            Change::Lower => current - level,
        };
        levels[addr - 1] = levels::user_to_actual(new_level, mode);
    }

    levels
}
