//! Key-by-key editing of a command line.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::{allowed_tokens, apply_command_line, is_complete, Token, TokenKind};
use crate::levels::{DisplayMode, LevelBuffer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeypadError {
    #[error("{0:?} is not allowed here")]
    NotAllowed(TokenKind),
    #[error("command line is incomplete")]
    Incomplete,
}

/// The command line as the operator is typing it.
///
/// Only accepts keys that [`allowed_tokens`] allows, so the line is always
/// a legal prefix.
#[derive(Debug, Clone, Default)]
pub struct Keypad {
    tokens: Vec<Token>,
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad { tokens: vec![] }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn allowed(&self) -> BTreeSet<TokenKind> {
        allowed_tokens(&self.tokens)
    }

    pub fn is_complete(&self) -> bool {
        is_complete(&self.tokens)
    }

    /// Press a key.
    ///
    /// A digit pressed after a digit extends that number instead of starting
    /// a new token. The first key after a submitted line starts a new line.
    pub fn push(&mut self, token: Token) -> Result<(), KeypadError> {
        if token == Token::Enter {
            return Err(KeypadError::NotAllowed(TokenKind::Enter));
        }
        let submitted = self.tokens.last() == Some(&Token::Enter);
        let allowed = if submitted { allowed_tokens(&[]) } else { self.allowed() };
        if !allowed.contains(&token.kind()) {
            return Err(KeypadError::NotAllowed(token.kind()));
        }
        if submitted {
            self.tokens.clear();
        }

        let extends_number =
            token.is_number() && self.tokens.last().map_or(false, Token::is_number);
        if !extends_number {
            self.tokens.push(token);
            return Ok(());
        }
        if let (Some(digits), Some(Token::Number(last) | Token::HexDigit(last))) =
            (token.digits(), self.tokens.last_mut())
        {
            last.push_str(digits);
        }
        Ok(())
    }

    /// Remove the last digit, or the last token if it isn't a longer number.
    pub fn backspace(&mut self) {
        match self.tokens.last_mut() {
            Some(Token::Number(digits) | Token::HexDigit(digits)) if digits.chars().count() > 1 => {
                digits.pop();
            }
            Some(_) => {
                self.tokens.pop();
            }
            None => {}
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Submit the line against `levels`.
    ///
    /// The line stays visible (ending in `Enter`) until the next key press.
    pub fn enter(
        &mut self,
        levels: &LevelBuffer,
        mode: DisplayMode,
    ) -> Result<LevelBuffer, KeypadError> {
        if !self.is_complete() {
            return Err(KeypadError::Incomplete);
        }
        let new_levels = apply_command_line(&self.tokens, levels, mode);
        self.tokens.push(Token::Enter);
        Ok(new_levels)
    }
}

impl fmt::Display for Keypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, token) in self.tokens.iter().enumerate() {
            if ix > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}
