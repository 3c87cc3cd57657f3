//! Typed key parser: turns `1 thru 5 @ 50 *` into keypad keys.

use thiserror::Error;

use crate::cmdline::Token;

/// Key buffer and line parser.
pub struct KeyParser {
    /// Keys parsed from the last line, one per key press.
    pub keys: Vec<Token>,
}

pub type ParserResult<T> = Result<T, ParserError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("unknown key: {0}")]
    UnknownWord(String),
    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char),
}

impl KeyParser {
    pub fn new() -> KeyParser {
        KeyParser { keys: vec![] }
    }

    /// Parse a whole line of keys. On error, `keys` holds what came before it.
    pub fn read_from(&mut self, line: &str) -> ParserResult<()> {
        self.keys.clear();

        let mut word = String::new();
        for c in line.chars() {
            if c.is_alphanumeric() {
                word.push(c);
                continue;
            }
            self.read_word(&word)?;
            word.clear();

            match c {
                '+' => self.keys.push(Token::Plus),
                // Accept the console's U+2212 as well as a plain dash.
                '-' | '\u{2212}' => self.keys.push(Token::Minus),
                '@' => self.keys.push(Token::At),
                '*' => self.keys.push(Token::Enter),
                c if c.is_whitespace() => {}
                c => return Err(ParserError::UnexpectedChar(c)),
            }
        }
        self.read_word(&word)
    }

    /// A keyword, or a run of digit keys.
    fn read_word(&mut self, word: &str) -> ParserResult<()> {
        match word.to_ascii_lowercase().as_str() {
            "" => {}
            "thru" | "t" => self.keys.push(Token::Thru),
            "at" => self.keys.push(Token::At),
            "enter" => self.keys.push(Token::Enter),
            lower => {
                if !lower.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ParserError::UnknownWord(word.to_owned()));
                }
                for c in word.chars() {
                    if c.is_ascii_digit() {
                        self.keys.push(Token::number(c.to_string()));
                    } else {
                        self.keys.push(Token::hex_digit(c.to_ascii_uppercase().to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for KeyParser {
    fn default() -> Self {
        KeyParser::new()
    }
}
