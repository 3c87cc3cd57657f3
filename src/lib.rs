//! Console-style keypad for setting DMX levels: `1 Thru 5 - 3 @ 50`.

pub mod cmdline;
pub mod config;
pub mod console;
pub mod host;
pub mod levels;
pub mod parser;
pub mod session;
