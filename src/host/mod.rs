//! Output hosts take finished level buffers and put them on a DMX line.

use std::io;

use crate::levels::LevelBuffer;

pub mod enttec;
pub use self::enttec::Enttec;

/// Output hosts accept a universe of levels and pass them to an Enttec-like device.
pub trait OutputHost {
    /// Accept the levels for the whole universe.
    fn take_levels(&mut self, levels: &LevelBuffer);
    /// Write the current buffer to the device.
    fn flush(&mut self) -> io::Result<()>;
}
