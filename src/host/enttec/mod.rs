//! Enttec DMX USB Pro support.

use std::io::{self, Write};
use std::time::Duration;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, info};

use super::OutputHost;
use crate::levels::{LevelBuffer, UNIVERSE_SIZE};

const BAUD_RATE: u32 = 57600;
const START_OF_MESSAGE: u8 = 0x7e;
const END_OF_MESSAGE: u8 = 0xe7;
/// "Output Only Send DMX Packet Request"
const LABEL_SEND_DMX: u8 = 6;
/// Null start code for dimmer data.
const DMX_START_CODE: u8 = 0;

/// The Enttec host passes levels to an Enttec DMX controller
/// connected through its USB serial port.
pub struct Enttec {
    /// Output port. Without one, flushes go nowhere.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// Levels to send on the next flush.
    payload: LevelBuffer,
}

impl Enttec {
    /// Construct a new Enttec output, opening the serial port at `path` if given.
    pub fn new(path: Option<&str>) -> io::Result<Enttec> {
        info!("Enttec @ {:?}", path);
        let port = match path {
            Some(path) => Some(
                serialport::new(path, BAUD_RATE)
                    .timeout(Duration::from_millis(100))
                    .open()?,
            ),
            None => None,
        };

        Ok(Enttec {
            payload: [0; UNIVERSE_SIZE],
            port,
        })
    }

    /// Levels that will go out on the next flush.
    pub fn payload(&self) -> &LevelBuffer {
        &self.payload
    }
}

/// Write one "send DMX" message for `levels`.
pub fn write_frame<W: Write>(writer: &mut W, levels: &LevelBuffer) -> io::Result<()> {
    writer.write_u8(START_OF_MESSAGE)?;
    writer.write_u8(LABEL_SEND_DMX)?;
    // Data length counts the start code.
    writer.write_u16::<LittleEndian>(UNIVERSE_SIZE as u16 + 1)?;
    writer.write_u8(DMX_START_CODE)?;
    writer.write_all(levels)?;
    writer.write_u8(END_OF_MESSAGE)?;
    Ok(())
}

impl OutputHost for Enttec {
    fn take_levels(&mut self, levels: &LevelBuffer) {
        self.payload = *levels;
    }

    /// Flush current buffer into the bus.
    ///
    /// Call this after taking the levels.
    fn flush(&mut self) -> io::Result<()> {
        match self.port.as_mut() {
            Some(port) => {
                let mut writer = io::BufWriter::with_capacity(UNIVERSE_SIZE + 6, port);
                write_frame(&mut writer, &self.payload)?;
                writer.flush()?;
                debug!("Wrote DMX controller payload");
            }
            None => debug!("No Enttec port, dropping payload"),
        }
        Ok(())
    }
}
