use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};

use ledbus_frame::FrameWriter;
use ledbus_proto::Command;

use crate::error::{ClientError, Result};

/// Default TCP port of a ledbus router.
pub const DEFAULT_PORT: u16 = 7534;

/// A connected bus controller.
///
/// Authenticates on construction, then exposes one method per command.
/// Every call writes exactly one frame as a unit, so multiple controllers
/// feeding separate sinks never interleave frame bytes.
#[derive(Debug)]
pub struct Controller<T> {
    writer: FrameWriter<T>,
}

impl<T: Write> Controller<T> {
    /// Wrap a byte sink and authenticate with `token` (at most 16 bytes,
    /// zero-padded on the wire).
    pub fn new(sink: T, token: &[u8]) -> Result<Self> {
        let mut controller = Self {
            writer: FrameWriter::new(sink),
        };
        controller.send(&Command::authenticate(token)?)?;
        Ok(controller)
    }

    /// Set one LED with 8-bit precision. Takes effect on the next strobe.
    pub fn set_led(&mut self, led: u16, rgba: [u8; 4]) -> Result<()> {
        self.send(&Command::SetLed {
            led,
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        })
    }

    /// Set one LED with 16-bit precision. Takes effect on the next strobe.
    pub fn set_led_hi(&mut self, led: u16, rgba: [u16; 4]) -> Result<()> {
        self.send(&Command::HighResSetLed {
            led,
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        })
    }

    /// Write raw channel values to one module. Takes effect on the next
    /// strobe.
    pub fn set_channels(&mut self, address: u8, channels: &[u8]) -> Result<()> {
        self.send(&Command::set_channels(address, channels)?)
    }

    /// Latch all buffered channel writes.
    pub fn strobe(&mut self) -> Result<()> {
        self.send(&Command::Strobe)
    }

    /// Encode and write one command frame.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let frame = command.encode();
        tracing::trace!(address = frame.address, len = frame.payload.len(), "sending frame");
        self.writer.write_frame(&frame)?;
        Ok(())
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        self.writer.get_mut()
    }

    /// Consume the controller and return the sink.
    pub fn into_inner(self) -> T {
        self.writer.into_inner()
    }
}

impl Controller<TcpStream> {
    /// Connect to a router over TCP and authenticate.
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug, token: &[u8]) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|source| ClientError::Connect {
            addr: format!("{addr:?}"),
            source,
        })?;
        tracing::debug!(addr = ?addr, "connected");
        Self::new(stream, token)
    }
}
