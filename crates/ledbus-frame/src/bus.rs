use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::fixed_payload_len;
use crate::codec::{unescape, Frame, ESCAPE, START};
use crate::error::{FrameError, Result};
use crate::lengths::ModuleLengths;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Length-aware frame reader for module buses.
///
/// Delimiter-terminated decoding cannot tell a payload byte that happens to
/// equal the start marker from an actual frame boundary. When the expected
/// channel count of every module is known, the reader can instead consume
/// exactly the right number of raw bytes per frame; a literal start marker
/// inside that window then unambiguously signals desynchronization.
///
/// Escape bytes lengthen the raw window: every escape introducer consumes one
/// extra raw byte for its code, which is pulled in by a fixed-point loop
/// (each batch of newly read bytes is scanned for escapes, and that many more
/// bytes are read, until a batch contributes none).
///
/// Wire errors are recoverable: the reader resynchronizes at the next start
/// marker and subsequent calls keep decoding.
pub struct BusReader<T> {
    inner: T,
    lengths: ModuleLengths,
    buf: Vec<u8>,
    pos: usize,
    /// True when the next unread byte is a frame's leading byte (the start
    /// marker has already been consumed).
    synced: bool,
}

impl<T: Read> BusReader<T> {
    /// Create a reader over a byte source with a fixed module length table.
    pub fn new(inner: T, lengths: ModuleLengths) -> Self {
        Self {
            inner,
            lengths,
            buf: Vec::with_capacity(READ_CHUNK_SIZE),
            pos: 0,
            synced: false,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` at end of stream; a partially received frame is
    /// discarded, which is a truncated session rather than an error.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if !self.synced {
                match self.seek_start()? {
                    true => self.synced = true,
                    false => return Ok(None),
                }
            }

            let lead = match self.next_byte()? {
                Some(byte) => byte,
                None => return Ok(None),
            };

            // Consecutive start markers delimit nothing; stay at the frame
            // boundary and try again.
            if lead == START {
                continue;
            }

            let address = if lead == ESCAPE {
                let code = match self.next_byte()? {
                    Some(byte) => byte,
                    None => return Ok(None),
                };
                match unescape(code) {
                    Some(literal) => literal,
                    None => {
                        self.synced = false;
                        return Err(FrameError::InvalidEscape { byte: code });
                    }
                }
            } else {
                lead
            };

            // Strobe frames and host-level opcodes have fixed layouts; only
            // module addresses consult the length table.
            if let Some(expected) = fixed_payload_len(address) {
                if expected == 0 {
                    self.synced = false;
                    return Ok(Some(Frame::new(address, Bytes::new())));
                }
                return self.read_channel_run(address, expected);
            }

            let expected = match self.lengths.get(address) {
                Some(len) => len,
                None => {
                    self.synced = false;
                    return Err(FrameError::UnknownAddress { address });
                }
            };

            return self.read_channel_run(address, expected);
        }
    }

    /// Read a frame's raw payload window, extend it past escapes, and
    /// unescape it.
    fn read_channel_run(&mut self, address: u8, expected: usize) -> Result<Option<Frame>> {
        let mut raw = Vec::with_capacity(expected);
        let mut need = expected;
        while need > 0 {
            let mut new_escapes = 0usize;
            for _ in 0..need {
                let byte = match self.next_byte()? {
                    Some(byte) => byte,
                    None => return Ok(None),
                };
                if byte == START {
                    // The marker itself is the resynchronization point: the
                    // next unread byte is treated as a frame's leading byte.
                    self.synced = true;
                    return Err(FrameError::UnexpectedSync);
                }
                if byte == ESCAPE {
                    new_escapes += 1;
                }
                raw.push(byte);
            }
            need = new_escapes;
        }

        let mut payload = BytesMut::with_capacity(expected);
        let mut bytes = raw.iter();
        while let Some(&byte) = bytes.next() {
            if byte == ESCAPE {
                // The fixed-point loop guarantees every escape has its code
                // byte in the window.
                let &code = bytes.next().unwrap_or(&ESCAPE);
                match unescape(code) {
                    Some(literal) => payload.put_u8(literal),
                    None => {
                        self.synced = false;
                        return Err(FrameError::InvalidEscape { byte: code });
                    }
                }
            } else {
                payload.put_u8(byte);
            }
        }

        self.synced = false;
        Ok(Some(Frame::new(address, payload.freeze())))
    }

    /// Discard bytes until a start marker has been consumed. Returns false
    /// at end of stream.
    fn seek_start(&mut self) -> Result<bool> {
        loop {
            match self.next_byte()? {
                Some(byte) if byte == START => return Ok(true),
                Some(byte) => {
                    tracing::trace!(byte, "discarding byte while seeking frame start");
                }
                None => return Ok(false),
            }
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            loop {
                match self.inner.read(&mut chunk) {
                    Ok(0) => return Ok(None),
                    Ok(n) => {
                        self.buf.extend_from_slice(&chunk[..n]);
                        break;
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => return Err(FrameError::Io(err)),
                }
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The module length table this reader decodes against.
    pub fn lengths(&self) -> &ModuleLengths {
        &self.lengths
    }
}
