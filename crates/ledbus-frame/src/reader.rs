use std::io::{ErrorKind, Read};

use crate::codec::Frame;
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads delimiter-terminated frames from any `Read` stream.
///
/// Drives a [`FrameDecoder`] over buffered chunks, so callers always get
/// complete frames regardless of how the transport fragments its reads.
pub struct FrameReader<T> {
    inner: T,
    decoder: FrameDecoder,
    buf: Vec<u8>,
    pos: usize,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
            buf: Vec::with_capacity(READ_CHUNK_SIZE),
            pos: 0,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` at end of stream; a partial frame in flight is
    /// discarded. Wire errors are recoverable: the decoder has already
    /// resynchronized, so the next call keeps reading.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            while self.pos < self.buf.len() {
                let byte = self.buf[self.pos];
                self.pos += 1;
                if let Some(frame) = self.decoder.push(byte)? {
                    return Ok(Some(frame));
                }
            }

            self.buf.clear();
            self.pos = 0;
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Ok(None);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
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
}
