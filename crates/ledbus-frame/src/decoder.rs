use bytes::{BufMut, BytesMut};

use crate::codec::{unescape, Frame, ESCAPE, START};
use crate::error::{FrameError, Result};

/// Synchronization state of the delimiter-terminated decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Discarding bytes until a start-of-frame marker is seen.
    SeekingStart,
    /// Accumulating frame bytes.
    InFrame,
    /// The previous byte was the escape introducer.
    AfterEscape,
}

/// Push-based decoder for delimiter-terminated frames.
///
/// Feed bytes one at a time with [`push`](FrameDecoder::push); a completed
/// frame is returned as soon as its terminating start marker arrives. The
/// decoder is resumable at any byte boundary, so it can be driven from a
/// blocking read loop, a poll loop, or a callback alike.
///
/// A protocol violation resets the decoder to its seeking state; the current
/// partial frame is discarded and decoding resumes at the next start marker.
#[derive(Debug)]
pub struct FrameDecoder {
    state: SyncState,
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create a decoder that is seeking its first start-of-frame marker.
    pub fn new() -> Self {
        Self {
            state: SyncState::SeekingStart,
            buf: BytesMut::new(),
        }
    }

    /// Returns true if the decoder has locked onto a frame boundary.
    pub fn is_synchronized(&self) -> bool {
        self.state != SyncState::SeekingStart
    }

    /// Discard any partial frame and seek the next start marker.
    pub fn reset(&mut self) {
        self.state = SyncState::SeekingStart;
        self.buf.clear();
    }

    /// Consume one byte from the stream.
    ///
    /// Returns `Ok(Some(frame))` when the byte completes a frame. Two
    /// consecutive start markers delimit nothing and are skipped: a frame
    /// needs at least an address byte.
    pub fn push(&mut self, byte: u8) -> Result<Option<Frame>> {
        match self.state {
            SyncState::SeekingStart => {
                if byte == START {
                    self.state = SyncState::InFrame;
                    self.buf.clear();
                } else {
                    tracing::trace!(byte, "discarding byte while seeking frame start");
                }
                Ok(None)
            }
            SyncState::InFrame => match byte {
                ESCAPE => {
                    self.state = SyncState::AfterEscape;
                    Ok(None)
                }
                START => {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    let raw = self.buf.split().freeze();
                    let address = raw[0];
                    Ok(Some(Frame {
                        address,
                        payload: raw.slice(1..),
                    }))
                }
                _ => {
                    self.buf.put_u8(byte);
                    Ok(None)
                }
            },
            SyncState::AfterEscape => match unescape(byte) {
                Some(literal) => {
                    self.buf.put_u8(literal);
                    self.state = SyncState::InFrame;
                    Ok(None)
                }
                None => {
                    self.reset();
                    Err(FrameError::InvalidEscape { byte })
                }
            },
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
