use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete frames to any `Write` stream.
///
/// Each frame is encoded into an internal buffer, written out as a unit and
/// flushed, so two producers writing to separate sinks can never interleave
/// a frame's bytes on the wire.
#[derive(Debug)]
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.address, frame.payload.as_ref())
    }

    /// Encode and send a payload to an address.
    pub fn send(&mut self, address: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(address, payload, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::bus::BusReader;
    use crate::lengths::ModuleLengths;

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x04, &[1, 0x54, 0x55]).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0x55, 0x04, 1, 0x54, 0x00, 0x54, 0x01]);
    }

    #[test]
    fn written_frames_decode_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x04, &[0x54, 0x55, 0x20]).unwrap();
        writer.write_frame(&Frame::strobe()).unwrap();

        let wire = writer.into_inner().into_inner();
        let lengths: ModuleLengths = [(0x04u8, 3usize)].into_iter().collect();
        let mut reader = BusReader::new(Cursor::new(wire), lengths);

        assert_eq!(
            reader.read_frame().unwrap().unwrap(),
            Frame::new(0x04, vec![0x54, 0x55, 0x20])
        );
        assert!(reader.read_frame().unwrap().unwrap().is_strobe());
    }

    #[test]
    fn interrupted_write_retries() {
        struct InterruptedOnce {
            interrupted: bool,
            data: Vec<u8>,
        }

        impl Write for InterruptedOnce {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.send(0x04, &[1, 2]).unwrap();
        assert_eq!(writer.into_inner().data, vec![0x55, 0x04, 1, 2]);
    }

    #[test]
    fn zero_write_is_connection_closed() {
        struct ZeroWriter;

        impl Write for ZeroWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(0x04, &[1]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn flush_happens_per_frame() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        #[derive(Default)]
        struct FlushCounter {
            flushes: Arc<AtomicUsize>,
            data: Vec<u8>,
        }

        impl Write for FlushCounter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                self.flushes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let sink = FlushCounter::default();
        let flushes = Arc::clone(&sink.flushes);
        let mut writer = FrameWriter::new(sink);

        writer.send(0x04, &[1]).unwrap();
        writer.send(0x05, &[2]).unwrap();

        assert_eq!(flushes.load(Ordering::SeqCst), 2);
    }
}
