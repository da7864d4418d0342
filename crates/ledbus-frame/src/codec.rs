use bytes::{BufMut, Bytes, BytesMut};

use crate::address::STROBE_ADDR;

/// Start-of-frame marker.
pub const START: u8 = 0x55;

/// Escape introducer.
pub const ESCAPE: u8 = 0x54;

/// Escape code for a literal `0x54` (`ESCAPE`).
pub const ESCAPED_ESCAPE: u8 = 0x00;

/// Escape code for a literal `0x55` (`START`).
pub const ESCAPED_START: u8 = 0x01;

/// One decoded protocol unit: an address byte plus an unescaped payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The module address or opcode this frame is directed at.
    pub address: u8,
    /// The unescaped payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(address: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            payload: payload.into(),
        }
    }

    /// The zero-payload bus strobe frame.
    pub fn strobe() -> Self {
        Self::new(STROBE_ADDR, Bytes::new())
    }

    /// Returns true if this is the bus strobe frame.
    pub fn is_strobe(&self) -> bool {
        self.address == STROBE_ADDR && self.payload.is_empty()
    }
}

/// Returns true if a byte value must be transmitted as a 2-byte escape
/// sequence.
pub fn needs_escape(byte: u8) -> bool {
    byte == START || byte == ESCAPE
}

/// Map an escape code back to the literal byte it stands for.
///
/// Returns `None` for codes that are not part of the protocol; encountering
/// one on the wire is a protocol violation.
pub fn unescape(code: u8) -> Option<u8> {
    match code {
        ESCAPED_ESCAPE => Some(ESCAPE),
        ESCAPED_START => Some(START),
        _ => None,
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────────┬──────────────────────────┐
/// │ START (1B) │ Address (1-2B)   │ Payload (escaped bytes)  │
/// │ 0x55       │ escaped if needed│                          │
/// └────────────┴──────────────────┴──────────────────────────┘
/// ```
///
/// Every byte of `address ++ payload` passes through the escape check:
/// `0x54` is written as `0x54 0x00`, `0x55` as `0x54 0x01`, anything else
/// verbatim.
pub fn encode_frame(address: u8, payload: &[u8], dst: &mut BytesMut) {
    // Worst case every byte escapes to two.
    dst.reserve(1 + 2 * (1 + payload.len()));
    dst.put_u8(START);
    put_escaped(address, dst);
    for &byte in payload {
        put_escaped(byte, dst);
    }
}

fn put_escaped(byte: u8, dst: &mut BytesMut) {
    if !needs_escape(byte) {
        dst.put_u8(byte);
        return;
    }
    dst.put_u8(ESCAPE);
    dst.put_u8(if byte == START {
        ESCAPED_START
    } else {
        ESCAPED_ESCAPE
    });
}
