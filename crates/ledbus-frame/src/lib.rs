//! Byte-level framing and escaping for addressable LED buses.
//!
//! This is the synchronization layer of ledbus. Every frame is:
//! - Introduced by a start marker (`0x55`) for stream synchronization
//! - One address byte plus a variable-length payload
//! - Escaped so reserved byte values can travel literally
//!   (`0x54 0x00` → `0x54`, `0x54 0x01` → `0x55`)
//!
//! Two decode modes are provided. [`FrameDecoder`] is delimiter-terminated:
//! a frame ends at the next start marker. [`BusReader`] is length-aware: it
//! consumes exactly the configured channel count per module (extended past
//! escapes by a fixed-point rule), which makes an embedded start marker a
//! reliable desynchronization signal instead of a frame boundary.

pub mod address;
pub mod bus;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod lengths;
pub mod reader;
pub mod writer;

pub use address::{
    address_name, fixed_payload_len, is_module_address, OP_AUTHENTICATE, OP_HIGH_RES_SET_LED,
    OP_SET_LED, OP_STROBE, STROBE_ADDR,
};
pub use bus::BusReader;
pub use codec::{
    encode_frame, needs_escape, unescape, Frame, ESCAPE, ESCAPED_ESCAPE, ESCAPED_START, START,
};
pub use decoder::FrameDecoder;
pub use error::{FrameError, Result};
pub use lengths::ModuleLengths;
pub use reader::FrameReader;
pub use writer::FrameWriter;
