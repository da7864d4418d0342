use bytes::{BufMut, Bytes, BytesMut};
use ledbus_frame::{
    is_module_address, Frame, ModuleLengths, OP_AUTHENTICATE, OP_HIGH_RES_SET_LED, OP_SET_LED,
    OP_STROBE, STROBE_ADDR,
};
use serde::Serialize;

use crate::error::{ProtoError, Result};

/// Fixed wire length of an authentication token.
pub const TOKEN_LEN: usize = 16;

/// A decoded protocol command.
///
/// Every variant carries exactly the fields needed to reconstruct its wire
/// form, so `decode(encode(command)) == command` holds for all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Latch previously written channel values.
    Strobe,
    /// Raw channel values for one module.
    SetChannels { address: u8, channels: Vec<u8> },
    /// One LED, 8-bit channels.
    SetLed { led: u16, r: u8, g: u8, b: u8, a: u8 },
    /// One LED, 16-bit channels.
    HighResSetLed {
        led: u16,
        r: u16,
        g: u16,
        b: u16,
        a: u16,
    },
    /// Present an authentication token.
    Authenticate { token: [u8; TOKEN_LEN] },
}

impl Command {
    /// Build an `Authenticate` command, zero-padding the token to its fixed
    /// wire length. Tokens longer than [`TOKEN_LEN`] are rejected.
    pub fn authenticate(token: &[u8]) -> Result<Self> {
        if token.len() > TOKEN_LEN {
            return Err(ProtoError::TokenTooLong { len: token.len() });
        }
        let mut padded = [0u8; TOKEN_LEN];
        padded[..token.len()].copy_from_slice(token);
        Ok(Command::Authenticate { token: padded })
    }

    /// Build a `SetChannels` command, rejecting reserved address values.
    pub fn set_channels(address: u8, channels: impl Into<Vec<u8>>) -> Result<Self> {
        if !is_module_address(address) {
            return Err(ProtoError::ReservedAddress { address });
        }
        Ok(Command::SetChannels {
            address,
            channels: channels.into(),
        })
    }

    /// Decode a frame into a typed command.
    ///
    /// Dispatches on the frame's leading byte: the host-level opcodes and
    /// the strobe address take precedence, anything else is a module address
    /// looked up in `lengths`.
    pub fn decode(frame: &Frame, lengths: &ModuleLengths) -> Result<Self> {
        let payload = frame.payload.as_ref();
        match frame.address {
            OP_STROBE | STROBE_ADDR => {
                expect_len(frame.address, 0, payload.len())?;
                Ok(Command::Strobe)
            }
            OP_SET_LED => {
                expect_len(frame.address, 6, payload.len())?;
                Ok(Command::SetLed {
                    led: u16::from_be_bytes([payload[0], payload[1]]),
                    r: payload[2],
                    g: payload[3],
                    b: payload[4],
                    a: payload[5],
                })
            }
            OP_AUTHENTICATE => {
                expect_len(frame.address, TOKEN_LEN, payload.len())?;
                let mut token = [0u8; TOKEN_LEN];
                token.copy_from_slice(payload);
                Ok(Command::Authenticate { token })
            }
            OP_HIGH_RES_SET_LED => {
                expect_len(frame.address, 10, payload.len())?;
                let word =
                    |i: usize| u16::from_be_bytes([payload[2 * i], payload[2 * i + 1]]);
                Ok(Command::HighResSetLed {
                    led: word(0),
                    r: word(1),
                    g: word(2),
                    b: word(3),
                    a: word(4),
                })
            }
            address => {
                let expected = lengths
                    .get(address)
                    .ok_or(ProtoError::UnknownAddress { address })?;
                expect_len(address, expected, payload.len())?;
                Ok(Command::SetChannels {
                    address,
                    channels: payload.to_vec(),
                })
            }
        }
    }

    /// Encode this command as a frame, the structural inverse of
    /// [`decode`](Command::decode).
    ///
    /// `Strobe` takes its bus-level form (the strobe address with no
    /// payload).
    pub fn encode(&self) -> Frame {
        match self {
            Command::Strobe => Frame::strobe(),
            Command::SetChannels { address, channels } => {
                Frame::new(*address, Bytes::copy_from_slice(channels))
            }
            Command::SetLed { led, r, g, b, a } => {
                let mut payload = BytesMut::with_capacity(6);
                payload.put_u16(*led);
                payload.put_u8(*r);
                payload.put_u8(*g);
                payload.put_u8(*b);
                payload.put_u8(*a);
                Frame::new(OP_SET_LED, payload.freeze())
            }
            Command::HighResSetLed { led, r, g, b, a } => {
                let mut payload = BytesMut::with_capacity(10);
                payload.put_u16(*led);
                payload.put_u16(*r);
                payload.put_u16(*g);
                payload.put_u16(*b);
                payload.put_u16(*a);
                Frame::new(OP_HIGH_RES_SET_LED, payload.freeze())
            }
            Command::Authenticate { token } => {
                Frame::new(OP_AUTHENTICATE, Bytes::copy_from_slice(token))
            }
        }
    }

    /// The full escaped wire image of this command, including the start
    /// marker.
    pub fn to_wire(&self) -> Bytes {
        let frame = self.encode();
        let mut buf = BytesMut::new();
        ledbus_frame::encode_frame(frame.address, frame.payload.as_ref(), &mut buf);
        buf.freeze()
    }
}

fn expect_len(address: u8, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProtoError::LengthMismatch {
            address,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths() -> ModuleLengths {
        [(0x04u8, 3usize), (0x05, 6)].into_iter().collect()
    }

    #[test]
    fn roundtrip_every_command() {
        let commands = [
            Command::Strobe,
            Command::SetChannels {
                address: 0x04,
                channels: vec![0x54, 0x55, 0xFE],
            },
            Command::SetLed {
                led: 0x0102,
                r: 1,
                g: 2,
                b: 3,
                a: 4,
            },
            Command::HighResSetLed {
                led: 0xABCD,
                r: 0x1122,
                g: 0x3344,
                b: 0x5566,
                a: 0x7788,
            },
            Command::authenticate(b"sixteen letters.").unwrap(),
        ];

        let lengths = lengths();
        for command in commands {
            let decoded = Command::decode(&command.encode(), &lengths).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn set_led_wire_image() {
        let command = Command::SetLed {
            led: 1,
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        };
        assert_eq!(
            command.to_wire().as_ref(),
            &[0x55, 0x01, 0x00, 0x01, 0xFF, 0x00, 0x00, 0xFF]
        );
    }

    #[test]
    fn high_res_fields_are_big_endian() {
        let frame = Command::HighResSetLed {
            led: 0x0102,
            r: 0x0304,
            g: 0x0506,
            b: 0x0708,
            a: 0x090A,
        }
        .encode();
        assert_eq!(frame.address, OP_HIGH_RES_SET_LED);
        assert_eq!(
            frame.payload.as_ref(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A]
        );
    }

    #[test]
    fn strobe_decodes_from_both_forms() {
        let lengths = lengths();
        let bus = Frame::new(STROBE_ADDR, Bytes::new());
        let host = Frame::new(OP_STROBE, Bytes::new());
        assert_eq!(Command::decode(&bus, &lengths).unwrap(), Command::Strobe);
        assert_eq!(Command::decode(&host, &lengths).unwrap(), Command::Strobe);
    }

    #[test]
    fn strobe_with_payload_is_rejected() {
        let frame = Frame::new(STROBE_ADDR, vec![1]);
        let err = Command::decode(&frame, &lengths()).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::LengthMismatch {
                address: STROBE_ADDR,
                expected: 0,
                actual: 1,
            }
        ));
    }

    #[test]
    fn short_token_is_zero_padded() {
        let command = Command::authenticate(b"abc").unwrap();
        let Command::Authenticate { token } = command else {
            panic!("expected Authenticate");
        };
        assert_eq!(&token[..3], b"abc");
        assert_eq!(&token[3..], &[0u8; 13]);
    }

    #[test]
    fn long_token_is_rejected() {
        let err = Command::authenticate(b"seventeen letters").unwrap_err();
        assert!(matches!(err, ProtoError::TokenTooLong { len: 17 }));
    }

    #[test]
    fn channel_count_mismatch_is_rejected() {
        let frame = Frame::new(0x04, vec![1, 2]);
        let err = Command::decode(&frame, &lengths()).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::LengthMismatch {
                address: 0x04,
                expected: 3,
                actual: 2,
            }
        ));
    }

    #[test]
    fn unknown_address_is_rejected() {
        let frame = Frame::new(0x20, vec![1, 2, 3]);
        let err = Command::decode(&frame, &lengths()).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownAddress { address: 0x20 }));
    }

    #[test]
    fn set_channels_rejects_reserved_addresses() {
        for reserved in [0x01, 0x02, 0x03, 0xFE, 0xFF] {
            let err = Command::set_channels(reserved, vec![1, 2, 3]).unwrap_err();
            assert!(
                matches!(err, ProtoError::ReservedAddress { address } if address == reserved)
            );
        }
    }

    #[test]
    fn set_led_decodes_from_wire_bytes() {
        // The wire image from `set_led_wire_image`, fed back through the
        // delimiter decoder.
        let mut decoder = ledbus_frame::FrameDecoder::new();
        let mut frames = Vec::new();
        for &byte in &[0x55, 0x01, 0x00, 0x01, 0xFF, 0x00, 0x00, 0xFF, 0x55] {
            if let Some(frame) = decoder.push(byte).unwrap() {
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 1);
        let command = Command::decode(&frames[0], &lengths()).unwrap();
        assert_eq!(
            command,
            Command::SetLed {
                led: 1,
                r: 255,
                g: 0,
                b: 0,
                a: 255,
            }
        );
    }

    #[test]
    fn escaped_channels_roundtrip_over_the_wire() {
        let command = Command::set_channels(0x04, vec![0x54, 0x55, 0x10]).unwrap();
        let wire = command.to_wire();

        let lengths = lengths();
        let mut reader =
            ledbus_frame::BusReader::new(std::io::Cursor::new(wire.to_vec()), lengths.clone());
        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!(Command::decode(&frame, &lengths).unwrap(), command);
    }
}
