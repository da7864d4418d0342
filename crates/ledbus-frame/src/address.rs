//! The bus address/opcode space.
//!
//! The leading byte of every frame is either a module address or one of the
//! reserved host-level opcodes. Module configuration must not claim a
//! reserved value.

/// Bus-level strobe. A frame addressed here carries no payload and latches
/// previously written channel values.
pub const STROBE_ADDR: u8 = 0xFE;

/// Host-level strobe opcode.
pub const OP_STROBE: u8 = 0xFF;

/// Set one LED with 8-bit channels.
pub const OP_SET_LED: u8 = 0x01;

/// Authenticate with a 16-byte token.
pub const OP_AUTHENTICATE: u8 = 0x02;

/// Set one LED with 16-bit channels.
pub const OP_HIGH_RES_SET_LED: u8 = 0x03;

/// The fixed unescaped payload length of a reserved leading byte, or `None`
/// for module addresses (whose length comes from the module table).
pub fn fixed_payload_len(address: u8) -> Option<usize> {
    match address {
        STROBE_ADDR | OP_STROBE => Some(0),
        OP_SET_LED => Some(6),
        OP_AUTHENTICATE => Some(16),
        OP_HIGH_RES_SET_LED => Some(10),
        _ => None,
    }
}

/// Returns true if the value may address a module carrying channel data.
pub fn is_module_address(address: u8) -> bool {
    !matches!(
        address,
        OP_SET_LED | OP_AUTHENTICATE | OP_HIGH_RES_SET_LED | STROBE_ADDR | OP_STROBE
    )
}

/// Returns a human-readable name for a frame's leading byte.
pub fn address_name(address: u8) -> &'static str {
    match address {
        STROBE_ADDR => "STROBE",
        OP_STROBE => "STROBE",
        OP_SET_LED => "SET_LED",
        OP_AUTHENTICATE => "AUTHENTICATE",
        OP_HIGH_RES_SET_LED => "HIGH_RES_SET_LED",
        _ => "MODULE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_values_are_not_module_addresses() {
        for reserved in [0x01, 0x02, 0x03, 0xFE, 0xFF] {
            assert!(!is_module_address(reserved), "{reserved:#04x}");
        }
    }

    #[test]
    fn plain_values_are_module_addresses() {
        for address in [0x00, 0x04, 0x54, 0x55, 0x80, 0xFD] {
            assert!(is_module_address(address), "{address:#04x}");
        }
    }

    #[test]
    fn fixed_lengths() {
        assert_eq!(fixed_payload_len(0xFE), Some(0));
        assert_eq!(fixed_payload_len(0xFF), Some(0));
        assert_eq!(fixed_payload_len(0x01), Some(6));
        assert_eq!(fixed_payload_len(0x02), Some(16));
        assert_eq!(fixed_payload_len(0x03), Some(10));
        assert_eq!(fixed_payload_len(0x04), None);
    }

    #[test]
    fn names() {
        assert_eq!(address_name(0xFE), "STROBE");
        assert_eq!(address_name(0x02), "AUTHENTICATE");
        assert_eq!(address_name(0x42), "MODULE");
    }
}
