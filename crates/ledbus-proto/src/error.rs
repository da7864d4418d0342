/// Errors that can occur while decoding or building commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// A frame's payload length does not match the layout its leading byte
    /// demands. The frame is dropped; decoding resumes at the next frame.
    #[error("payload length mismatch for {address:#04x} (expected {expected} bytes, got {actual})")]
    LengthMismatch {
        address: u8,
        expected: usize,
        actual: usize,
    },

    /// The address has no entry in the module length table.
    #[error("unknown module address {address:#04x}")]
    UnknownAddress { address: u8 },

    /// An authentication token longer than the fixed wire length was
    /// supplied. This is a caller error; nothing is written.
    #[error("authentication token too long ({len} bytes, max 16)")]
    TokenTooLong { len: usize },

    /// The address cannot carry channel data.
    #[error("address {address:#04x} is reserved and cannot address a module")]
    ReservedAddress { address: u8 },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
