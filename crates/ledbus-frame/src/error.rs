/// Errors that can occur during frame encoding/decoding.
///
/// All wire-format errors (`InvalidEscape`, `UnexpectedSync`,
/// `UnknownAddress`) are recoverable: the decoder resynchronizes at the next
/// start-of-frame marker and the session continues.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An escape introducer was followed by a byte that is not a valid
    /// escape code.
    #[error("invalid escape sequence (0x54 followed by {byte:#04x})")]
    InvalidEscape { byte: u8 },

    /// A literal start-of-frame marker appeared where only payload bytes
    /// are valid. The stream has desynchronized.
    #[error("unexpected start-of-frame marker inside a frame")]
    UnexpectedSync,

    /// The address has no entry in the module length table.
    #[error("unknown module address {address:#04x}")]
    UnknownAddress { address: u8 },

    /// The address is reserved by the protocol and cannot carry channel data.
    #[error("address {address:#04x} is reserved and cannot address a module")]
    ReservedAddress { address: u8 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink stopped accepting bytes before a complete frame was written.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Returns true if the decoder can resynchronize and keep reading after
    /// this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidEscape { .. }
                | FrameError::UnexpectedSync
                | FrameError::UnknownAddress { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
