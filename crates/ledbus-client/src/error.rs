use ledbus_frame::FrameError;
use ledbus_proto::ProtoError;

/// Errors that can occur on the controller side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to connect to the device or router.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// A command could not be built (e.g. oversized token).
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// Writing a frame failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
