//! Typed command layer of the ledbus protocol.
//!
//! Sits on top of [`ledbus_frame`]: a decoded [`Frame`](ledbus_frame::Frame)
//! dispatches on its leading byte into one of a closed set of [`Command`]
//! variants, and every command encodes back to the exact frame it came from.

pub mod command;
pub mod error;

pub use command::{Command, TOKEN_LEN};
pub use error::{ProtoError, Result};
