//! Controller-side convenience layer for ledbus.
//!
//! This is the "just works" layer for driving a bus: connect, authenticate,
//! set LEDs, strobe.

pub mod controller;
pub mod error;

pub use controller::{Controller, DEFAULT_PORT};
pub use error::{ClientError, Result};
