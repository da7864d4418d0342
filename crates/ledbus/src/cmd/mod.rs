use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod emulate;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a bus emulator: accept TCP clients, decode frames, render LEDs.
    Emulate(EmulateArgs),
    /// Decode a raw byte capture and print the commands it contains.
    Decode(DecodeArgs),
    /// Connect to a router and send commands.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Emulate(args) => emulate::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// How frame boundaries are recovered from the byte stream.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DecodeMode {
    /// A frame ends at the next start marker.
    Delimited,
    /// Consume exactly the configured channel count per module; an embedded
    /// start marker signals desynchronization.
    LengthAware,
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:23429")]
    pub listen: String,
    /// Number of bus modules.
    #[arg(long, default_value = "5")]
    pub modules: usize,
    /// LEDs per module (three channels each).
    #[arg(long, default_value = "5")]
    pub leds_per_module: usize,
    /// Frame decoding mode.
    #[arg(long, value_enum, default_value = "delimited")]
    pub mode: DecodeMode,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Number of bus modules.
    #[arg(long, default_value = "5")]
    pub modules: usize,
    /// LEDs per module (three channels each).
    #[arg(long, default_value = "5")]
    pub leds_per_module: usize,
    /// Frame decoding mode.
    #[arg(long, value_enum, default_value = "delimited")]
    pub mode: DecodeMode,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Router address (host:port).
    pub addr: String,
    /// Authentication token (at most 16 bytes, zero-padded on the wire).
    #[arg(long, default_value = "sixteen letters.")]
    pub token: String,
    /// LED to set.
    #[arg(long, requires = "rgba")]
    pub led: Option<u16>,
    /// Color as R,G,B,A (0-255, or 0-65535 with --hires).
    #[arg(long, requires = "led")]
    pub rgba: Option<String>,
    /// Use 16-bit channel precision.
    #[arg(long, requires = "led")]
    pub hires: bool,
    /// Raw module write as ADDR:v1,v2,... (decimal or 0x-prefixed address).
    #[arg(long)]
    pub channels: Option<String>,
    /// Send a strobe after the writes.
    #[arg(long)]
    pub strobe: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
