use std::fs::File;
use std::io::Read;

use ledbus_frame::{BusReader, FrameReader, ModuleLengths};
use ledbus_model::CHANNELS_PER_LED;
use ledbus_proto::Command;

use crate::cmd::{DecodeArgs, DecodeMode};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_command, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let lengths = ModuleLengths::uniform(args.modules, args.leds_per_module * CHANNELS_PER_LED);

    let source: Box<dyn Read> = match &args.file {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
        ),
        None => Box::new(std::io::stdin().lock()),
    };

    let decoded = match args.mode {
        DecodeMode::Delimited => {
            let mut reader = FrameReader::new(source);
            pump(&lengths, format, || reader.read_frame())
        }
        DecodeMode::LengthAware => {
            let mut reader = BusReader::new(source, lengths.clone());
            pump(&lengths, format, || reader.read_frame())
        }
    };

    tracing::info!(decoded, "capture exhausted");
    Ok(SUCCESS)
}

/// Decode until end of stream, printing each command. Wire errors are
/// reported and skipped. Returns the number of commands decoded.
fn pump(
    lengths: &ModuleLengths,
    format: OutputFormat,
    mut next_frame: impl FnMut() -> ledbus_frame::Result<Option<ledbus_frame::Frame>>,
) -> usize {
    let mut decoded = 0usize;
    loop {
        let frame = match next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return decoded,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, "resynchronizing");
                continue;
            }
            Err(err) => {
                tracing::error!(%err, "read failed");
                return decoded;
            }
        };

        match Command::decode(&frame, lengths) {
            Ok(command) => {
                print_command(&command, format);
                decoded += 1;
            }
            Err(err) => tracing::warn!(%err, "dropping frame"),
        }
    }
}
