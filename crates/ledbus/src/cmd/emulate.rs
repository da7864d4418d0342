use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledbus_frame::{BusReader, FrameReader, ModuleLengths};
use ledbus_model::{LedModel, CHANNELS_PER_LED};
use ledbus_proto::Command;

use crate::cmd::{DecodeMode, EmulateArgs};
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_model, OutputFormat};

pub fn run(args: EmulateArgs, format: OutputFormat) -> CliResult<i32> {
    let lengths = ModuleLengths::uniform(args.modules, args.leds_per_module * CHANNELS_PER_LED);
    let mut model = LedModel::new(args.modules, args.leds_per_module);

    let listener =
        TcpListener::bind(&args.listen).map_err(|err| io_error("bind failed", err))?;
    tracing::info!(addr = %args.listen, modules = args.modules, "emulator listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    while running.load(Ordering::SeqCst) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(err) => return Err(io_error("accept failed", err)),
        };
        tracing::info!(%peer, "client connected");

        // One client at a time; the bus has a single upstream.
        serve(stream, args.mode, &lengths, &mut model, format, &running);
        tracing::info!(%peer, "client disconnected");
    }

    Ok(SUCCESS)
}

fn serve(
    stream: TcpStream,
    mode: DecodeMode,
    lengths: &ModuleLengths,
    model: &mut LedModel,
    format: OutputFormat,
    running: &AtomicBool,
) {
    match mode {
        DecodeMode::Delimited => {
            let mut reader = FrameReader::new(stream);
            drive(model, lengths, format, running, || reader.read_frame());
        }
        DecodeMode::LengthAware => {
            let mut reader = BusReader::new(stream, lengths.clone());
            drive(model, lengths, format, running, || reader.read_frame());
        }
    }
}

/// Pump frames from either reader into the model until the client hangs up.
fn drive(
    model: &mut LedModel,
    lengths: &ModuleLengths,
    format: OutputFormat,
    running: &AtomicBool,
    mut next_frame: impl FnMut() -> ledbus_frame::Result<Option<ledbus_frame::Frame>>,
) {
    while running.load(Ordering::SeqCst) {
        let frame = match next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, "resynchronizing");
                continue;
            }
            Err(err) => {
                tracing::error!(%err, "read failed");
                return;
            }
        };

        match Command::decode(&frame, lengths) {
            Ok(command) => {
                tracing::debug!(?command, "applying");
                if model.apply(&command) {
                    print_model(model, format);
                }
            }
            Err(err) => tracing::warn!(%err, "dropping frame"),
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
