mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ledbus", version, about = "Addressable LED bus control CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_emulate_subcommand() {
        let cli = Cli::try_parse_from([
            "ledbus",
            "emulate",
            "--listen",
            "127.0.0.1:9000",
            "--modules",
            "3",
            "--mode",
            "length-aware",
        ])
        .expect("emulate args should parse");

        assert!(matches!(cli.command, Command::Emulate(_)));
    }

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "ledbus",
            "send",
            "localhost:7534",
            "--led",
            "1",
            "--rgba",
            "255,0,0,255",
            "--strobe",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.led, Some(1));
        assert!(args.strobe);
    }

    #[test]
    fn rgba_requires_led() {
        let err = Cli::try_parse_from(["ledbus", "send", "localhost:7534", "--rgba", "1,2,3,4"])
            .expect_err("--rgba without --led should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from(["ledbus", "decode", "--file", "capture.bin"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
