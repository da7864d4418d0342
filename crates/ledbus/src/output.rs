use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ledbus_frame::address_name;
use ledbus_model::LedModel;
use ledbus_proto::Command;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print one decoded command to stdout.
pub fn print_command(command: &Command, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(command) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(%err, "failed to serialize command"),
        },
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["command", "details"]);
            table.add_row(vec![kind(command).to_string(), describe(command)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{} {}", kind(command), describe(command)),
    }
}

/// Print the visible LED state to stdout, one module per row.
pub fn print_model(model: &LedModel, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let modules: Vec<Vec<String>> = (0..model.modules())
                .map(|module| module_colors(model, module))
                .collect();
            let value = serde_json::json!({
                "modules": model.modules(),
                "leds_per_module": model.leds_per_module(),
                "leds": modules,
            });
            println!("{value}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["module", "leds"]);
            for module in 0..model.modules() {
                table.add_row(vec![
                    module.to_string(),
                    module_colors(model, module).join(" "),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for module in 0..model.modules() {
                println!("module {module}: {}", module_colors(model, module).join(" "));
            }
        }
    }
}

fn module_colors(model: &LedModel, module: usize) -> Vec<String> {
    (0..model.leds_per_module())
        .map(|led| {
            let index = module * model.leds_per_module() + led;
            match model.rgba8(index) {
                Some([r, g, b, a]) => format!("#{r:02X}{g:02X}{b:02X}{a:02X}"),
                None => "-".to_string(),
            }
        })
        .collect()
}

fn kind(command: &Command) -> &'static str {
    match command {
        Command::Strobe => "STROBE",
        Command::SetChannels { address, .. } => address_name(*address),
        Command::SetLed { .. } => "SET_LED",
        Command::HighResSetLed { .. } => "HIGH_RES_SET_LED",
        Command::Authenticate { .. } => "AUTHENTICATE",
    }
}

fn describe(command: &Command) -> String {
    match command {
        Command::Strobe => String::new(),
        Command::SetChannels { address, channels } => {
            let values: Vec<String> = channels.iter().map(|v| v.to_string()).collect();
            format!("module={address:#04x} channels=[{}]", values.join(","))
        }
        Command::SetLed { led, r, g, b, a } => {
            format!("led={led} rgba=#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
        Command::HighResSetLed { led, r, g, b, a } => {
            format!("led={led} rgba=#{r:04X}{g:04X}{b:04X}{a:04X}")
        }
        Command::Authenticate { .. } => "token=<16 bytes>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_set_led() {
        let command = Command::SetLed {
            led: 1,
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        };
        assert_eq!(describe(&command), "led=1 rgba=#FF0000FF");
        assert_eq!(kind(&command), "SET_LED");
    }

    #[test]
    fn describe_set_channels() {
        let command = Command::set_channels(0x04, vec![1, 2, 3]).unwrap();
        assert_eq!(describe(&command), "module=0x04 channels=[1,2,3]");
        assert_eq!(kind(&command), "MODULE");
    }

    #[test]
    fn token_bytes_are_not_printed() {
        let command = Command::authenticate(b"secret").unwrap();
        assert!(!describe(&command).contains("secret"));
    }

    #[test]
    fn module_colors_render_front_buffer() {
        let mut model = LedModel::new(1, 2);
        model.set_led(0, [0xFFFF, 0, 0, 0xFFFF]);
        model.strobe();
        assert_eq!(
            module_colors(&model, 0),
            vec!["#FF0000FF".to_string(), "#00000000".to_string()]
        );
    }
}
