use ledbus_client::Controller;

use crate::cmd::SendArgs;
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let led_write = match (&args.led, &args.rgba) {
        (Some(led), Some(rgba)) => Some((*led, rgba.as_str())),
        _ => None,
    };

    if led_write.is_none() && args.channels.is_none() && !args.strobe {
        return Err(CliError::new(
            USAGE,
            "nothing to send: pass --led/--rgba, --channels or --strobe",
        ));
    }

    let mut controller = Controller::connect(args.addr.as_str(), args.token.as_bytes())
        .map_err(|err| client_error("connect failed", err))?;

    if let Some((led, rgba)) = led_write {
        if args.hires {
            let rgba = parse_rgba16(rgba)?;
            controller
                .set_led_hi(led, rgba)
                .map_err(|err| client_error("send failed", err))?;
        } else {
            let rgba = parse_rgba8(rgba)?;
            controller
                .set_led(led, rgba)
                .map_err(|err| client_error("send failed", err))?;
        }
    }

    if let Some(spec) = &args.channels {
        let (address, channels) = parse_channels(spec)?;
        controller
            .set_channels(address, &channels)
            .map_err(|err| client_error("send failed", err))?;
    }

    if args.strobe {
        controller
            .strobe()
            .map_err(|err| client_error("send failed", err))?;
    }

    Ok(SUCCESS)
}

fn parse_rgba8(input: &str) -> CliResult<[u8; 4]> {
    let parts = split4(input)?;
    let mut rgba = [0u8; 4];
    for (slot, part) in rgba.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("invalid channel value: {part}")))?;
    }
    Ok(rgba)
}

fn parse_rgba16(input: &str) -> CliResult<[u16; 4]> {
    let parts = split4(input)?;
    let mut rgba = [0u16; 4];
    for (slot, part) in rgba.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("invalid channel value: {part}")))?;
    }
    Ok(rgba)
}

fn split4(input: &str) -> CliResult<[&str; 4]> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [r, g, b, a] = parts.as_slice() else {
        return Err(CliError::new(
            USAGE,
            format!("--rgba takes four comma-separated values, got {input:?}"),
        ));
    };
    Ok([r, g, b, a])
}

fn parse_channels(spec: &str) -> CliResult<(u8, Vec<u8>)> {
    let (addr, values) = spec.split_once(':').ok_or_else(|| {
        CliError::new(USAGE, format!("--channels takes ADDR:v1,v2,..., got {spec:?}"))
    })?;

    let addr = addr.trim();
    let address = if let Some(hex) = addr.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else {
        addr.parse()
    }
    .map_err(|_| CliError::new(USAGE, format!("invalid module address: {addr}")))?;

    let channels = values
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| CliError::new(USAGE, format!("invalid channel value: {value}")))
        })
        .collect::<CliResult<Vec<u8>>>()?;

    Ok((address, channels))
}
