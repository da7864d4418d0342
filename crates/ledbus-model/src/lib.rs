//! Double-buffered LED state.
//!
//! The model is the codec's downstream collaborator: it receives one
//! [`Command`] per decoded frame, in arrival order. Channel writes land in a
//! back buffer and become visible only when a `Strobe` copies it to the
//! front buffer, so a bus client can compose a whole scene and latch it
//! atomically.

use ledbus_frame::is_module_address;
use ledbus_proto::Command;

/// Channels a bus module exposes per LED.
pub const CHANNELS_PER_LED: usize = 3;

/// One LED cell, 16 bits per channel (RGBA).
pub type Rgba16 = [u16; 4];

/// Widen an 8-bit channel value to 16 bits (0xFF maps to 0xFFFF).
fn widen(value: u8) -> u16 {
    u16::from(value) * 0x0101
}

/// Double-buffered LED state for a string of modules.
///
/// Module rows are keyed by bus address. The model assigns the first
/// `modules` non-reserved address values in ascending order, the same
/// assignment [`ModuleLengths::uniform`](ledbus_frame::ModuleLengths::uniform)
/// uses, so address `0x04` is row 1 when `0x01..=0x03` are reserved.
#[derive(Debug, Clone)]
pub struct LedModel {
    modules: usize,
    leds_per_module: usize,
    /// Bus address of each module row, in row order.
    addresses: Vec<u8>,
    front: Vec<Rgba16>,
    back: Vec<Rgba16>,
}

impl LedModel {
    /// Create a dark model of `modules × leds_per_module` LEDs.
    pub fn new(modules: usize, leds_per_module: usize) -> Self {
        let cells = modules * leds_per_module;
        let addresses = (0..=u8::MAX)
            .filter(|&addr| is_module_address(addr))
            .take(modules)
            .collect();
        Self {
            modules,
            leds_per_module,
            addresses,
            front: vec![[0; 4]; cells],
            back: vec![[0; 4]; cells],
        }
    }

    /// The row index a bus address maps to, if this model has it.
    pub fn row_of(&self, address: u8) -> Option<usize> {
        self.addresses.iter().position(|&addr| addr == address)
    }

    /// Bus addresses of the configured modules, in row order.
    pub fn addresses(&self) -> &[u8] {
        &self.addresses
    }

    /// Apply one decoded command. Returns true if the command was a strobe
    /// (i.e. the front buffer changed).
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Strobe => {
                self.strobe();
                true
            }
            Command::SetChannels { address, channels } => {
                match self.row_of(*address) {
                    Some(module) => {
                        for (channel, &value) in channels.iter().enumerate() {
                            self.set_channel(module, channel, value);
                        }
                    }
                    None => {
                        tracing::debug!(address, "dropping write to unconfigured address");
                    }
                }
                false
            }
            Command::SetLed { led, r, g, b, a } => {
                self.set_led(*led, [widen(*r), widen(*g), widen(*b), widen(*a)]);
                false
            }
            Command::HighResSetLed { led, r, g, b, a } => {
                self.set_led(*led, [*r, *g, *b, *a]);
                false
            }
            // The token has no meaning at the state model.
            Command::Authenticate { .. } => false,
        }
    }

    /// Write one channel of one module (by row index) into the back buffer.
    ///
    /// Writes past the configured geometry are dropped, matching bus
    /// behavior where a module ignores channels it does not have.
    pub fn set_channel(&mut self, module: usize, channel: usize, value: u8) {
        let led_in_module = channel / CHANNELS_PER_LED;
        let component = channel % CHANNELS_PER_LED;
        if module >= self.modules || led_in_module >= self.leds_per_module {
            tracing::debug!(module, channel, "dropping out-of-range channel write");
            return;
        }
        let cell = module * self.leds_per_module + led_in_module;
        self.back[cell][component] = widen(value);
    }

    /// Write one LED (global index) into the back buffer.
    pub fn set_led(&mut self, led: u16, rgba: Rgba16) {
        let led = usize::from(led);
        if led >= self.back.len() {
            tracing::debug!(led, "dropping out-of-range led write");
            return;
        }
        self.back[led] = rgba;
    }

    /// Make all buffered writes visible at once.
    ///
    /// The back buffer is kept, so further writes keep accumulating on top
    /// of the latched state.
    pub fn strobe(&mut self) {
        self.front.copy_from_slice(&self.back);
    }

    /// The visible LED state, row-major by module.
    pub fn front(&self) -> &[Rgba16] {
        &self.front
    }

    /// The visible state of one LED as 8-bit RGBA.
    pub fn rgba8(&self, led: usize) -> Option<[u8; 4]> {
        self.front
            .get(led)
            .map(|cell| cell.map(|channel| (channel >> 8) as u8))
    }

    pub fn modules(&self) -> usize {
        self.modules
    }

    pub fn leds_per_module(&self) -> usize {
        self.leds_per_module
    }

    pub fn led_count(&self) -> usize {
        self.front.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_invisible_until_strobe() {
        let mut model = LedModel::new(2, 2);
        model.apply(&Command::SetLed {
            led: 0,
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        });
        assert_eq!(model.rgba8(0), Some([0, 0, 0, 0]));

        assert!(model.apply(&Command::Strobe));
        assert_eq!(model.rgba8(0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn set_channels_maps_to_module_leds() {
        let mut model = LedModel::new(2, 2);
        // Second module row sits at address 0x04 (0x01..=0x03 are
        // reserved); six channels are two LEDs worth of RGB.
        model.apply(&Command::SetChannels {
            address: 0x04,
            channels: vec![10, 20, 30, 40, 50, 60],
        });
        model.strobe();

        assert_eq!(model.rgba8(2), Some([10, 20, 30, 0]));
        assert_eq!(model.rgba8(3), Some([40, 50, 60, 0]));
        // Module 0 untouched.
        assert_eq!(model.rgba8(0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut model = LedModel::new(1, 1);
        model.apply(&Command::SetChannels {
            address: 9,
            channels: vec![1, 2, 3],
        });
        model.set_channel(0, 99, 7);
        model.set_led(100, [1, 2, 3, 4]);
        model.strobe();
        assert_eq!(model.rgba8(0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn high_res_values_are_stored_unscaled() {
        let mut model = LedModel::new(1, 1);
        model.apply(&Command::HighResSetLed {
            led: 0,
            r: 0x1234,
            g: 0x5678,
            b: 0x9ABC,
            a: 0xFFFF,
        });
        model.strobe();
        assert_eq!(model.front()[0], [0x1234, 0x5678, 0x9ABC, 0xFFFF]);
        assert_eq!(model.rgba8(0), Some([0x12, 0x56, 0x9A, 0xFF]));
    }

    #[test]
    fn back_buffer_accumulates_across_strobes() {
        let mut model = LedModel::new(1, 2);
        model.set_led(0, [1, 1, 1, 1]);
        model.strobe();
        model.set_led(1, [2, 2, 2, 2]);
        model.strobe();
        // The first write is still latched.
        assert_eq!(model.front()[0], [1, 1, 1, 1]);
        assert_eq!(model.front()[1], [2, 2, 2, 2]);
    }

    #[test]
    fn addresses_follow_the_length_table_assignment() {
        let model = LedModel::new(5, 5);
        assert_eq!(model.addresses(), &[0x00, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(model.row_of(0x00), Some(0));
        assert_eq!(model.row_of(0x04), Some(1));
        assert_eq!(model.row_of(0x07), Some(4));
        assert_eq!(model.row_of(0x01), None);
        assert_eq!(model.row_of(0x08), None);
    }

    #[test]
    fn every_configured_module_write_is_visible() {
        use ledbus_frame::ModuleLengths;

        let leds_per_module = 5;
        let lengths = ModuleLengths::uniform(5, leds_per_module * CHANNELS_PER_LED);
        let mut model = LedModel::new(5, leds_per_module);

        for (row, (address, channels)) in lengths.iter().enumerate() {
            let value = (row as u8 + 1) * 10;
            let command = Command::set_channels(address, vec![value; channels]).unwrap();
            model.apply(&command);
        }
        model.apply(&Command::Strobe);

        for row in 0..5 {
            let value = (row as u8 + 1) * 10;
            for led in 0..leds_per_module {
                assert_eq!(
                    model.rgba8(row * leds_per_module + led),
                    Some([value, value, value, 0]),
                    "module row {row} led {led}"
                );
            }
        }
    }

    #[test]
    fn authenticate_is_a_no_op() {
        let mut model = LedModel::new(1, 1);
        let before = model.front().to_vec();
        let auth = Command::authenticate(b"secret").unwrap();
        assert!(!model.apply(&auth));
        assert_eq!(model.front(), before.as_slice());
    }
}
