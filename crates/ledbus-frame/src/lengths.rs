use std::collections::BTreeMap;

use crate::address::is_module_address;
use crate::error::{FrameError, Result};

/// Per-module expected channel-payload lengths.
///
/// Length-aware decoding needs to know, for every module address it may
/// encounter, how many unescaped channel bytes that module expects. The
/// table is fixed for the lifetime of a decoding session. Reserved
/// addresses (the strobe address and the host-level opcodes) cannot be
/// configured.
#[derive(Debug, Clone, Default)]
pub struct ModuleLengths {
    lengths: BTreeMap<u8, usize>,
}

impl ModuleLengths {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table for modules addressed `0..count`, each expecting
    /// `channels` channel bytes.
    ///
    /// Skips over reserved address values, so the usable address range may
    /// extend past `count`.
    pub fn uniform(count: usize, channels: usize) -> Self {
        let mut table = Self::new();
        let mut configured = 0usize;
        let mut address = 0u16;
        while configured < count && address <= u8::MAX as u16 {
            let addr = address as u8;
            if is_module_address(addr) {
                table.lengths.insert(addr, channels);
                configured += 1;
            }
            address += 1;
        }
        table
    }

    /// Register the expected channel count for a module address.
    ///
    /// Rejects reserved addresses with [`FrameError::ReservedAddress`].
    pub fn insert(&mut self, address: u8, channels: usize) -> Result<()> {
        if !is_module_address(address) {
            return Err(FrameError::ReservedAddress { address });
        }
        self.lengths.insert(address, channels);
        Ok(())
    }

    /// Look up the expected channel count for a module address.
    pub fn get(&self, address: u8) -> Option<usize> {
        self.lengths.get(&address).copied()
    }

    /// Number of configured modules.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Returns true if no module is configured.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Iterate configured `(address, channels)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.lengths.iter().map(|(&addr, &len)| (addr, len))
    }
}

impl FromIterator<(u8, usize)> for ModuleLengths {
    /// Collect a table from `(address, channels)` pairs, silently skipping
    /// reserved addresses. Use [`insert`](ModuleLengths::insert) when the
    /// caller needs the rejection surfaced.
    fn from_iter<I: IntoIterator<Item = (u8, usize)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (address, channels) in iter {
            let _ = table.insert(address, channels);
        }
        table
    }
}
