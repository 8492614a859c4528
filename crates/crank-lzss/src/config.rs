//! LZSS parameters.

use crank_core::{Error, Result};

/// Smallest supported window, in bits.
pub const MIN_WINDOW_BITS: u8 = 4;

/// Largest supported window, in bits.
pub const MAX_WINDOW_BITS: u8 = 15;

/// Smallest supported lookahead, in bits.
pub const MIN_LOOKAHEAD_BITS: u8 = 3;

/// Window bits used by the device firmware.
pub const DEFAULT_WINDOW_BITS: u8 = 8;

/// Lookahead bits used by the device firmware.
pub const DEFAULT_LOOKAHEAD_BITS: u8 = 4;

/// Decoder input buffer size used by the device firmware.
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 32;

/// Window and buffer parameters shared by encoder and decoder.
///
/// Encoder and decoder must agree on `window_bits` and `lookahead_bits`.
/// `input_buffer_size` only affects the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LzssConfig {
    /// log2 of the back-reference window.
    pub window_bits: u8,
    /// log2 of the longest back-reference.
    pub lookahead_bits: u8,
    /// Decoder input buffer size in bytes.
    pub input_buffer_size: usize,
}

impl LzssConfig {
    /// Create a config with the decoder's default input buffer.
    pub fn new(window_bits: u8, lookahead_bits: u8) -> Self {
        Self {
            window_bits,
            lookahead_bits,
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
        }
    }

    /// Set the decoder input buffer size.
    pub fn with_input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self
    }

    /// Check the parameters describe a codec that can make progress.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&self.window_bits) {
            return Err(Error::invalid_config(format!(
                "window_bits {} outside [{}, {}]",
                self.window_bits, MIN_WINDOW_BITS, MAX_WINDOW_BITS
            )));
        }
        if self.lookahead_bits < MIN_LOOKAHEAD_BITS || self.lookahead_bits >= self.window_bits {
            return Err(Error::invalid_config(format!(
                "lookahead_bits {} outside [{}, {})",
                self.lookahead_bits, MIN_LOOKAHEAD_BITS, self.window_bits
            )));
        }
        // A suspended field read holds back at most one whole byte
        if self.input_buffer_size < 2 {
            return Err(Error::invalid_config(format!(
                "input_buffer_size {} below 2",
                self.input_buffer_size
            )));
        }
        Ok(())
    }

    /// Back-reference window in bytes.
    #[inline]
    pub fn window_size(&self) -> usize {
        1 << self.window_bits
    }

    /// Longest back-reference in bytes.
    #[inline]
    pub fn max_match(&self) -> usize {
        1 << self.lookahead_bits
    }

    /// Bits taken by one back-reference token, tag included.
    #[inline]
    pub fn backref_bits(&self) -> u32 {
        1 + self.window_bits as u32 + self.lookahead_bits as u32
    }

    /// Shortest match worth a back-reference over literals.
    #[inline]
    pub fn min_match(&self) -> usize {
        (self.backref_bits() / LITERAL_BITS) as usize + 1
    }
}

impl Default for LzssConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_BITS, DEFAULT_LOOKAHEAD_BITS)
    }
}

/// Bits taken by one literal token, tag included.
pub(crate) const LITERAL_BITS: u32 = 9;

/// Allocate a zeroed state buffer, reporting failure.
pub(crate) fn alloc_zeroed(len: usize) -> Result<Box<[u8]>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed {
            requested_bytes: len,
        })?;
    data.resize(len, 0);
    Ok(data.into_boxed_slice())
}
