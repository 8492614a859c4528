//! LZSS codec (matched encoder + decoder factory).

use crank_core::Result;

use crate::compress::LzssEncoder;
use crate::config::LzssConfig;
use crate::decompress::LzssDecoder;

/// Builds encoder and decoder instances that agree on one [`LzssConfig`].
///
/// Every call returns a fresh instance, so no state is shared between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LzssCodec {
    config: LzssConfig,
}

impl LzssCodec {
    /// Create a codec, rejecting parameters that cannot make progress.
    pub fn new(config: LzssConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the shared parameters.
    pub fn config(&self) -> &LzssConfig {
        &self.config
    }

    /// Create a fresh encoder.
    pub fn encoder(&self) -> Result<LzssEncoder> {
        LzssEncoder::new(self.config)
    }

    /// Create a fresh decoder.
    pub fn decoder(&self) -> Result<LzssDecoder> {
        LzssDecoder::new(self.config)
    }
}
