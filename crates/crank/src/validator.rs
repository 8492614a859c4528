//! Round-trip validation of one encoder/decoder pair.

use tracing::{debug, info, warn};

use crank_core::{CompressionRatio, Error, Result, Transducer};
use crank_lzss::{LzssCodec, LzssDecoder, LzssEncoder};
use crank_stream::{BufferSizing, Pump, PumpReport};

use crate::config::{HarnessConfig, LengthPolicy};

/// Creates fresh transducers for every run.
///
/// A new instance per run keeps state from leaking between fixture sizes.
pub trait TransducerFactory {
    /// Encoder type.
    type Encoder: Transducer;
    /// Decoder type.
    type Decoder: Transducer;

    /// Create an encoder.
    fn encoder(&self) -> Result<Self::Encoder>;

    /// Create a decoder.
    fn decoder(&self) -> Result<Self::Decoder>;
}

impl TransducerFactory for LzssCodec {
    type Encoder = LzssEncoder;
    type Decoder = LzssDecoder;

    fn encoder(&self) -> Result<LzssEncoder> {
        LzssCodec::encoder(self)
    }

    fn decoder(&self) -> Result<LzssDecoder> {
        LzssCodec::decoder(self)
    }
}

impl<F: TransducerFactory + ?Sized> TransducerFactory for &F {
    type Encoder = F::Encoder;
    type Decoder = F::Decoder;

    fn encoder(&self) -> Result<Self::Encoder> {
        (**self).encoder()
    }

    fn decoder(&self) -> Result<Self::Decoder> {
        (**self).decoder()
    }
}

/// Non-fatal observation recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    /// Recovered length differed from the original under
    /// [`LengthPolicy::Advisory`].
    SizeMismatch { expected: usize, actual: usize },
}

/// Result of one successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTripReport {
    /// Fixture length.
    pub original_size: usize,
    /// Encoder output length.
    pub compressed_size: usize,
    /// Decoder output length.
    pub recovered_size: usize,
    /// Compression achieved on this fixture.
    pub ratio: CompressionRatio,
    /// Encode pump statistics.
    pub encode: PumpReport,
    /// Decode pump statistics.
    pub decode: PumpReport,
    /// Non-fatal findings.
    pub findings: Vec<Finding>,
}

impl RoundTripReport {
    /// Check if the run recorded no findings.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Encodes a fixture, decodes the result and compares it to the fixture.
#[derive(Debug, Clone)]
pub struct RoundTripValidator<F> {
    factory: F,
    sizing: BufferSizing,
    length_policy: LengthPolicy,
    stall_limit: usize,
}

impl<F: TransducerFactory> RoundTripValidator<F> {
    /// Create a validator using the sizing and policies from `config`.
    pub fn new(factory: F, config: &HarnessConfig) -> Self {
        Self {
            factory,
            sizing: config.sizing(),
            length_policy: config.length_policy,
            stall_limit: config.stall_limit,
        }
    }

    /// Get the transducer factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Get the buffer sizing rule.
    pub fn sizing(&self) -> BufferSizing {
        self.sizing
    }

    /// Get the length mismatch policy.
    pub fn length_policy(&self) -> LengthPolicy {
        self.length_policy
    }

    /// Run one round trip over `fixture`.
    pub fn validate(&self, fixture: &[u8]) -> Result<RoundTripReport> {
        self.validate_with(fixture, |_| {})
    }

    /// Run one round trip, letting `tamper` modify the compressed bytes
    /// before they are decoded.
    pub fn validate_with<T>(&self, fixture: &[u8], tamper: T) -> Result<RoundTripReport>
    where
        T: FnOnce(&mut [u8]),
    {
        let n = fixture.len();

        let mut compressed = self.sizing.allocate_for(n)?;
        let mut recovered = self.sizing.allocate_for(n)?;

        let encode = Pump::new(self.factory.encoder()?)
            .with_stall_limit(self.stall_limit)
            .run(fixture, &mut compressed)?;

        let ratio = CompressionRatio::new(n, compressed.len());
        info!("{}", ratio);

        tamper(compressed.as_mut_slice());

        let decode = Pump::new(self.factory.decoder()?)
            .with_ceiling(n)
            .with_stall_limit(self.stall_limit)
            .run(compressed.as_slice(), &mut recovered)?;

        let mut findings = Vec::new();
        if recovered.len() != n {
            match self.length_policy {
                LengthPolicy::Strict => {
                    return Err(Error::SizeMismatch {
                        expected: n,
                        actual: recovered.len(),
                    });
                }
                LengthPolicy::Advisory => {
                    warn!(
                        expected = n,
                        actual = recovered.len(),
                        "recovered length differs from input"
                    );
                    findings.push(Finding::SizeMismatch {
                        expected: n,
                        actual: recovered.len(),
                    });
                }
            }
        }

        let output = recovered.as_slice();
        if let Some((index, &expected)) = fixture
            .iter()
            .enumerate()
            .find(|&(i, b)| output.get(i) != Some(b))
        {
            return Err(Error::ContentMismatch {
                index,
                expected,
                found: output.get(index).copied(),
            });
        }

        debug!(
            original = n,
            compressed = compressed.len(),
            recovered = recovered.len(),
            "round trip verified"
        );

        Ok(RoundTripReport {
            original_size: n,
            compressed_size: compressed.len(),
            recovered_size: recovered.len(),
            ratio,
            encode,
            decode,
            findings,
        })
    }
}
