//! # Crank
//!
//! Round-trip self-test for streaming compression transducers on
//! memory-constrained targets.
//!
//! A [`RoundTripValidator`] pumps a fixture through an encoder and a decoder
//! with fixed `n + n/2 + margin` buffers and checks the recovered bytes. The
//! [`Harness`] repeats that over a doubling [`SizeLadder`] and halts at the
//! first fatal error.
//!
//! ## Usage
//!
//! ```bash
//! # Default ladder (4..256) with the 8/4 reference codec
//! crank-selftest
//!
//! # Strict length checks, larger window
//! crank-selftest --strict --window-bits 10
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use crank::{Harness, HarnessConfig, LatchIndicator, LzssCodec, PatientData, RoundTripValidator};
//!
//! let config = HarnessConfig::default();
//! let validator = RoundTripValidator::new(LzssCodec::new(config.lzss)?, &config);
//! let outcome = Harness::new(validator, PatientData, LatchIndicator::new()).run();
//! assert!(!outcome.is_halted());
//! ```

pub mod config;
pub mod fixture;
pub mod harness;
pub mod validator;

pub use config::{HarnessConfig, LengthPolicy};
pub use fixture::{patient_fixture, FixtureSource, PatientData, PATIENT_DATA};
pub use harness::{
    Fault, FaultIndicator, Harness, HarnessOutcome, HarnessSummary, LatchIndicator, LatchedFault,
    LogIndicator, SizeLadder, SizeOutcome,
};
pub use validator::{Finding, RoundTripReport, RoundTripValidator, TransducerFactory};

// Re-export the building blocks
pub use crank_core::{Error, FaultClass, Result, Transducer};
pub use crank_lzss::{LzssCodec, LzssConfig};
pub use crank_stream::{BufferSizing, Pump, PumpReport};
