//! The transducer contract the pump drives.
//!
//! ## Lifecycle
//!
//! ```text
//! reset ──▶ (sink ──▶ poll*)* ──▶ finish ──▶ poll* ──▶ finish
//!   ▲                                                    │
//!   └──────────────────── reusable ◀─────────────────────┘
//! ```
//!
//! A transducer never promises progress per call: `sink` may accept fewer
//! bytes than offered and `poll` may produce fewer bytes than fit.

use core::fmt;

use crate::error::Result;
use crate::types::Role;

/// Outcome of a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Output slice filled up; call again for the rest.
    More,
    /// Nothing more until the next sink or finish.
    Empty,
}

/// Outcome of a successful finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishStatus {
    /// Flush not complete, keep polling.
    More,
    /// Fully flushed.
    Done,
}

/// Which of the two finish calls the pump is making.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishPhase {
    /// Announces end of input right after the last sink.
    Announce,
    /// Confirms the final drain after polling ran dry.
    Drain,
}

impl FinishPhase {
    /// Operation label used in errors and traces.
    pub fn operation(self) -> &'static str {
        match self {
            FinishPhase::Announce => "finish (announce)",
            FinishPhase::Drain => "finish (drain)",
        }
    }

    /// Status a well-behaved transducer returns in this phase.
    pub fn expected(self) -> FinishStatus {
        match self {
            FinishPhase::Announce => FinishStatus::More,
            FinishPhase::Drain => FinishStatus::Done,
        }
    }
}

impl fmt::Display for FinishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// Incremental stream-processing state machine.
///
/// Encoders and decoders each implement this independently. Errors returned
/// from any operation are fatal to the current run.
pub trait Transducer {
    /// Get the direction this transducer works in.
    fn role(&self) -> Role;

    /// Return to the initial state. Idempotent.
    fn reset(&mut self);

    /// Accept a prefix of `input`.
    ///
    /// # Returns
    /// Number of bytes accepted, which may be less than `input.len()`.
    fn sink(&mut self, input: &[u8]) -> Result<usize>;

    /// Move produced output into `output`.
    ///
    /// # Returns
    /// Tuple of (bytes_written, status).
    fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)>;

    /// Announce end of input, or check whether the flush has completed.
    fn finish(&mut self) -> Result<FinishStatus>;
}

impl<T: Transducer + ?Sized> Transducer for &mut T {
    fn role(&self) -> Role {
        (**self).role()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn sink(&mut self, input: &[u8]) -> Result<usize> {
        (**self).sink(input)
    }

    fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)> {
        (**self).poll(output)
    }

    fn finish(&mut self) -> Result<FinishStatus> {
        (**self).finish()
    }
}

impl<T: Transducer + ?Sized> Transducer for Box<T> {
    fn role(&self) -> Role {
        (**self).role()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn sink(&mut self, input: &[u8]) -> Result<usize> {
        (**self).sink(input)
    }

    fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)> {
        (**self).poll(output)
    }

    fn finish(&mut self) -> Result<FinishStatus> {
        (**self).finish()
    }
}
