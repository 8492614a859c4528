//! Size-ladder harness with fault latching.
//!
//! The harness runs the validator over doubling fixture sizes and stops at
//! the first fatal error. A halt is returned to the caller as
//! [`HarnessOutcome::Halted`] after the [`FaultIndicator`] has been
//! signalled. There is no retry and no recovery.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crank_core::{Error, FaultClass, Result};

use crate::config::HarnessConfig;
use crate::fixture::FixtureSource;
use crate::validator::{RoundTripReport, RoundTripValidator, TransducerFactory};

/// Geometric ladder of fixture sizes: `start, 2*start, 4*start, ...` below `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLadder {
    start: usize,
    end: usize,
}

impl SizeLadder {
    /// Create a ladder. `start` must be positive.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start == 0 {
            return Err(Error::invalid_config("ladder start must be positive"));
        }
        Ok(Self { start, end })
    }

    /// Ladder described by a harness configuration.
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        Self::new(config.ladder_start, config.ladder_end)
    }

    /// Iterate the sizes in increasing order.
    pub fn iter(&self) -> LadderIter {
        LadderIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl Default for SizeLadder {
    fn default() -> Self {
        Self { start: 4, end: 256 }
    }
}

impl IntoIterator for SizeLadder {
    type Item = usize;
    type IntoIter = LadderIter;

    fn into_iter(self) -> LadderIter {
        self.iter()
    }
}

/// Iterator over [`SizeLadder`] sizes.
#[derive(Debug, Clone)]
pub struct LadderIter {
    next: Option<usize>,
    end: usize,
}

impl Iterator for LadderIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let size = self.next.filter(|&size| size < self.end)?;
        self.next = size.checked_mul(2);
        Some(size)
    }
}

/// The fatal error that stopped a harness run.
#[derive(Debug)]
pub struct Fault {
    /// Fixture size that failed.
    pub size: usize,
    /// Classification of `error`.
    pub class: FaultClass,
    /// The error itself.
    pub error: Error,
}

impl Fault {
    fn new(size: usize, error: Error) -> Self {
        Self {
            size,
            class: error.class(),
            error,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size {} failed ({:?}): {}", self.size, self.class, self.error)
    }
}

/// Terminal side effect for a fatal harness failure.
///
/// On the device this lights the fault lamp. Once signalled the state is
/// permanent for the life of the process.
pub trait FaultIndicator {
    /// Record `fault`.
    fn signal(&self, fault: &Fault);
}

impl<I: FaultIndicator + ?Sized> FaultIndicator for &I {
    fn signal(&self, fault: &Fault) {
        (**self).signal(fault)
    }
}

impl<I: FaultIndicator + ?Sized> FaultIndicator for Box<I> {
    fn signal(&self, fault: &Fault) {
        (**self).signal(fault)
    }
}

/// Reports faults as tracing `error!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIndicator;

impl FaultIndicator for LogIndicator {
    fn signal(&self, fault: &Fault) {
        error!(
            size = fault.size,
            class = ?fault.class,
            category = fault.error.category(),
            "FATAL: {}",
            fault.error
        );
    }
}

/// Snapshot of the first fault a [`LatchIndicator`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatchedFault {
    pub size: usize,
    pub class: FaultClass,
    pub message: String,
}

/// Keeps the first fault in a shared latch.
///
/// Clones share one latch, so a caller can keep a handle while the harness
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct LatchIndicator {
    latch: Arc<OnceLock<LatchedFault>>,
}

impl LatchIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a fault has been latched.
    pub fn is_lit(&self) -> bool {
        self.latch.get().is_some()
    }

    /// The latched fault, if any.
    pub fn fault(&self) -> Option<&LatchedFault> {
        self.latch.get()
    }
}

impl FaultIndicator for LatchIndicator {
    fn signal(&self, fault: &Fault) {
        // Later faults leave the first one in place
        let _ = self.latch.set(LatchedFault {
            size: fault.size,
            class: fault.class,
            message: fault.error.to_string(),
        });
    }
}

/// A size that passed.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeOutcome {
    pub size: usize,
    pub report: RoundTripReport,
}

/// How a harness run ended.
#[derive(Debug)]
pub enum HarnessOutcome {
    /// Every size on the ladder passed.
    Passed { completed: Vec<SizeOutcome> },
    /// A size failed. Later sizes were not run.
    Halted {
        completed: Vec<SizeOutcome>,
        fault: Fault,
    },
}

impl HarnessOutcome {
    /// Check if the run stopped on a fault.
    pub fn is_halted(&self) -> bool {
        matches!(self, HarnessOutcome::Halted { .. })
    }

    /// Sizes that passed before the run ended.
    pub fn completed(&self) -> &[SizeOutcome] {
        match self {
            HarnessOutcome::Passed { completed } | HarnessOutcome::Halted { completed, .. } => {
                completed
            }
        }
    }

    /// The fault that halted the run.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            HarnessOutcome::Passed { .. } => None,
            HarnessOutcome::Halted { fault, .. } => Some(fault),
        }
    }

    /// Aggregate counts over the run.
    pub fn summary(&self) -> HarnessSummary {
        let completed = self.completed();
        let passed = completed.len();
        let warnings = completed.iter().map(|o| o.report.findings.len()).sum();
        let mean_savings = if passed == 0 {
            0.0
        } else {
            completed.iter().map(|o| o.report.ratio.savings()).sum::<f64>() / passed as f64
        };

        HarnessSummary {
            runs: passed + usize::from(self.is_halted()),
            passed,
            warnings,
            mean_savings,
        }
    }
}

/// Totals for a harness run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessSummary {
    /// Sizes attempted, including a failing one.
    pub runs: usize,
    /// Sizes that passed.
    pub passed: usize,
    /// Findings across passing sizes.
    pub warnings: usize,
    /// Mean of `savings()` over passing sizes.
    pub mean_savings: f64,
}

impl fmt::Display for HarnessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} sizes passed, {} warnings, mean savings {:.2}",
            self.passed, self.runs, self.warnings, self.mean_savings
        )
    }
}

/// Runs a validator over a [`SizeLadder`].
pub struct Harness<F, S, I> {
    validator: RoundTripValidator<F>,
    fixtures: S,
    indicator: I,
    ladder: SizeLadder,
}

impl<F, S, I> Harness<F, S, I>
where
    F: TransducerFactory,
    S: FixtureSource,
    I: FaultIndicator,
{
    /// Create a harness over the default ladder.
    pub fn new(validator: RoundTripValidator<F>, fixtures: S, indicator: I) -> Self {
        Self {
            validator,
            fixtures,
            indicator,
            ladder: SizeLadder::default(),
        }
    }

    /// Use a different ladder.
    pub fn with_ladder(mut self, ladder: SizeLadder) -> Self {
        self.ladder = ladder;
        self
    }

    /// Get the ladder.
    pub fn ladder(&self) -> SizeLadder {
        self.ladder
    }

    /// Get the fault indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Validate every size in order, halting at the first error.
    pub fn run(&self) -> HarnessOutcome {
        let mut completed = Vec::new();

        for size in self.ladder {
            let fixture = self.fixtures.fixture(size);
            match self.validator.validate(&fixture) {
                Ok(report) => {
                    info!(size, compressed = report.compressed_size, "size passed");
                    completed.push(SizeOutcome { size, report });
                }
                Err(error) => {
                    let fault = Fault::new(size, error);
                    self.indicator.signal(&fault);
                    return HarnessOutcome::Halted { completed, fault };
                }
            }
        }

        HarnessOutcome::Passed { completed }
    }
}
