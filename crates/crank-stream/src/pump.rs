//! The sink/poll/finish pump.
//!
//! A [`Pump`] moves a fixed input through one [`Transducer`] into a
//! [`FixedBuffer`], never assuming a single call makes full progress:
//!
//! ```text
//! reset
//! while sunk < N:
//!     sunk += sink(input[sunk..])          zero accepted => stall
//!     if sunk == N: finish() must be More  (announce)
//!     poll into spare space until Empty    full buffer  => capacity fault
//!     if sunk == N: finish() must be Done  (drain)
//! ```

use crank_core::{Error, FinishPhase, FinishStatus, PollStatus, Result, Role, Transducer};
use tracing::{debug, trace};

use crate::buffer::FixedBuffer;
use crate::DEFAULT_STALL_LIMIT;

/// Stream position counters for one run.
///
/// Both counters only move forward and start at zero for every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Bytes accepted by the transducer so far.
    pub sunk: usize,
    /// Bytes emitted by the transducer so far.
    pub polled: usize,
}

impl Progress {
    #[inline]
    fn advance_sunk(&mut self, n: usize) {
        self.sunk += n;
    }

    #[inline]
    fn advance_polled(&mut self, n: usize) {
        self.polled += n;
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpReport {
    /// Role of the driven transducer.
    pub role: Role,
    /// Input bytes accepted.
    pub consumed: usize,
    /// Output bytes produced.
    pub produced: usize,
    /// Number of sink calls.
    pub sink_calls: usize,
    /// Number of poll calls.
    pub poll_calls: usize,
    /// Every status finish returned, in order.
    pub finish_sequence: Vec<FinishStatus>,
}

impl PumpReport {
    fn new(role: Role) -> Self {
        Self {
            role,
            consumed: 0,
            produced: 0,
            sink_calls: 0,
            poll_calls: 0,
            finish_sequence: Vec::with_capacity(2),
        }
    }
}

/// Drives one transducer to completion over a fixed input.
#[derive(Debug)]
pub struct Pump<T: Transducer> {
    transducer: T,
    ceiling: Option<usize>,
    stall_limit: usize,
}

impl<T: Transducer> Pump<T> {
    /// Create a pump around a transducer.
    ///
    /// Pass `&mut transducer` to keep ownership at the call site.
    pub fn new(transducer: T) -> Self {
        Self {
            transducer,
            ceiling: None,
            stall_limit: DEFAULT_STALL_LIMIT,
        }
    }

    /// Fail with [`Error::OutputOverrun`] once output exceeds `limit` bytes.
    pub fn with_ceiling(mut self, limit: usize) -> Self {
        self.ceiling = Some(limit);
        self
    }

    /// Number of consecutive empty `More` polls tolerated before a stall.
    pub fn with_stall_limit(mut self, limit: usize) -> Self {
        self.stall_limit = limit;
        self
    }

    /// Get a reference to the transducer.
    pub fn transducer(&self) -> &T {
        &self.transducer
    }

    /// Consume the pump and return the transducer.
    pub fn into_inner(self) -> T {
        self.transducer
    }

    /// Run `input` through the transducer into `output`.
    ///
    /// `output` is cleared first. On success its valid region holds exactly
    /// [`PumpReport::produced`] bytes.
    pub fn run(&mut self, input: &[u8], output: &mut FixedBuffer) -> Result<PumpReport> {
        let role = self.transducer.role();
        let total = input.len();

        self.transducer.reset();
        output.clear();

        let mut progress = Progress::default();
        let mut report = PumpReport::new(role);

        while progress.sunk < total {
            let remaining = &input[progress.sunk..];
            let accepted = self
                .transducer
                .sink(remaining)
                .map_err(|e| Error::transducer(role, "sink", e))?;
            report.sink_calls += 1;

            trace!(
                role = role.name(),
                offered = remaining.len(),
                accepted,
                sunk = progress.sunk,
                "sink"
            );

            if accepted > remaining.len() {
                return Err(Error::protocol(
                    role,
                    "sink",
                    format!("accepted {} of {} offered bytes", accepted, remaining.len()),
                ));
            }
            if accepted == 0 {
                return Err(Error::stall(role, progress.sunk, remaining.len()));
            }
            progress.advance_sunk(accepted);

            if progress.sunk == total {
                self.finish(FinishPhase::Announce, &mut report)?;
            }

            self.drain(output, total, &mut progress, &mut report)?;

            if progress.polled >= output.capacity() {
                return Err(Error::CapacityExceeded {
                    role,
                    produced: progress.polled,
                    capacity: output.capacity(),
                });
            }

            if progress.sunk == total {
                self.finish(FinishPhase::Drain, &mut report)?;
            }
        }

        report.consumed = progress.sunk;
        report.produced = progress.polled;

        debug!(
            role = role.name(),
            consumed = report.consumed,
            produced = report.produced,
            sink_calls = report.sink_calls,
            poll_calls = report.poll_calls,
            "pump run complete"
        );

        Ok(report)
    }

    /// Poll until the transducer reports `Empty`.
    fn drain(
        &mut self,
        output: &mut FixedBuffer,
        total: usize,
        progress: &mut Progress,
        report: &mut PumpReport,
    ) -> Result<()> {
        let role = self.transducer.role();
        let mut idle_polls = 0usize;

        loop {
            if output.is_full() {
                return Err(Error::CapacityExceeded {
                    role,
                    produced: progress.polled,
                    capacity: output.capacity(),
                });
            }

            let spare = output.spare_mut();
            let offered = spare.len();
            let (produced, status) = self
                .transducer
                .poll(spare)
                .map_err(|e| Error::transducer(role, "poll", e))?;
            report.poll_calls += 1;

            trace!(
                role = role.name(),
                offered,
                produced,
                polled = progress.polled,
                ?status,
                "poll"
            );

            if produced > offered {
                return Err(Error::protocol(
                    role,
                    "poll",
                    format!("produced {} bytes into {} bytes of space", produced, offered),
                ));
            }
            output.commit(produced)?;
            progress.advance_polled(produced);

            if let Some(limit) = self.ceiling {
                if progress.polled > limit {
                    return Err(Error::OutputOverrun {
                        role,
                        produced: progress.polled,
                        limit,
                    });
                }
            }

            match status {
                PollStatus::Empty => return Ok(()),
                PollStatus::More if produced == 0 => {
                    idle_polls += 1;
                    if idle_polls > self.stall_limit {
                        return Err(Error::stall(role, progress.sunk, total - progress.sunk));
                    }
                }
                PollStatus::More => idle_polls = 0,
            }
        }
    }

    fn finish(&mut self, phase: FinishPhase, report: &mut PumpReport) -> Result<()> {
        let role = self.transducer.role();
        let status = self
            .transducer
            .finish()
            .map_err(|e| Error::transducer(role, phase.operation(), e))?;
        report.finish_sequence.push(status);

        trace!(role = role.name(), phase = phase.operation(), ?status, "finish");

        if status != phase.expected() {
            return Err(Error::protocol(
                role,
                phase.operation(),
                format!("expected {:?}, got {:?}", phase.expected(), status),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Copies input to output, a few bytes per call.
    struct ChunkedCopy {
        pending: Vec<u8>,
        capacity: usize,
        sink_chunk: usize,
        poll_chunk: usize,
        repeat: usize,
        finishing: bool,
    }

    impl ChunkedCopy {
        fn new(capacity: usize, sink_chunk: usize, poll_chunk: usize) -> Self {
            Self {
                pending: Vec::new(),
                capacity,
                sink_chunk,
                poll_chunk,
                repeat: 1,
                finishing: false,
            }
        }

        /// Emit every input byte `repeat` times.
        fn expanding(repeat: usize) -> Self {
            Self {
                repeat,
                ..Self::new(64, 64, 64)
            }
        }
    }

    impl Transducer for ChunkedCopy {
        fn role(&self) -> Role {
            Role::Encode
        }

        fn reset(&mut self) {
            self.pending.clear();
            self.finishing = false;
        }

        fn sink(&mut self, input: &[u8]) -> Result<usize> {
            if self.finishing {
                return Err(Error::InvalidState {
                    expected: "accepting input",
                    actual: "finishing",
                });
            }
            let room = (self.capacity - self.pending.len()) / self.repeat;
            let n = input.len().min(room).min(self.sink_chunk);
            for &byte in &input[..n] {
                for _ in 0..self.repeat {
                    self.pending.push(byte);
                }
            }
            Ok(n)
        }

        fn poll(&mut self, output: &mut [u8]) -> Result<(usize, PollStatus)> {
            let n = self.pending.len().min(output.len()).min(self.poll_chunk);
            output[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            let status = if self.pending.is_empty() {
                PollStatus::Empty
            } else {
                PollStatus::More
            };
            Ok((n, status))
        }

        fn finish(&mut self) -> Result<FinishStatus> {
            self.finishing = true;
            if self.pending.is_empty() {
                Ok(FinishStatus::Done)
            } else {
                Ok(FinishStatus::More)
            }
        }
    }

    /// Misbehaves in one configurable way.
    #[derive(Default)]
    struct Faulty {
        refuse_input: bool,
        overclaim_sink: bool,
        spin_poll: bool,
        done_early: bool,
        fail_poll: bool,
    }

    impl Transducer for Faulty {
        fn role(&self) -> Role {
            Role::Decode
        }

        fn reset(&mut self) {}

        fn sink(&mut self, input: &[u8]) -> Result<usize> {
            if self.refuse_input {
                Ok(0)
            } else if self.overclaim_sink {
                Ok(input.len() + 1)
            } else {
                Ok(input.len())
            }
        }

        fn poll(&mut self, _output: &mut [u8]) -> Result<(usize, PollStatus)> {
            if self.fail_poll {
                Err(Error::InvalidState {
                    expected: "valid stream",
                    actual: "corrupt",
                })
            } else if self.spin_poll {
                Ok((0, PollStatus::More))
            } else {
                Ok((0, PollStatus::Empty))
            }
        }

        fn finish(&mut self) -> Result<FinishStatus> {
            if self.done_early {
                Ok(FinishStatus::Done)
            } else {
                Ok(FinishStatus::More)
            }
        }
    }

    #[test]
    fn test_copies_through_small_chunks() {
        let input: Vec<u8> = (0..100u8).collect();
        let mut output = FixedBuffer::allocate(160).unwrap();
        let mut copy = ChunkedCopy::new(8, 3, 2);

        let report = Pump::new(&mut copy).run(&input, &mut output).unwrap();

        assert_eq!(output.as_slice(), input.as_slice());
        assert_eq!(report.consumed, 100);
        assert_eq!(report.produced, 100);
        assert_eq!(report.sink_calls, 34);
        assert_eq!(
            report.finish_sequence,
            vec![FinishStatus::More, FinishStatus::Done]
        );
    }

    #[test]
    fn test_empty_input() {
        let mut output = FixedBuffer::allocate(4).unwrap();
        let report = Pump::new(ChunkedCopy::new(8, 8, 8))
            .run(&[], &mut output)
            .unwrap();

        assert_eq!(report.produced, 0);
        assert_eq!(report.sink_calls, 0);
        assert!(report.finish_sequence.is_empty());
        assert!(output.is_empty());
    }

    #[test]
    fn test_rerun_resets_counters() {
        let mut output = FixedBuffer::allocate(32).unwrap();
        let mut pump = Pump::new(ChunkedCopy::new(4, 4, 4));

        pump.run(b"first run", &mut output).unwrap();
        assert!(pump.transducer().finishing);
        let report = pump.run(b"second", &mut output).unwrap();

        assert_eq!(report.consumed, 6);
        assert_eq!(output.as_slice(), b"second");
    }

    #[test]
    fn test_transducer_returned_drained() {
        let mut output = FixedBuffer::allocate(32).unwrap();
        let mut pump = Pump::new(ChunkedCopy::new(4, 4, 1));
        assert!(!pump.transducer().finishing);

        pump.run(b"drain me", &mut output).unwrap();
        let copy = pump.into_inner();

        assert!(copy.finishing);
        assert!(copy.pending.is_empty());
        assert_eq!(output.as_slice(), b"drain me");
    }

    #[test]
    fn test_zero_accept_is_stall() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        let mut faulty = Faulty {
            refuse_input: true,
            ..Default::default()
        };

        let err = Pump::new(&mut faulty).run(b"abcd", &mut output).unwrap_err();
        assert!(matches!(
            err,
            Error::Stall {
                role: Role::Decode,
                sunk: 0,
                remaining: 4
            }
        ));
    }

    #[test]
    fn test_overclaimed_sink_is_protocol_violation() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        let mut faulty = Faulty {
            overclaim_sink: true,
            ..Default::default()
        };

        let err = Pump::new(&mut faulty).run(b"abcd", &mut output).unwrap_err();
        assert!(matches!(
            err,
            Error::ProtocolViolation {
                operation: "sink",
                ..
            }
        ));
    }

    #[test]
    fn test_endless_empty_more_is_stall() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        let mut faulty = Faulty {
            spin_poll: true,
            ..Default::default()
        };

        let err = Pump::new(&mut faulty)
            .with_stall_limit(8)
            .run(b"abcd", &mut output)
            .unwrap_err();
        assert!(matches!(err, Error::Stall { .. }));
    }

    #[test]
    fn test_done_on_announce_is_protocol_violation() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        let mut faulty = Faulty {
            done_early: true,
            ..Default::default()
        };

        let err = Pump::new(&mut faulty).run(b"abcd", &mut output).unwrap_err();
        match err {
            Error::ProtocolViolation { operation, .. } => {
                assert_eq!(operation, FinishPhase::Announce.operation())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_more_on_drain_is_protocol_violation() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        // Announce and drain both answer More
        let mut faulty = Faulty::default();

        let err = Pump::new(&mut faulty).run(b"abcd", &mut output).unwrap_err();
        match err {
            Error::ProtocolViolation { operation, .. } => {
                assert_eq!(operation, FinishPhase::Drain.operation())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_poll_error_is_wrapped() {
        let mut output = FixedBuffer::allocate(16).unwrap();
        let mut faulty = Faulty {
            fail_poll: true,
            ..Default::default()
        };

        let err = Pump::new(&mut faulty).run(b"abcd", &mut output).unwrap_err();
        assert!(matches!(
            err,
            Error::Transducer {
                operation: "poll",
                ..
            }
        ));
    }

    #[test]
    fn test_expansion_hits_capacity() {
        let input = [7u8; 8];
        // 8 + 4 + 4 = 16 bytes, exactly what a 2x expansion needs
        let mut output = crate::BufferSizing::default().allocate_for(input.len()).unwrap();

        let err = Pump::new(ChunkedCopy::expanding(2))
            .run(&input, &mut output)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::CapacityExceeded {
                produced: 16,
                capacity: 16,
                ..
            }
        ));
        assert!(output.len() <= output.capacity());
    }

    #[test]
    fn test_expansion_never_writes_past_capacity() {
        let input = [1u8; 8];
        let mut output = FixedBuffer::allocate(11).unwrap();

        let err = Pump::new(ChunkedCopy::expanding(3))
            .run(&input, &mut output)
            .unwrap_err();

        assert!(err.is_capacity_fault());
        assert_eq!(output.len(), 11);
    }

    #[test]
    fn test_ceiling_overrun() {
        let mut output = FixedBuffer::allocate(64).unwrap();

        let err = Pump::new(ChunkedCopy::new(16, 16, 16))
            .with_ceiling(10)
            .run(&[0u8; 12], &mut output)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::OutputOverrun {
                produced: 12,
                limit: 10,
                ..
            }
        ));
    }
}
