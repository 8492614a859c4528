//! # Crank Stream
//!
//! Fixed-capacity buffers and the pump that drives a transducer through them.
//!
//! ## Features
//!
//! - **Fixed Buffers**: Allocation is checked, writes never grow or truncate
//! - **Pump**: Sink/poll/finish driver tolerant of partial progress per call
//! - **Fault Detection**: Stalls, capacity overruns and bad statuses are errors
//!
//! ## Example
//!
//! ```ignore
//! use crank_stream::{BufferSizing, Pump};
//!
//! let mut compressed = BufferSizing::default().allocate_for(input.len())?;
//! let report = Pump::new(&mut encoder).run(&input, &mut compressed)?;
//! assert_eq!(report.produced, compressed.len());
//! ```

mod buffer;
mod pump;

pub use buffer::{BufferSizing, FixedBuffer};
pub use pump::{Progress, Pump, PumpReport};

/// Default bytes added to `n + n/2` when sizing output buffers.
pub const DEFAULT_MARGIN: usize = 4;

/// Default number of consecutive zero-byte `More` polls treated as a stall.
pub const DEFAULT_STALL_LIMIT: usize = 64;
