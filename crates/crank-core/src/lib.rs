//! # Crank Core
//!
//! Core error, types and transducer traits for the Crank stream pump.
//!
//! Crank drives incremental compression state machines ("transducers")
//! through fixed-size buffers, one `sink`/`poll`/`finish` call at a time,
//! the way a memory-constrained device has to.
//!
//! ## Design Philosophy
//!
//! - **Bounded memory**: Buffers are sized once per run and never grow
//! - **No progress assumptions**: A call may accept or emit any amount
//! - **Fail loudly**: Every protocol or capacity violation is an error value
//!
//! ## Core Traits
//!
//! - [`Transducer`] - Incremental sink/poll/finish state machine
//!
//! ## Example
//!
//! ```ignore
//! use crank_core::{FinishStatus, PollStatus, Transducer};
//!
//! let accepted = encoder.sink(&input)?;
//! let (produced, status) = encoder.poll(&mut output)?;
//! if encoder.finish()? == FinishStatus::More {
//!     // keep polling
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, FaultClass, Result};
pub use traits::{FinishPhase, FinishStatus, PollStatus, Transducer};
pub use types::{CompressionRatio, Role};
