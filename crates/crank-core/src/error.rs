//! Error types for pump and round-trip operations.

use thiserror::Error;

use crate::types::Role;

/// Result type alias for pump operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Pump and validation error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Transducer accepted nothing (or produced nothing) while work remained.
    #[error("{role} transducer stalled after {sunk} bytes with {remaining} bytes pending")]
    Stall {
        role: Role,
        sunk: usize,
        remaining: usize,
    },

    /// Transducer returned a status the pump cannot continue from.
    #[error("{role} protocol violation in {operation}: {detail}")]
    ProtocolViolation {
        role: Role,
        operation: &'static str,
        detail: String,
    },

    /// Transducer reported an error from one of its operations.
    #[error("{role} transducer failed in {operation}: {source}")]
    Transducer {
        role: Role,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Output reached the sized margin of its buffer.
    #[error("{role} output reached buffer capacity: produced {produced} of {capacity} bytes")]
    CapacityExceeded {
        role: Role,
        produced: usize,
        capacity: usize,
    },

    /// Output grew past the caller's ceiling.
    #[error("{role} output overran limit: produced {produced}, limit {limit}")]
    OutputOverrun {
        role: Role,
        produced: usize,
        limit: usize,
    },

    /// Write would land past the end of a fixed buffer.
    #[error("buffer overflow: {len} bytes at offset {offset} exceed capacity {capacity}")]
    BufferOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Recovered length differs from the original.
    #[error("size mismatch: expected {expected} bytes, recovered {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Recovered content differs from the original.
    #[error("content mismatch at index {index}: expected 0x{expected:02x}, found {}", display_found(.found))]
    ContentMismatch {
        index: usize,
        expected: u8,
        found: Option<u8>,
    },

    /// Memory allocation failed.
    #[error("allocation failed: could not allocate {requested_bytes} bytes")]
    AllocationFailed { requested_bytes: usize },

    /// Configuration rejected before any run started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation called in a state that does not allow it.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_found(found: &Option<u8>) -> String {
    match found {
        Some(byte) => format!("0x{:02x}", byte),
        None => "<missing>".to_string(),
    }
}

/// Broad classification of a fault, used to decide how the harness reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// Transducer and pump disagree on state.
    Protocol,
    /// A sized buffer or output limit was exceeded.
    Capacity,
    /// Recovered data differs from the original.
    Integrity,
    /// Memory could not be obtained.
    Allocation,
    /// Bad parameters or API misuse.
    Configuration,
    /// Underlying I/O failed.
    Io,
}

impl Error {
    /// Create a stall error.
    pub fn stall(role: Role, sunk: usize, remaining: usize) -> Self {
        Error::Stall {
            role,
            sunk,
            remaining,
        }
    }

    /// Create a protocol violation error.
    pub fn protocol(role: Role, operation: &'static str, detail: impl Into<String>) -> Self {
        Error::ProtocolViolation {
            role,
            operation,
            detail: detail.into(),
        }
    }

    /// Wrap an error reported by a transducer operation.
    pub fn transducer(role: Role, operation: &'static str, source: Error) -> Self {
        Error::Transducer {
            role,
            operation,
            source: Box::new(source),
        }
    }

    /// Create a buffer overflow error.
    pub fn buffer_overflow(offset: usize, len: usize, capacity: usize) -> Self {
        Error::BufferOverflow {
            offset,
            len,
            capacity,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    /// Classify the error.
    pub fn class(&self) -> FaultClass {
        match self {
            Error::Stall { .. } | Error::ProtocolViolation { .. } | Error::Transducer { .. } => {
                FaultClass::Protocol
            }
            Error::CapacityExceeded { .. }
            | Error::OutputOverrun { .. }
            | Error::BufferOverflow { .. } => FaultClass::Capacity,
            Error::SizeMismatch { .. } | Error::ContentMismatch { .. } => FaultClass::Integrity,
            Error::AllocationFailed { .. } => FaultClass::Allocation,
            Error::InvalidConfig(_) | Error::InvalidState { .. } => FaultClass::Configuration,
            Error::Io(_) => FaultClass::Io,
        }
    }

    /// Check if the error suggests the sized memory margins can no longer be trusted.
    pub fn is_capacity_fault(&self) -> bool {
        self.class() == FaultClass::Capacity
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Stall { .. } => "stall",
            Error::ProtocolViolation { .. } => "protocol_violation",
            Error::Transducer { .. } => "transducer_error",
            Error::CapacityExceeded { .. } => "capacity_exceeded",
            Error::OutputOverrun { .. } => "output_overrun",
            Error::BufferOverflow { .. } => "buffer_overflow",
            Error::SizeMismatch { .. } => "size_mismatch",
            Error::ContentMismatch { .. } => "content_mismatch",
            Error::AllocationFailed { .. } => "allocation_failed",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidState { .. } => "invalid_state",
            Error::Io(_) => "io_error",
        }
    }
}
