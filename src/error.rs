//! Error types for host-side enclave operations.
//!
//! The host surface exposes a closed result taxonomy; every error this crate
//! produces collapses onto one of the [`ResultCode`] values via
//! [`HostError::code`].

use crate::transport::{TeeStatus, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for host-side enclave operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Which transport acquisition step a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportOp {
    /// Opening the session-independent channel to the TEE subsystem.
    ContextOpen,
    /// Opening the session bound to one trusted application.
    SessionOpen,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportOp::ContextOpen => write!(f, "context open"),
            TransportOp::SessionOpen => write!(f, "session open"),
        }
    }
}

/// Errors that can occur while managing an enclave session.
#[derive(Debug, Error)]
pub enum HostError {
    /// A caller-supplied argument was rejected before any resource was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A trusted-application identifier did not decode to a binary identity.
    #[error("malformed trusted application identifier: {0:?}")]
    MalformedIdentifier(String),

    /// The transport reported memory exhaustion.
    #[error("out of memory")]
    OutOfMemory,

    /// A transport call failed; carries the transport status and, where the
    /// transport reported one, the error origin.
    #[error("transport {op} failed: {err}")]
    Transport { op: TransportOp, err: TransportError },

    /// The per-enclave worker thread could not be started.
    #[error("could not start the enclave worker thread")]
    Worker(#[source] std::io::Error),

    /// The operation is declared but not supported by this transport.
    #[error("operation not supported")]
    NotSupported,

    /// Internal invariant violation.
    #[error("unexpected internal error")]
    Unexpected,
}

impl HostError {
    /// Wrap a transport failure, keeping the step it came from.
    ///
    /// A transport-reported memory exhaustion surfaces as [`HostError::OutOfMemory`]
    /// rather than a generic transport failure.
    pub(crate) fn transport(op: TransportOp, err: TransportError) -> Self {
        if err.status == TeeStatus::OUT_OF_MEMORY {
            HostError::OutOfMemory
        } else {
            HostError::Transport { op, err }
        }
    }

    /// Collapse onto the closed result taxonomy of the host interface.
    pub fn code(&self) -> ResultCode {
        match self {
            HostError::InvalidArgument(_) | HostError::MalformedIdentifier(_) => {
                ResultCode::InvalidArgument
            }
            HostError::OutOfMemory => ResultCode::OutOfMemory,
            HostError::Transport { .. } | HostError::Worker(_) => ResultCode::Failure,
            HostError::NotSupported => ResultCode::NotSupported,
            HostError::Unexpected => ResultCode::Unexpected,
        }
    }
}

/// Closed result taxonomy of the host interface.
///
/// Success is `Ok(..)` on the Rust surface; the remaining codes cover every
/// failure the crate can return. [`HostError::MalformedIdentifier`] is a
/// specialization of `InvalidArgument`, and worker-start failures fold into
/// `Failure` alongside transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    InvalidArgument,
    OutOfMemory,
    Failure,
    NotSupported,
    Unexpected,
}
