//! TeeGate — host-side session lifecycle for TEE trusted applications
//!
//! Manages the untrusted half of a Trusted Execution Environment
//! connection: resolving a trusted-application path into the 16-byte
//! identity the transport understands, acquiring the transport context and
//! session in strict order, and guaranteeing that a handle is either fully
//! initialized or unwound without leaking a single resource.

pub mod enclave;
pub mod error;
pub mod identity;
pub mod transport;

pub use enclave::{
    Enclave, EnclaveKind, EnclaveStatus, HostCallFn, FLAG_DEBUG, FLAG_RESERVED, FLAG_SIMULATE,
};
pub use error::{HostError, Result, ResultCode, TransportOp};
pub use identity::TaUuid;
pub use transport::{
    ContextHandle, ErrorOrigin, LoginMethod, SessionHandle, SimTransport, TeeClient, TeeStatus,
    TransportError,
};
