//! TEE client transport contract.
//!
//! The crate consumes the TEE subsystem as an opaque service with a fixed
//! request/response shape:
//! - **Context initialization**: a session-independent channel to the TEE.
//! - **Session open**: a channel bound to one trusted-application identity,
//!   presented with a login method.
//! - **Session close / context finalize**: the matching release calls.
//!
//! Failures carry a numeric [`TeeStatus`] and, for session opens, an
//! [`ErrorOrigin`] distinguishing which side of the transport failed.
//! [`sim::SimTransport`] is an always-available software backend for
//! development and tests.

pub mod sim;

use crate::identity::TaUuid;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use sim::SimTransport;

/// Status code reported by the TEE client transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeeStatus(pub u32);

impl TeeStatus {
    pub const SUCCESS: TeeStatus = TeeStatus(0x0000_0000);
    pub const GENERIC: TeeStatus = TeeStatus(0xFFFF_0000);
    pub const ACCESS_DENIED: TeeStatus = TeeStatus(0xFFFF_0001);
    pub const BAD_PARAMETERS: TeeStatus = TeeStatus(0xFFFF_0006);
    pub const ITEM_NOT_FOUND: TeeStatus = TeeStatus(0xFFFF_0008);
    pub const OUT_OF_MEMORY: TeeStatus = TeeStatus(0xFFFF_000C);
    pub const BUSY: TeeStatus = TeeStatus(0xFFFF_000D);
    pub const COMMUNICATION: TeeStatus = TeeStatus(0xFFFF_000E);
    pub const TARGET_DEAD: TeeStatus = TeeStatus(0xFFFF_3024);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for TeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Which side of the transport a session-open failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorOrigin {
    /// The client API itself rejected the request.
    Api,
    /// The communication path to the TEE failed.
    Comms,
    /// The trusted OS rejected the request.
    Tee,
    /// The target trusted application rejected the request.
    TrustedApp,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorOrigin::Api => "api",
            ErrorOrigin::Comms => "comms",
            ErrorOrigin::Tee => "tee",
            ErrorOrigin::TrustedApp => "trusted-app",
        };
        write!(f, "{name}")
    }
}

/// Login method presented when opening a session.
///
/// Enclave creation always presents [`LoginMethod::Public`]; the other
/// methods exist so a wider session surface can be added without a breaking
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoginMethod {
    /// Non-interactive, no credentials.
    #[default]
    Public,
    User,
    Group,
    Application,
}

/// A failure reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportError {
    pub status: TeeStatus,
    /// Set for session opens, where the transport distinguishes origins.
    pub origin: Option<ErrorOrigin>,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Some(origin) => write!(f, "status {} (origin {origin})", self.status),
            None => write!(f, "status {}", self.status),
        }
    }
}

impl std::error::Error for TransportError {}

/// Exclusive handle to an open transport context.
///
/// Deliberately neither `Clone` nor `Copy`: exactly one owner releases it,
/// by value, through [`TeeClient::finalize_context`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ContextHandle(u64);

impl ContextHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Exclusive handle to an open transport session.
///
/// Same ownership rule as [`ContextHandle`]; released by value through
/// [`TeeClient::close_session`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

impl SessionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Client-side contract of the TEE transport.
///
/// Context and session establishment are blocking calls with no timeout or
/// cancellation; a hang in the underlying transport hangs the caller. The
/// release calls are infallible by contract and consume their handle.
pub trait TeeClient: Send + Sync {
    /// Open a session-independent channel to the TEE subsystem.
    fn initialize_context(&self) -> std::result::Result<ContextHandle, TransportError>;

    /// Open a session against one trusted-application identity.
    fn open_session(
        &self,
        context: &ContextHandle,
        target: &TaUuid,
        login: LoginMethod,
    ) -> std::result::Result<SessionHandle, TransportError>;

    /// Close an open session.
    fn close_session(&self, session: SessionHandle);

    /// Finalize an open context.
    fn finalize_context(&self, context: ContextHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(TeeStatus::SUCCESS.to_string(), "0x00000000");
        assert_eq!(TeeStatus::ITEM_NOT_FOUND.to_string(), "0xffff0008");
        assert!(TeeStatus::SUCCESS.is_success());
        assert!(!TeeStatus::GENERIC.is_success());
    }

    #[test]
    fn test_transport_error_display() {
        let with_origin = TransportError {
            status: TeeStatus::COMMUNICATION,
            origin: Some(ErrorOrigin::Comms),
        };
        assert_eq!(
            with_origin.to_string(),
            "status 0xffff000e (origin comms)"
        );

        let without = TransportError {
            status: TeeStatus::GENERIC,
            origin: None,
        };
        assert_eq!(without.to_string(), "status 0xffff0000");
    }

    #[test]
    fn test_default_login_is_public() {
        assert_eq!(LoginMethod::default(), LoginMethod::Public);
    }
}
