//! Enclave session lifecycle.
//!
//! [`Enclave::create`] turns a trusted-application path into a live,
//! fully-initialized handle: it resolves the binary identity, then acquires
//! the per-handle entry lock, a transport context, and a transport session,
//! strictly in that order. Any failure unwinds every resource acquired so
//! far in reverse order before the error surfaces; a caller either holds a
//! usable handle or nothing.
//!
//! Call dispatch and explicit termination are declared surfaces that this
//! transport does not support yet. The entry lock already fixes the
//! concurrency contract both must obey: at most one in-flight call per
//! handle.

mod acquire;

use crate::error::{HostError, Result, TransportOp};
use crate::identity::TaUuid;
use crate::transport::{ContextHandle, LoginMethod, SessionHandle, TeeClient};
use acquire::{ContextGuard, SessionGuard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::thread;

/// Recognized enclave kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnclaveKind {
    Sgx,
    Optee,
}

/// Flag requesting a debug session. Debug sessions are not supported by
/// this transport.
pub const FLAG_DEBUG: u32 = 0x1;
/// Flag requesting simulation mode. Tolerated; backend selection is the
/// transport's concern.
pub const FLAG_SIMULATE: u32 = 0x2;
/// Every bit with no assigned meaning.
pub const FLAG_RESERVED: u32 = !(FLAG_DEBUG | FLAG_SIMULATE);

/// A host function the trusted side may invoke once call dispatch lands.
pub type HostCallFn = fn(&[u8]) -> Vec<u8>;

/// Sentinel detecting use of a destroyed or corrupted handle.
const HANDLE_MAGIC: u32 = 0x4543_4c56;

/// A live connection to one trusted application.
///
/// Constructed only by [`Enclave::create`]; never observable in a
/// partially-initialized state. Dropping the handle releases the session,
/// the context, and the entry lock in that order and joins the worker
/// thread.
pub struct Enclave {
    magic: u32,
    uuid: TaUuid,
    kind: EnclaveKind,
    transport: Arc<dyn TeeClient>,
    session: Option<SessionHandle>,
    context: Option<ContextHandle>,
    /// Single serialization point for entries into this enclave. Future
    /// call dispatch must hold it for the duration of every entry.
    entry_lock: Mutex<()>,
    /// Reserved slot for asynchronous inbound-call processing.
    worker: Option<thread::JoinHandle<()>>,
    host_calls: &'static [HostCallFn],
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Enclave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enclave")
            .field("magic", &self.magic)
            .field("uuid", &self.uuid)
            .field("kind", &self.kind)
            .field("session", &self.session)
            .field("context", &self.context)
            .field("entry_lock", &self.entry_lock)
            .field("worker", &self.worker)
            .field("host_calls", &self.host_calls.len())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Point-in-time snapshot of a handle, for logs and tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnclaveStatus {
    pub ta: String,
    pub kind: EnclaveKind,
    pub created_at: DateTime<Utc>,
    pub host_call_count: usize,
    pub is_valid: bool,
}

impl Enclave {
    /// Create an enclave handle for the trusted application at `path`.
    ///
    /// `flags` must not set [`FLAG_DEBUG`] or any reserved bit, and this
    /// transport accepts no out-of-band `config` blob; violations are
    /// rejected before any resource is touched. The session is opened with
    /// the fixed non-interactive [`LoginMethod::Public`] and no
    /// session-specific payload.
    ///
    /// Blocks without timeout while the transport establishes the context
    /// and session.
    pub fn create(
        transport: Arc<dyn TeeClient>,
        path: &str,
        kind: EnclaveKind,
        flags: u32,
        config: Option<&[u8]>,
        host_calls: &'static [HostCallFn],
    ) -> Result<Self> {
        // Parameter checks come before any resource is touched.
        if flags & FLAG_RESERVED != 0 {
            return Err(HostError::InvalidArgument("reserved enclave flag set"));
        }
        if flags & FLAG_DEBUG != 0 {
            return Err(HostError::InvalidArgument(
                "debug sessions are not supported by this transport",
            ));
        }
        if config.is_some() {
            return Err(HostError::InvalidArgument(
                "out-of-band enclave configuration is not supported by this transport",
            ));
        }

        let uuid = TaUuid::from_path(path)?;

        // First acquisition. Infallible here; lives for the handle's whole
        // life as the entry serialization point.
        let entry_lock = Mutex::new(());

        // Second and third acquisitions, in order. Each guard releases its
        // resource on drop unless committed, so any early return below
        // unwinds session-then-context with nothing released twice.
        let context = ContextGuard::new(
            transport.as_ref(),
            transport
                .initialize_context()
                .map_err(|err| HostError::transport(TransportOp::ContextOpen, err))?,
        );
        let session = SessionGuard::new(
            transport.as_ref(),
            transport
                .open_session(context.handle(), &uuid, LoginMethod::Public)
                .map_err(|err| HostError::transport(TransportOp::SessionOpen, err))?,
        );

        // Reserved worker for future asynchronous inbound-call processing;
        // it currently has nothing to do and exits immediately.
        let worker = thread::Builder::new()
            .name("enclave-worker".into())
            .spawn(|| {})
            .map_err(HostError::Worker)?;

        let session = session.commit();
        let context = context.commit();
        log::info!("enclave session established: kind={kind:?} ta={uuid}");

        Ok(Self {
            magic: HANDLE_MAGIC,
            uuid,
            kind,
            transport,
            session: Some(session),
            context: Some(context),
            entry_lock,
            worker: Some(worker),
            host_calls,
            created_at: Utc::now(),
        })
    }

    /// Dispatch a call into the trusted application.
    ///
    /// Not supported by this transport yet: always fails, touching neither
    /// the handle nor the transport. When dispatch lands it must hold the
    /// entry lock for its whole duration and return the number of bytes
    /// written to `output`.
    pub fn call(&self, function_id: u32, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let _ = (function_id, input, output);
        Err(HostError::NotSupported)
    }

    /// Explicitly terminate the enclave connection.
    ///
    /// Not supported by this transport yet: always fails and mutates
    /// nothing. The eventual contract reverses creation exactly:
    /// invalidate the tag, close the session, finalize the context, drop
    /// the entry lock, then join the worker.
    pub fn terminate(&mut self) -> Result<()> {
        Err(HostError::NotSupported)
    }

    /// Binary identity of the connected trusted application.
    pub fn uuid(&self) -> &TaUuid {
        &self.uuid
    }

    pub fn kind(&self) -> EnclaveKind {
        self.kind
    }

    /// The host-call table registered at creation, verbatim.
    pub fn host_calls(&self) -> &'static [HostCallFn] {
        self.host_calls
    }

    /// Whether the validity tag is intact.
    pub fn is_valid(&self) -> bool {
        self.magic == HANDLE_MAGIC
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Entry lock shared with the call-dispatch layer. Per-handle, never
    /// process-wide: distinct handles stay independently enterable.
    pub fn entry_lock(&self) -> &Mutex<()> {
        &self.entry_lock
    }

    pub fn status(&self) -> EnclaveStatus {
        EnclaveStatus {
            ta: self.uuid.to_string(),
            kind: self.kind,
            created_at: self.created_at,
            host_call_count: self.host_calls.len(),
            is_valid: self.is_valid(),
        }
    }
}

impl Drop for Enclave {
    fn drop(&mut self) {
        // Invalidate first so a stale reference trips the tag check even
        // while teardown is in flight.
        self.magic = 0;
        if let Some(session) = self.session.take() {
            log::debug!("closing transport session for ta={}", self.uuid);
            self.transport.close_session(session);
        }
        if let Some(context) = self.context.take() {
            log::debug!("finalizing transport context for ta={}", self.uuid);
            self.transport.finalize_context(context);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("enclave worker thread panicked for ta={}", self.uuid);
            }
        }
    }
}
