//! Simulated transport backend.
//!
//! An in-process [`TeeClient`] that stands in for a real TEE driver during
//! development and tests. NOT hardware-backed: it accepts any trusted
//! application identity, tracks live contexts and sessions, counts every
//! operation, and supports one-shot failure injection for the two
//! acquisition calls.

use super::{
    ContextHandle, ErrorOrigin, LoginMethod, SessionHandle, TeeClient, TeeStatus, TransportError,
};
use crate::identity::TaUuid;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Operation counts accumulated by a [`SimTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimCounters {
    pub contexts_opened: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub contexts_finalized: u64,
}

#[derive(Default)]
struct SimState {
    counters: SimCounters,
    live_contexts: HashSet<u64>,
    /// session id -> owning context id
    live_sessions: HashMap<u64, u64>,
    fail_context: Option<TransportError>,
    fail_session: Option<TransportError>,
}

/// Software TEE transport for development and tests.
#[derive(Default)]
pub struct SimTransport {
    next_id: AtomicU64,
    state: Mutex<SimState>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `initialize_context` call fail with `status`.
    pub fn fail_next_context_open(&self, status: TeeStatus) {
        self.state().fail_context = Some(TransportError {
            status,
            origin: None,
        });
    }

    /// Make the next `open_session` call fail with `status` and `origin`.
    pub fn fail_next_session_open(&self, status: TeeStatus, origin: ErrorOrigin) {
        self.state().fail_session = Some(TransportError {
            status,
            origin: Some(origin),
        });
    }

    /// Snapshot of the accumulated operation counts.
    pub fn counters(&self) -> SimCounters {
        self.state().counters
    }

    /// Number of contexts opened and not yet finalized.
    pub fn live_contexts(&self) -> usize {
        self.state().live_contexts.len()
    }

    /// Number of sessions opened and not yet closed.
    pub fn live_sessions(&self) -> usize {
        self.state().live_sessions.len()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl TeeClient for SimTransport {
    fn initialize_context(&self) -> Result<ContextHandle, TransportError> {
        let mut state = self.state();
        if let Some(err) = state.fail_context.take() {
            return Err(err);
        }
        let id = self.next_id();
        state.counters.contexts_opened += 1;
        state.live_contexts.insert(id);
        Ok(ContextHandle::new(id))
    }

    fn open_session(
        &self,
        context: &ContextHandle,
        target: &TaUuid,
        _login: LoginMethod,
    ) -> Result<SessionHandle, TransportError> {
        let mut state = self.state();
        if let Some(err) = state.fail_session.take() {
            return Err(err);
        }
        if !state.live_contexts.contains(&context.raw()) {
            // Session open against a context this transport never issued.
            return Err(TransportError {
                status: TeeStatus::BAD_PARAMETERS,
                origin: Some(ErrorOrigin::Api),
            });
        }
        let id = self.next_id();
        state.counters.sessions_opened += 1;
        state.live_sessions.insert(id, context.raw());
        log::debug!("sim transport: session {id} opened against ta={target}");
        Ok(SessionHandle::new(id))
    }

    fn close_session(&self, session: SessionHandle) {
        let mut state = self.state();
        if state.live_sessions.remove(&session.raw()).is_some() {
            state.counters.sessions_closed += 1;
        } else {
            log::warn!("sim transport: close of unknown session {}", session.raw());
        }
    }

    fn finalize_context(&self, context: ContextHandle) {
        let mut state = self.state();
        if state.live_contexts.remove(&context.raw()) {
            let orphans = state
                .live_sessions
                .values()
                .filter(|owner| **owner == context.raw())
                .count();
            if orphans > 0 {
                log::warn!(
                    "sim transport: context {} finalized with {orphans} session(s) still open",
                    context.raw()
                );
            }
            state.counters.contexts_finalized += 1;
        } else {
            log::warn!(
                "sim transport: finalize of unknown context {}",
                context.raw()
            );
        }
    }
}
