//! Scoped acquisition of transport resources.
//!
//! Enclave creation acquires a context and then a session. Each acquisition
//! is wrapped in a guard that releases the resource on drop unless it is
//! committed into the handle. Declaring the guards in acquisition order
//! makes any early return unwind them in reverse order, which is exactly
//! the teardown ordering the transport requires; a released or committed
//! guard never fires twice.

use crate::transport::{ContextHandle, SessionHandle, TeeClient};

pub(crate) struct ContextGuard<'t> {
    transport: &'t dyn TeeClient,
    context: Option<ContextHandle>,
}

impl<'t> ContextGuard<'t> {
    pub fn new(transport: &'t dyn TeeClient, context: ContextHandle) -> Self {
        Self {
            transport,
            context: Some(context),
        }
    }

    pub fn handle(&self) -> &ContextHandle {
        match &self.context {
            Some(context) => context,
            None => unreachable!("context guard inspected after commit"),
        }
    }

    /// Hand the context over to its long-term owner; the guard stands down.
    pub fn commit(mut self) -> ContextHandle {
        match self.context.take() {
            Some(context) => context,
            None => unreachable!("context guard committed twice"),
        }
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            log::debug!("unwinding transport context {}", context.raw());
            self.transport.finalize_context(context);
        }
    }
}

pub(crate) struct SessionGuard<'t> {
    transport: &'t dyn TeeClient,
    session: Option<SessionHandle>,
}

impl<'t> SessionGuard<'t> {
    pub fn new(transport: &'t dyn TeeClient, session: SessionHandle) -> Self {
        Self {
            transport,
            session: Some(session),
        }
    }

    /// Hand the session over to its long-term owner; the guard stands down.
    pub fn commit(mut self) -> SessionHandle {
        match self.session.take() {
            Some(session) => session,
            None => unreachable!("session guard committed twice"),
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("unwinding transport session {}", session.raw());
            self.transport.close_session(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SimTransport;

    #[test]
    fn test_dropped_guard_releases() {
        let sim = SimTransport::new();
        {
            let context = sim.initialize_context().unwrap();
            let _guard = ContextGuard::new(&sim, context);
        }
        assert_eq!(sim.counters().contexts_finalized, 1);
    }

    #[test]
    fn test_committed_guard_does_not_release() {
        let sim = SimTransport::new();
        let context = {
            let guard = ContextGuard::new(&sim, sim.initialize_context().unwrap());
            guard.commit()
        };
        assert_eq!(sim.counters().contexts_finalized, 0);
        sim.finalize_context(context);
        assert_eq!(sim.counters().contexts_finalized, 1);
    }

    #[test]
    fn test_guards_unwind_in_reverse_order() {
        let sim = SimTransport::new();
        let ta = crate::identity::TaUuid::from_path("12345678-1234-1234-1234-123456789abc")
            .unwrap();
        {
            let ctx_guard = ContextGuard::new(&sim, sim.initialize_context().unwrap());
            let session = sim
                .open_session(ctx_guard.handle(), &ta, Default::default())
                .unwrap();
            let _session_guard = SessionGuard::new(&sim, session);
            // Both guards drop here, session first.
        }
        let counters = sim.counters();
        assert_eq!(counters.sessions_closed, 1);
        assert_eq!(counters.contexts_finalized, 1);
        assert_eq!(sim.live_sessions(), 0);
        assert_eq!(sim.live_contexts(), 0);
    }
}
