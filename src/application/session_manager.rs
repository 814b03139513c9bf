//! Session Manager - owns the bus session and logs in on demand.
//!
//! Callers never log in themselves. The first `get_session` performs the
//! login while holding the manager's lock, so concurrent callers wait and
//! reuse the same session instead of logging in twice.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::domain::bus::{Session, SessionPhase};
use crate::domain::foundation::StateMachine;
use crate::ports::{AuthError, BusAuthenticator};

/// Lazily acquires and caches the bus session.
pub struct SessionManager {
    authenticator: Arc<dyn BusAuthenticator>,
    current: Mutex<Option<Arc<Session>>>,
    phase: watch::Sender<SessionPhase>,
}

impl SessionManager {
    pub fn new(authenticator: Arc<dyn BusAuthenticator>) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Uninitialized);
        Self {
            authenticator,
            current: Mutex::new(None),
            phase,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Subscribes to phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, to: SessionPhase) {
        self.phase.send_if_modified(|phase| match phase.transition_to(to) {
            Ok(next) => {
                *phase = next;
                true
            }
            Err(e) => {
                warn!(error = %e, "Ignoring invalid session phase change");
                false
            }
        });
    }

    /// Returns the cached session, logging in first if there is none or it
    /// has expired.
    ///
    /// A failed login is returned to the caller; the next call tries again.
    pub async fn get_session(&self) -> Result<Arc<Session>, AuthError> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if !session.is_expired() {
                return Ok(Arc::clone(session));
            }
            info!(expired_at = %session.expires_at(), "Bus session expired");
            *current = None;
        }

        self.set_phase(SessionPhase::Initializing);
        match self.authenticator.login().await {
            Ok(session) => {
                let session = Arc::new(session);
                info!(
                    user = session.user().unwrap_or("unknown"),
                    expires_at = %session.expires_at(),
                    "Logged into event bus"
                );
                *current = Some(Arc::clone(&session));
                self.set_phase(SessionPhase::Ready);
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Event bus login failed");
                self.set_phase(SessionPhase::Failed);
                Err(e)
            }
        }
    }

    /// Drops the cached session so the next `get_session` logs in again.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        if current.take().is_some() {
            info!("Bus session invalidated");
        }
        if self.phase() != SessionPhase::Uninitialized {
            self.set_phase(SessionPhase::Uninitialized);
        }
    }
}
