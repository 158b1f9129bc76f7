use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::credentials::{Credential, CredentialStore, StorageError};

/// Notice shown when the backend rejects the stored token.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Why the most recent transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    Startup,
    Restored,
    SignedIn,
    SignedUp,
    LoggedOut,
    Expired,
}

impl TransitionReason {
    /// Message to surface to the user, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            TransitionReason::Expired => Some(SESSION_EXPIRED_NOTICE),
            _ => None,
        }
    }
}

/// What subscribers observe: the current state, the reason it was entered,
/// and a counter bumped on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub reason: TransitionReason,
    pub epoch: u64,
}

/// Gatekeeper for the authenticated part of the app.
///
/// Owns the credential store for writes that accompany a transition (save on
/// sign-in, clear on logout or expiry). Share it behind an `Arc`; screens call
/// [`SessionController::subscribe`] to react to transitions.
pub struct SessionController {
    store: Arc<dyn CredentialStore>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Start unauthenticated regardless of what the store holds.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_state(store, SessionState::Unauthenticated, TransitionReason::Startup)
    }

    /// Start authenticated if the store already holds a credential. The
    /// backend may still reject it; the first 401 will flip the state back.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Self {
        match store.load() {
            Ok(Some(credential)) => {
                info!(user_id = %credential.user_id, "Restored saved session");
                Self::with_state(store, SessionState::Authenticated, TransitionReason::Restored)
            }
            Ok(None) => Self::new(store),
            Err(e) => {
                warn!(error = %e, "Failed to read saved session, starting signed out");
                Self::new(store)
            }
        }
    }

    fn with_state(
        store: Arc<dyn CredentialStore>,
        state: SessionState,
        reason: TransitionReason,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot {
            state,
            reason,
            epoch: 0,
        });
        Self { store, tx }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        *self.tx.borrow()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Number of transitions since the controller was created.
    pub fn epoch(&self) -> u64 {
        self.snapshot().epoch
    }

    fn transition(snapshot: &mut SessionSnapshot, state: SessionState, reason: TransitionReason) {
        snapshot.state = state;
        snapshot.reason = reason;
        snapshot.epoch += 1;
    }

    /// Persist `credential`, then become authenticated. If the save fails the
    /// state is left untouched.
    pub fn establish(
        &self,
        credential: &Credential,
        reason: TransitionReason,
    ) -> Result<(), StorageError> {
        self.store.save(credential)?;
        self.tx.send_modify(|s| Self::transition(s, SessionState::Authenticated, reason));
        info!(user_id = %credential.user_id, ?reason, "Session established");
        Ok(())
    }

    /// Explicit sign-out: clear the store, then become unauthenticated.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        let changed = self.tx.send_if_modified(|s| {
            if s.state == SessionState::Authenticated {
                Self::transition(s, SessionState::Unauthenticated, TransitionReason::LoggedOut);
                true
            } else {
                false
            }
        });
        if changed {
            info!("Logged out");
        }
        Ok(())
    }

    /// React to a 401. Only the first caller while authenticated performs the
    /// transition; concurrent or repeated calls return `false`.
    pub fn expire(&self) -> bool {
        let changed = self.tx.send_if_modified(|s| {
            if s.state != SessionState::Authenticated {
                return false;
            }
            Self::transition(s, SessionState::Unauthenticated, TransitionReason::Expired);
            true
        });
        if changed {
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear expired credential");
            }
            warn!("Session expired");
        }
        changed
    }
}
