//! Session store: the current identity and its bearer token.
//!
//! The store is the only owner of session state. Guards and the HTTP adapter
//! receive it by injection and read snapshots; only `login`, `logout` and
//! `update_user` mutate it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{Role, User};
use crate::storage::{Storage, AUTH_KEY, TOKEN_KEY};

/// Snapshot of the authentication state.
///
/// `is_authenticated` is true iff both `user` and `token` are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    is_authenticated: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User, token: impl Into<String>) -> Self {
        Self::from_parts(Some(user), Some(token.into()))
    }

    fn from_parts(user: Option<User>, token: Option<String>) -> Self {
        let is_authenticated = user.is_some() && token.is_some();
        Self {
            user,
            token,
            is_authenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Role of the authenticated user, `None` when logged out
    pub fn role(&self) -> Option<Role> {
        if self.is_authenticated {
            self.user.as_ref().map(|u| u.role)
        } else {
            None
        }
    }
}

pub struct SessionStore {
    state: RwLock<Session>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Create an empty (logged-out) store backed by `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            state: RwLock::new(Session::anonymous()),
            storage,
        }
    }

    /// Restore the persisted auth blob, if any.
    ///
    /// A missing or unreadable blob yields a logged-out store.
    pub fn rehydrate(storage: Arc<dyn Storage>) -> Self {
        let restored = match storage.get(AUTH_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Session>(&blob) {
                // Recompute the flag instead of trusting the blob
                Ok(saved) => Session::from_parts(saved.user, saved.token),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt auth blob");
                    Session::anonymous()
                }
            },
            Ok(None) => Session::anonymous(),
            Err(e) => {
                warn!(error = %e, "Failed to read auth blob");
                Session::anonymous()
            }
        };

        debug!(authenticated = restored.is_authenticated(), "Session rehydrated");
        Self {
            state: RwLock::new(restored),
            storage,
        }
    }

    pub fn login(&self, user: User, token: String) {
        info!(email = %user.email, role = %user.role, "Logged in");
        let session = Session::authenticated(user, token.clone());
        self.write_through(TOKEN_KEY, &token);
        self.persist(&session);
        *self.state.write() = session;
    }

    pub fn logout(&self) {
        *self.state.write() = Session::anonymous();
        for key in [TOKEN_KEY, AUTH_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear storage entry");
            }
        }
        info!("Logged out");
    }

    /// Replace the profile without touching the token or the auth flag
    pub fn update_user(&self, user: User) {
        let session = {
            let mut state = self.state.write();
            state.user = Some(user);
            state.clone()
        };
        self.persist(&session);
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.read().role()
    }

    /// Token as currently persisted, independent of the in-memory state
    pub fn persisted_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    fn persist(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(blob) => self.write_through(AUTH_KEY, &blob),
            Err(e) => warn!(error = %e, "Failed to serialize session"),
        }
    }

    fn write_through(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            warn!(key, error = %e, "Failed to persist storage entry");
        }
    }
}
