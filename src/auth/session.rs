//! Session manager.
//!
//! Holds the current bearer token and the identity decoded from it, and
//! keeps the persisted slot in step with every transition. The session
//! is an explicit object handed to whoever needs it (the request layer,
//! the command guard) rather than process-global state.
//!
//! State machine: `anonymous --login(ok)--> authenticated`,
//! `authenticated --logout--> anonymous`. A failed login is a self-loop
//! on `anonymous` with the error returned to the caller.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::auth::token::decode_claims;
use crate::auth::token_store::TokenStore;
use crate::error::Result;
use crate::models::User;

pub struct Session {
    token: Option<String>,
    user: Option<User>,
    store: Box<dyn TokenStore>,
}

/// Shared handle for the request layer and the UI guard.
pub type SharedSession = Arc<RwLock<Session>>;

impl Session {
    /// Restore the session from the persisted slot.
    ///
    /// Fails soft: a token that no longer decodes is cleared from the
    /// slot and the session starts anonymous instead of erroring out.
    pub fn restore(store: Box<dyn TokenStore>) -> Self {
        let mut session = Self {
            token: None,
            user: None,
            store,
        };

        let persisted = match session.store.load() {
            Ok(t) => t,
            Err(e) => {
                warn!("could not read persisted token: {e}");
                None
            }
        };

        if let Some(token) = persisted {
            match decode_claims(&token) {
                Ok(user) => {
                    info!(user = %user.email, "session restored from persisted token");
                    session.token = Some(token);
                    session.user = Some(user);
                }
                Err(e) => {
                    warn!("persisted token did not decode, discarding: {e}");
                    if let Err(e) = session.store.clear() {
                        warn!("could not clear stale token slot: {e}");
                    }
                }
            }
        }

        session
    }

    /// Wrap in the shared handle used across the client.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Adopt a freshly issued token.
    ///
    /// Decodes first and persists second, so a failure at either step
    /// leaves the current session untouched. Token and user change
    /// together; there is no observable half-updated state.
    pub fn login(&mut self, token: &str) -> Result<User> {
        let user = decode_claims(token)?;
        self.store.save(token)?;
        self.token = Some(token.to_string());
        self.user = Some(user.clone());
        info!(user = %user.email, role = %user.role, "logged in");
        Ok(user)
    }

    /// Drop the session unconditionally. Idempotent.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            // The in-memory session still goes away; the slot is
            // re-cleared on the next restore if this write failed.
            warn!("could not clear token slot on logout: {e}");
        }
        if self.token.take().is_some() {
            info!("logged out");
        }
        self.user = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
