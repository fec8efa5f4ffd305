pub mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use std::sync::RwLock;

use tokio::sync::watch;

use crate::api::models::User;
use crate::api::AuthApi;
use crate::error::Result;
use crate::http::ApiClient;

/// Fixed name the credential is persisted under.
pub const TOKEN_KEY: &str = "token";

/// The current identity and its credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    /// Bumped on every mutation that changes the session.
    pub version: u64,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Owns the single live session and its persisted token.
///
/// Writes issued on behalf of in-flight requests carry the version they
/// observed and are dropped if the session moved on in the meantime.
pub struct SessionStore {
    state: RwLock<Session>,
    tokens: Box<dyn TokenStore>,
    ready: watch::Sender<bool>,
}

impl SessionStore {
    pub fn new(tokens: impl TokenStore + 'static) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            state: RwLock::new(Session::default()),
            tokens: Box::new(tokens),
            ready,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Token and version read under one lock.
    pub fn credentials(&self) -> (Option<String>, u64) {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        (state.token.clone(), state.version)
    }

    pub fn token(&self) -> Option<String> {
        self.credentials().0
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    pub fn version(&self) -> u64 {
        self.credentials().1
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once `load` has finished, whatever its outcome.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Restore the session from the persisted token.
    ///
    /// A token that fails the profile check is discarded; the store ends up
    /// logged out. Ready is signalled in every case.
    pub async fn load(&self, client: &ApiClient) {
        let persisted = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("could not read persisted token: {e}");
                None
            }
        };

        if let Some(token) = persisted {
            let observed = {
                let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                state.user = None;
                state.token = Some(token);
                state.version += 1;
                state.version
            };

            match AuthApi::new(client).profile().await {
                Ok(user) => {
                    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                    if state.version == observed {
                        tracing::debug!(user = %user.email, "session restored");
                        state.user = Some(user);
                    } else {
                        tracing::debug!("session changed while restoring; keeping newer state");
                    }
                }
                Err(e) => {
                    tracing::warn!("stored token rejected, starting logged out: {e}");
                    if let Err(e) = self.invalidate_if_current(observed) {
                        tracing::warn!("could not clear stale token: {e}");
                    }
                }
            }
        }

        self.ready.send_replace(true);
    }

    /// Install a freshly authenticated identity unconditionally.
    pub fn login(&self, user: User, token: String) -> Result<()> {
        self.tokens.store(&token)?;
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.user = Some(user);
        state.token = Some(token);
        state.version += 1;
        Ok(())
    }

    /// Install an identity only if nothing changed since `observed`.
    ///
    /// Returns `false` when the write was stale and discarded.
    pub fn login_if_current(&self, observed: u64, user: User, token: String) -> Result<bool> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.version != observed {
            tracing::debug!(
                observed,
                current = state.version,
                "discarding stale login"
            );
            return Ok(false);
        }
        // Stored under the lock: the version check and the write must be one
        // step, or a logout could land between them and be overwritten.
        self.tokens.store(&token)?;
        state.user = Some(user);
        state.token = Some(token);
        state.version += 1;
        Ok(true)
    }

    /// Clear the persisted token and the in-memory identity. Idempotent.
    ///
    /// The in-memory identity is dropped even if the token file cannot be
    /// removed.
    pub fn logout(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        Self::clear_state(&mut state);
        self.tokens.clear()
    }

    /// Tear the session down unless it changed since `observed`.
    ///
    /// Returns `true` if the session observed by the caller was cleared.
    pub fn invalidate_if_current(&self, observed: u64) -> Result<bool> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.version != observed {
            tracing::debug!(
                observed,
                current = state.version,
                "ignoring stale invalidation"
            );
            return Ok(false);
        }
        Self::clear_state(&mut state);
        self.tokens.clear()?;
        Ok(true)
    }

    fn clear_state(state: &mut Session) {
        if state.user.is_some() || state.token.is_some() {
            state.user = None;
            state.token = None;
            state.version += 1;
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("SessionStore")
            .field("user", &state.user.as_ref().map(|u| &u.email))
            .field("token", &state.token.as_ref().map(|_| "<redacted>"))
            .field("version", &state.version)
            .field("ready", &self.is_ready())
            .finish()
    }
}
