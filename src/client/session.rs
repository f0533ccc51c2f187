//! Session store: who is logged in, and the login/logout transitions.
//!
//! The session is a two-state machine:
//!
//! - **Anonymous**: no user
//! - **Authenticated(user)**: the user returned by the login endpoint
//!
//! ## Lifecycle
//!
//! - On construction: restored from the persisted `"user"` record
//! - On login success: in-memory state, then persisted record, then navigation to `/`
//! - On logout: in-memory state cleared, persisted record removed, navigation to `/login`
//!
//! Every `login` and `logout` bumps a generation counter. A login response is
//! only applied if no newer login or logout started while it was in flight.
//!
//! Commits and resets are serialized together with their storage and
//! navigation side effects, so a logout racing a login from another thread
//! either runs entirely before the commit (and the response is discarded) or
//! entirely after it. Readers never wait on a transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::User;
use crate::client::http_client::HttpClient;
use crate::client::navigation::{LOGIN_PATH, Navigator, ROOT_PATH};
use crate::client::storage::{self, Storage, USER_STORAGE_KEY};
use crate::error::ClientError;

/// Authentication endpoint.
pub const LOGIN_ENDPOINT: &str = "/api/auth/login";

/// Current authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No user is logged in
    #[default]
    Anonymous,
    /// A user is logged in
    Authenticated(User),
}

impl SessionState {
    /// Returns true if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns the logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }
}

/// Shared handle to the in-memory session.
///
/// Cheap to clone; clones observe the same state. Handed to the 401
/// interceptor when it should reset the in-memory session as well.
#[derive(Clone, Debug, Default)]
pub struct SharedSession {
    state: Arc<RwLock<SessionState>>,
    generation: Arc<AtomicU64>,
    transition: Arc<Mutex<()>>,
}

impl SharedSession {
    /// Creates a handle holding `state`.
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            generation: Arc::new(AtomicU64::new(0)),
            transition: Arc::new(Mutex::new(())),
        }
    }

    /// Restores the session from the persisted user record.
    ///
    /// A well-formed record yields `Authenticated`; a missing record yields
    /// `Anonymous`. A malformed record yields `Anonymous` and is removed so
    /// storage and memory agree.
    pub fn restore(storage: &dyn Storage) -> Self {
        let state = match storage::load_user(storage) {
            Some(user) => {
                tracing::trace!("Session restored for {}", user.username);
                SessionState::Authenticated(user)
            }
            None => {
                if storage.get(USER_STORAGE_KEY).is_some() {
                    storage::clear_user(storage);
                }
                tracing::trace!("No persisted session, starting anonymous");
                SessionState::Anonymous
            }
        };
        Self::new(state)
    }

    /// Returns a snapshot of the current state.
    pub fn get(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Returns the logged-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.state.read().user().cloned()
    }

    /// Returns true if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Returns the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Clears the in-memory session and invalidates in-flight logins.
    pub fn reset(&self) {
        self.reset_with(|| {});
    }

    /// Resets the session, then runs `on_reset` before any other login
    /// commit or reset can proceed.
    pub fn reset_with(&self, on_reset: impl FnOnce()) {
        let _transition = self.transition.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.write() = SessionState::Anonymous;
        on_reset();
    }

    /// Starts a new login attempt, returning its generation.
    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies `state` and runs `on_commit`, only if `generation` is still
    /// the latest. A concurrent reset waits until `on_commit` returns.
    fn commit_if_current(
        &self,
        generation: u64,
        state: SessionState,
        on_commit: impl FnOnce(),
    ) -> bool {
        let _transition = self.transition.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *self.state.write() = state;
        on_commit();
        true
    }
}

/// Login request body.
#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    subdomain: &'a str,
}

/// Session store coordinating the HTTP client, durable storage and navigation.
pub struct SessionStore {
    client: HttpClient,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    session: SharedSession,
}

impl SessionStore {
    /// Creates a store, restoring the session from `storage`.
    pub fn new(
        client: HttpClient,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = SharedSession::restore(storage.as_ref());
        Self::with_session(client, storage, navigator, session)
    }

    /// Creates a store around an existing session handle.
    pub fn with_session(
        client: HttpClient,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        session: SharedSession,
    ) -> Self {
        Self {
            client,
            storage,
            navigator,
            session,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.session.get()
    }

    /// Returns the logged-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    /// Returns true if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Returns the shared session handle.
    pub fn shared(&self) -> SharedSession {
        self.session.clone()
    }

    /// Returns the HTTP client used for authentication.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Logs in against the tenant identified by `subdomain`.
    ///
    /// Returns `true` on success. Any failure (rejected credentials, network
    /// error, timeout, unexpected body) is logged and reported as `false`,
    /// leaving the session untouched.
    pub async fn login(&self, username: &str, password: &str, subdomain: &str) -> bool {
        let generation = self.session.begin();
        tracing::trace!("Logging in {} on tenant {}", username, subdomain);

        let request = LoginRequest {
            username,
            password,
            subdomain,
        };

        let user = match self.authenticate(&request).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Login failed for {}: {}", username, e);
                return false;
            }
        };

        let committed = self.session.commit_if_current(
            generation,
            SessionState::Authenticated(user.clone()),
            || {
                if let Err(e) = storage::store_user(self.storage.as_ref(), &user) {
                    tracing::warn!("Logged in but failed to persist session: {}", e);
                }
                tracing::trace!("Logged in as {} (id {})", user.username, user.id);
                self.navigator.navigate(ROOT_PATH);
            },
        );

        if !committed {
            tracing::warn!(
                "Discarding login response for {}: superseded by a newer login or logout",
                username
            );
        }
        committed
    }

    /// Logs out locally. No request is sent.
    pub fn logout(&self) {
        tracing::trace!("Logging out");
        self.session.reset_with(|| {
            storage::clear_user(self.storage.as_ref());
            self.navigator.navigate(LOGIN_PATH);
        });
    }

    async fn authenticate(&self, request: &LoginRequest<'_>) -> Result<User, ClientError> {
        self.client.post(LOGIN_ENDPOINT, request).await?.json()
    }
}
