//! Global handling of 401 responses.
//!
//! Any request made through the shared client that comes back 401 means the
//! server no longer recognizes the session. The interceptor then:
//! 1. Removes the persisted user record
//! 2. Navigates to `/login`, unless already there
//!
//! The original error still reaches the caller.
//!
//! By default the in-memory session is left alone, so a `SessionStore` may
//! keep reporting the old user until the next restart. Attach the session
//! handle with [`UnauthorizedInterceptor::with_session`] to reset it as well.

use std::sync::Arc;

use crate::client::http_client::ResponseInterceptor;
use crate::client::navigation::{LOGIN_PATH, Navigator};
use crate::client::session::SharedSession;
use crate::client::storage::{self, Storage};
use crate::error::ClientError;

/// Clears the persisted session and redirects to login on 401.
pub struct UnauthorizedInterceptor {
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    session: Option<SharedSession>,
}

impl UnauthorizedInterceptor {
    /// Creates an interceptor acting on `storage` and `navigator`.
    pub fn new(storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            storage,
            navigator,
            session: None,
        }
    }

    /// Also resets `session` on 401.
    pub fn with_session(mut self, session: SharedSession) -> Self {
        self.session = Some(session);
        self
    }
}

impl ResponseInterceptor for UnauthorizedInterceptor {
    fn intercept(&self, error: &ClientError) {
        if !error.is_unauthorized() {
            return;
        }

        tracing::warn!("Request rejected as unauthorized, clearing session: {}", error);
        let clear = || {
            storage::clear_user(self.storage.as_ref());
            if self.navigator.current_path() == LOGIN_PATH {
                tracing::trace!("Already on login page, not redirecting");
            } else {
                self.navigator.navigate(LOGIN_PATH);
            }
        };

        match &self.session {
            Some(session) => session.reset_with(clear),
            None => clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::User;
    use crate::client::navigation::MemoryNavigator;
    use crate::client::session::SessionState;
    use crate::client::storage::{MemoryStorage, USER_STORAGE_KEY};
    use reqwest::StatusCode;

    fn authenticated_storage() -> MemoryStorage {
        MemoryStorage::with_entries([(USER_STORAGE_KEY, r#"{"id":1,"username":"alice"}"#)])
    }

    fn unauthorized() -> ClientError {
        ClientError::from_status(StatusCode::UNAUTHORIZED, "Session expired")
    }

    #[test]
    fn test_unauthorized_clears_record_and_redirects() {
        let storage = authenticated_storage();
        let navigator = MemoryNavigator::starting_at("/lunches");
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage.clone()), Arc::new(navigator.clone()));

        interceptor.intercept(&unauthorized());

        assert!(!storage.contains(USER_STORAGE_KEY));
        assert_eq!(navigator.current_path(), LOGIN_PATH);
        assert_eq!(navigator.navigation_count(), 1);
    }

    #[test]
    fn test_unauthorized_on_login_page_does_not_redirect() {
        let storage = authenticated_storage();
        let navigator = MemoryNavigator::starting_at(LOGIN_PATH);
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage.clone()), Arc::new(navigator.clone()));

        interceptor.intercept(&unauthorized());

        assert!(!storage.contains(USER_STORAGE_KEY));
        assert_eq!(navigator.navigation_count(), 0);
    }

    #[test]
    fn test_other_errors_are_ignored() {
        let storage = authenticated_storage();
        let navigator = MemoryNavigator::starting_at("/lunches");
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage.clone()), Arc::new(navigator.clone()));

        interceptor.intercept(&ClientError::from_status(StatusCode::FORBIDDEN, "nope"));
        interceptor.intercept(&ClientError::Timeout(std::time::Duration::from_secs(10)));

        assert!(storage.contains(USER_STORAGE_KEY));
        assert_eq!(navigator.navigation_count(), 0);
    }

    #[test]
    fn test_in_memory_session_untouched_by_default() {
        let storage = authenticated_storage();
        let session = SharedSession::restore(&storage);
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage.clone()), Arc::new(MemoryNavigator::new()));

        interceptor.intercept(&unauthorized());

        assert!(!storage.contains(USER_STORAGE_KEY));
        assert_eq!(session.user(), Some(User::new(1, "alice")));
    }

    #[test]
    fn test_with_session_resets_in_memory_session() {
        let storage = authenticated_storage();
        let session = SharedSession::restore(&storage);
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage.clone()), Arc::new(MemoryNavigator::new()))
                .with_session(session.clone());

        interceptor.intercept(&unauthorized());

        assert_eq!(session.get(), SessionState::Anonymous);
        assert!(!storage.contains(USER_STORAGE_KEY));
    }

    #[test]
    fn test_with_session_invalidates_pending_login() {
        let storage = authenticated_storage();
        let session = SharedSession::restore(&storage);
        let before = session.generation();
        let interceptor =
            UnauthorizedInterceptor::new(Arc::new(storage), Arc::new(MemoryNavigator::new()))
                .with_session(session.clone());

        interceptor.intercept(&unauthorized());

        assert!(session.generation() > before);
    }
}
