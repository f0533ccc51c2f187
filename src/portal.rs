//! Application bootstrap.
//!
//! [`Portal`] is built once at startup and owns the pieces every page needs:
//! the shared HTTP client (with the 401 interceptor installed), the session
//! store restored from storage, and the localization state.

use std::sync::Arc;

use crate::ClientConfig;
use crate::client::http_client::HttpClient;
use crate::client::interceptor::UnauthorizedInterceptor;
use crate::client::navigation::Navigator;
use crate::client::session::{SessionStore, SharedSession};
use crate::client::storage::Storage;
use crate::error::ClientError;
use crate::i18n::I18n;

/// Builder for [`Portal`].
pub struct PortalBuilder {
    config: ClientConfig,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    sync_session_on_unauthorized: bool,
}

impl PortalBuilder {
    /// Starts a builder.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            storage,
            navigator,
            sync_session_on_unauthorized: false,
        }
    }

    /// Whether a 401 also resets the in-memory session (off by default).
    pub fn sync_session_on_unauthorized(mut self, enabled: bool) -> Self {
        self.sync_session_on_unauthorized = enabled;
        self
    }

    /// Builds the portal.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<Portal, ClientError> {
        let session = SharedSession::restore(self.storage.as_ref());

        let mut interceptor =
            UnauthorizedInterceptor::new(Arc::clone(&self.storage), Arc::clone(&self.navigator));
        if self.sync_session_on_unauthorized {
            interceptor = interceptor.with_session(session.clone());
        }

        let client = HttpClient::builder(self.config.clone())
            .interceptor(interceptor)
            .build()?;

        let i18n = I18n::from_storage(Arc::clone(&self.storage), self.config.default_locale);
        let session = SessionStore::with_session(
            client.clone(),
            self.storage,
            self.navigator,
            session,
        );

        tracing::trace!(
            "Portal bootstrapped: authenticated={}, locale={}",
            session.is_authenticated(),
            i18n.locale()
        );

        Ok(Portal {
            config: self.config,
            client,
            session,
            i18n,
        })
    }
}

/// The bootstrapped client application state.
pub struct Portal {
    config: ClientConfig,
    client: HttpClient,
    session: SessionStore,
    i18n: I18n,
}

impl Portal {
    /// Bootstraps with default options.
    pub fn bootstrap(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        PortalBuilder::new(config, storage, navigator).build()
    }

    /// Returns a builder.
    pub fn builder(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> PortalBuilder {
        PortalBuilder::new(config, storage, navigator)
    }

    /// Bootstraps a browser app from `localStorage` and `window.location`.
    #[cfg(target_arch = "wasm32")]
    pub fn bootstrap_browser() -> Result<Self, ClientError> {
        use crate::client::navigation::BrowserNavigator;
        use crate::client::storage::BrowserStorage;

        Self::bootstrap(
            ClientConfig::from_env(),
            Arc::new(BrowserStorage),
            Arc::new(BrowserNavigator),
        )
    }

    /// Configuration the portal was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared HTTP client; every request through it is subject to 401 handling.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Localization state.
    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    /// Mutable localization state, for switching locales.
    pub fn i18n_mut(&mut self) -> &mut I18n {
        &mut self.i18n
    }
}
