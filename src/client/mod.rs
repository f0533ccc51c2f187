//! Client-side building blocks.
//!
//! This module provides:
//! - The shared HTTP client and its response-interceptor pipeline
//! - The 401 interceptor that clears the persisted session and redirects to login
//! - The session store (restore, login, logout)
//! - Durable storage and navigation abstractions, with browser backends on wasm32
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_client::client::{HttpClient, SessionStore, UnauthorizedInterceptor};
//!
//! let client = HttpClient::builder(config)
//!     .interceptor(UnauthorizedInterceptor::new(storage.clone(), navigator.clone()))
//!     .build()?;
//! let session = SessionStore::new(client, storage, navigator);
//!
//! if session.login("alice", "secret", "acme").await {
//!     tracing::info!("Logged in as {}", session.user().unwrap().username);
//! }
//! ```

pub mod http_client;
pub mod interceptor;
pub mod navigation;
pub mod session;
pub mod storage;

pub use http_client::{ApiResponse, HttpClient, HttpClientBuilder, ResponseInterceptor};
pub use interceptor::UnauthorizedInterceptor;
pub use navigation::{HISTORY_LIMIT, LOGIN_PATH, MemoryNavigator, Navigator, ROOT_PATH};
pub use session::{LOGIN_ENDPOINT, SessionState, SessionStore, SharedSession};
pub use storage::{
    FileStorage, LOCALE_STORAGE_KEY, MemoryStorage, Storage, USER_STORAGE_KEY,
};

#[cfg(target_arch = "wasm32")]
pub use navigation::BrowserNavigator;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserStorage;
