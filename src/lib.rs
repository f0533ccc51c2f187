//! # portal-client
//!
//! Client bootstrap for the school portal: a configured HTTP client, the
//! session store, and localization setup.
//!
//! ## Overview
//!
//! - **HTTP client** - base URL, 10 second timeout, JSON default header, and a
//!   global interceptor that reacts to 401 responses
//! - **Session store** - restores the logged-in user from durable storage and
//!   exposes `login` / `logout`
//! - **Localization** - locale preference from storage, `en` and `sk`
//!   catalogs with `en` fallback
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use portal_client::{ClientConfig, Portal};
//! use portal_client::client::{FileStorage, MemoryNavigator};
//!
//! # async fn run() -> Result<(), portal_client::ClientError> {
//! let portal = Portal::bootstrap(
//!     ClientConfig::from_env(),
//!     Arc::new(FileStorage::open("portal-storage.json")),
//!     Arc::new(MemoryNavigator::new()),
//! )?;
//!
//! if portal.session().login("alice", "secret", "acme").await {
//!     let lunches = portal.client().get("/api/lunches").await?;
//!     println!("{}", lunches.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Compatibility
//!
//! | Piece | WASM (browser) | Native |
//! |-------|----------------|--------|
//! | Storage | `BrowserStorage` (localStorage) | `FileStorage`, `MemoryStorage` |
//! | Navigation | `BrowserNavigator` (window.location) | `MemoryNavigator` |
//! | Relative URLs without a base | resolved against page origin | rejected |
//! | Request timeout | not enforced | enforced |

pub mod client;
pub mod config;
pub mod error;
pub mod i18n;
pub mod portal;
pub mod user;

pub use config::ClientConfig;
pub use error::{ClientError, StorageError};
pub use i18n::{I18n, Locale};
pub use portal::{Portal, PortalBuilder};
pub use user::User;
