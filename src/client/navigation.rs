//! Navigation targets and the navigator abstraction.
//!
//! The session store and the 401 interceptor only ever need two things from
//! the routing layer: the current path, and a way to go somewhere else.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

/// Application root, the landing page after login.
pub const ROOT_PATH: &str = "/";

/// Login page.
pub const LOGIN_PATH: &str = "/login";

/// Number of most recent paths a [`MemoryNavigator`] remembers.
pub const HISTORY_LIMIT: usize = 64;

/// Reads and changes the current location.
pub trait Navigator: Send + Sync {
    /// Returns the current path (e.g. `/login`).
    fn current_path(&self) -> String;

    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn navigate(&self, path: &str) {
        (**self).navigate(path)
    }
}

/// Navigator that records visited paths in memory.
///
/// Used by native clients and tests; clones share the same history. Only the
/// last [`HISTORY_LIMIT`] paths are kept.
#[derive(Clone, Debug)]
pub struct MemoryNavigator {
    inner: Arc<RwLock<History>>,
}

#[derive(Debug)]
struct History {
    paths: VecDeque<String>,
    navigations: usize,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::starting_at(ROOT_PATH)
    }
}

impl MemoryNavigator {
    /// Creates a navigator positioned at `/`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a navigator positioned at `path`.
    pub fn starting_at(path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(History {
                paths: VecDeque::from([path.into()]),
                navigations: 0,
            })),
        }
    }

    /// Returns the remembered paths, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.inner.read().paths.iter().cloned().collect()
    }

    /// Returns how many navigations happened since construction.
    pub fn navigation_count(&self) -> usize {
        self.inner.read().navigations
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.inner
            .read()
            .paths
            .back()
            .cloned()
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }

    fn navigate(&self, path: &str) {
        tracing::trace!("Navigating to {}", path);
        let mut history = self.inner.write();
        if history.paths.len() == HISTORY_LIMIT {
            history.paths.pop_front();
        }
        history.paths.push_back(path.to_string());
        history.navigations += 1;
    }
}

/// Navigator backed by `window.location`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }

    fn navigate(&self, path: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(path).is_err() {
                tracing::error!("Failed to navigate to {}", path);
            }
        } else {
            tracing::error!("Failed to get window for navigation to {}", path);
        }
    }
}
