//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::LookupConfig;
use crate::db::SalesStore;
use crate::services::LookupClient;
use crate::services::auth::AuthService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// sales store and the lookup client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn SalesStore>,
    lookup: LookupClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup HTTP client cannot be built.
    pub fn new(store: Arc<dyn SalesStore>, lookup: &LookupConfig) -> Result<Self, reqwest::Error> {
        let lookup = LookupClient::new(lookup)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { store, lookup }),
        })
    }

    /// Get a reference to the sales store.
    #[must_use]
    pub fn store(&self) -> &dyn SalesStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the CNPJ/CEP lookup client.
    #[must_use]
    pub fn lookup(&self) -> &LookupClient {
        &self.inner.lookup
    }

    /// Authentication service over the store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store())
    }
}
