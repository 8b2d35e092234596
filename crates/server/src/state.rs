//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::DocumentStore;
use crate::services::identity::IdentityVerifier;
use crate::services::menu::MenuService;
use crate::services::orders::OrderService;
use crate::services::profiles::ProfileService;
use crate::services::sequencer::{OrderSequencer, QueueSequencer};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store, the identity verifier, configuration, and the services
/// built on top of them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
    verifier: Arc<dyn IdentityVerifier>,
    sequencer: Arc<dyn QueueSequencer>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Document store shared by every service
    /// * `verifier` - Bearer token verifier
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let sequencer = Arc::new(OrderSequencer::new(store.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                verifier,
                sequencer,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// Get a reference to the identity verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.inner.verifier.as_ref()
    }

    /// Order placement and history.
    #[must_use]
    pub fn orders(&self) -> OrderService {
        OrderService::new(self.inner.store.clone(), self.inner.sequencer.clone())
    }

    /// Menu listing and seeding.
    #[must_use]
    pub fn menu(&self) -> MenuService {
        MenuService::new(self.inner.store.clone())
    }

    /// User profiles.
    #[must_use]
    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.inner.store.clone())
    }
}
