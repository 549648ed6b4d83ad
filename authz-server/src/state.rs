use crate::config::AuthzConfig;
use crate::directory::{load_directory, DirectoryError};
use crate::gateways::StoreSessionGateway;
use crate::store::{create_store, GrantStore, SessionStore, StoreError};
use authz_engine::{DecisionEngine, MemoryDirectory};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to create store: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to load directory: {0}")]
    Directory(#[from] DirectoryError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthzConfig>,
    pub engine: DecisionEngine,
    pub sessions: SessionStore,
    pub grants: GrantStore,
}

impl AppState {
    /// Loads the directory and connects the configured stores
    pub async fn new(config: AuthzConfig) -> Result<Self, StateError> {
        let directory = load_directory(config.directory_path.as_deref())?;
        let sessions = SessionStore::new(create_store(&config.store, config.store.session_ttl).await?);
        let grants = GrantStore::new(create_store(&config.store, config.store.grant_ttl).await?);
        Ok(Self::from_parts(config, directory, sessions, grants))
    }

    /// Wires the decision engine over an already built directory and stores
    pub fn from_parts(
        config: AuthzConfig,
        directory: MemoryDirectory,
        sessions: SessionStore,
        grants: GrantStore,
    ) -> Self {
        let directory = Arc::new(directory);
        let gateway = Arc::new(StoreSessionGateway::new(sessions.clone(), grants.clone()));
        Self {
            config: Arc::new(config),
            engine: DecisionEngine::new(directory.clone(), gateway, directory),
            sessions,
            grants,
        }
    }

    /// Checks both stores, reporting the first failure
    pub async fn health_check(&self) -> Result<(), String> {
        self.sessions.health_check().await?;
        self.grants.health_check().await
    }
}
