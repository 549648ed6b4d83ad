use crate::config::{StoreConfig, StoreKind};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod grants;
pub mod memory;
pub mod redis;
pub mod sessions;

pub use grants::{GrantStore, StoredGrant};
pub use sessions::SessionStore;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Interface every store backend fulfils.
///
/// Each store instance applies a single time-to-live to all its entries;
/// writing an existing key restarts its lifetime.
#[async_trait::async_trait]
#[allow(dead_code)]
pub trait StoreBackend: Send + Sync {
    /// Store a value with the store's TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), StoreError>;

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError>;

    /// Checks that the backend can serve requests; for Redis this pings the server
    async fn health_check(&self) -> Result<(), String>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Store chosen at runtime from the configuration
#[derive(Clone)]
pub enum Store {
    InMemory(memory::InMemoryStore),
    Redis(redis::RedisStore),
}

#[async_trait::async_trait]
impl StoreBackend for Store {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.set(key, value).await,
            Self::Redis(store) => store.set(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self {
            Self::InMemory(store) => store.get(key).await,
            Self::Redis(store) => store.get(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.delete(key).await,
            Self::Redis(store) => store.delete(key).await,
        }
    }
}

/// Creates the configured store backend with the given entry lifetime
pub async fn create_store(config: &StoreConfig, ttl_secs: u64) -> Result<Store, StoreError> {
    match config.backend {
        StoreKind::InMemory => {
            let store = memory::InMemoryStore::new(ttl_secs, config.memory_capacity)
                .map_err(StoreError::Config)?;
            Ok(Store::InMemory(store))
        }
        StoreKind::Redis => {
            if config.redis_url.is_empty() {
                return Err(StoreError::Config(
                    "Redis URL is required for the redis store".to_string(),
                ));
            }
            let store = redis::RedisStore::new(&config.redis_url, ttl_secs)
                .await
                .map_err(StoreError::Config)?;
            Ok(Store::Redis(store))
        }
    }
}

/// A fresh 256-bit random handle, base64url encoded without padding
pub(crate) fn generate_handle() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key for a bearer credential; the credential itself is never stored
pub(crate) fn credential_key(prefix: &str, credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    format!("{prefix}:{}", URL_SAFE_NO_PAD.encode(digest))
}
