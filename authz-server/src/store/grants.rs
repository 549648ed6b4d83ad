use super::{credential_key, generate_handle, Store, StoreBackend, StoreError};
use authz_engine::{ClaimSet, Principal};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const GRANT_PREFIX: &str = "authz_grant";

/// A principal handed to the protocol engine after a successful authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGrant {
    pub user_id: String,
    pub client_id: String,
    pub claims: ClaimSet,
    pub scopes: BTreeSet<String>,
    /// Unix timestamp of the authorization decision
    pub issued_at: i64,
}

/// Grants keyed by a digest of their bearer handle
#[derive(Clone)]
pub struct GrantStore {
    store: Store,
}

impl GrantStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Records the principal and returns the handle that redeems it
    pub async fn issue(&self, client_id: &str, principal: &Principal) -> Result<String, StoreError> {
        let handle = generate_handle();
        let grant = StoredGrant {
            user_id: principal.subject().unwrap_or_default().to_string(),
            client_id: client_id.to_string(),
            claims: principal.claim_set(),
            scopes: principal.scopes().clone(),
            issued_at: chrono::Utc::now().timestamp(),
        };
        self.store
            .set(&credential_key(GRANT_PREFIX, &handle), &grant)
            .await?;
        debug!(
            "Issued grant for user '{}' via client '{}' with {} scopes",
            grant.user_id,
            client_id,
            grant.scopes.len()
        );
        Ok(handle)
    }

    /// The grant behind a handle; grants stay valid until they expire
    pub async fn redeem(&self, handle: &str) -> Result<Option<StoredGrant>, StoreError> {
        self.store.get(&credential_key(GRANT_PREFIX, handle)).await
    }

    pub async fn health_check(&self) -> Result<(), String> {
        self.store.health_check().await
    }
}
