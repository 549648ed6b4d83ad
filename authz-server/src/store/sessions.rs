use super::{credential_key, generate_handle, Store, StoreBackend, StoreError};
use log::debug;
use serde::{Deserialize, Serialize};

const SESSION_PREFIX: &str = "authz_session";

/// An interactive session as recorded by the credential provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user_id: String,
    /// Unix timestamp of the sign-in
    pub opened_at: i64,
}

/// Browser sessions keyed by a digest of their cookie value.
///
/// Lifetimes slide: every successful lookup restarts the session's TTL.
#[derive(Clone)]
pub struct SessionStore {
    store: Store,
}

impl SessionStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Records a signed-in user and returns the cookie value identifying the session.
    ///
    /// Sessions are normally opened by the credential provider sharing this store.
    #[allow(dead_code)]
    pub async fn open_session(&self, user_id: &str) -> Result<String, StoreError> {
        let cookie = generate_handle();
        let session = StoredSession {
            user_id: user_id.to_string(),
            opened_at: chrono::Utc::now().timestamp(),
        };
        self.store
            .set(&credential_key(SESSION_PREFIX, &cookie), &session)
            .await?;
        debug!("Opened session for user '{}'", user_id);
        Ok(cookie)
    }

    /// The user behind a session cookie, if the session is still alive
    pub async fn resolve(&self, cookie: &str) -> Result<Option<String>, StoreError> {
        let key = credential_key(SESSION_PREFIX, cookie);
        let Some(session) = self.store.get::<StoredSession>(&key).await? else {
            return Ok(None);
        };
        self.store.set(&key, &session).await?;
        Ok(Some(session.user_id))
    }

    pub async fn health_check(&self) -> Result<(), String> {
        self.store.health_check().await
    }
}
