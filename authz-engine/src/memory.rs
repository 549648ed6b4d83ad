//! In-memory gateway implementations.
//!
//! Both types are immutable snapshots built up front, so concurrent decisions
//! read them without any locking.

use crate::gateway::{
    group_claims, AuthenticatedSession, ClaimMap, ClientRegistry, GatewayError,
    RegisteredClient, SessionPrincipal, UserDirectory, UserRecord,
};
use crate::request::{AuthScheme, RequestContext};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

/// Clients and users held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    clients: HashMap<String, RegisteredClient>,
    users: HashMap<String, UserRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: RegisteredClient) -> Self {
        self.clients.insert(client.client_id.clone(), client);
        self
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl ClientRegistry for MemoryDirectory {
    async fn find_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<RegisteredClient>, GatewayError> {
        Ok(self.clients.get(client_id).cloned())
    }

    async fn redirect_uris(
        &self,
        client: &RegisteredClient,
    ) -> Result<BTreeSet<String>, GatewayError> {
        Ok(client.redirect_uris.clone())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn get_user(
        &self,
        session: &AuthenticatedSession,
    ) -> Result<Option<UserRecord>, GatewayError> {
        Ok(self.users.get(&session.user_id).cloned())
    }

    async fn get_claims(&self, user: &UserRecord) -> Result<ClaimMap, GatewayError> {
        Ok(group_claims(&user.claims))
    }

    async fn get_roles(&self, user: &UserRecord) -> Result<Vec<String>, GatewayError> {
        Ok(user.roles.clone())
    }

    async fn get_email(&self, user: &UserRecord) -> Result<Option<String>, GatewayError> {
        Ok(user.email.clone())
    }
}

/// Sessions and grants keyed by the credential that presents them
#[derive(Debug, Clone, Default)]
pub struct MemorySessions {
    interactive: HashMap<String, String>,
    grants: HashMap<String, AuthenticatedSession>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a browser session credential for a user
    pub fn with_session(mut self, credential: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.interactive.insert(credential.into(), user_id.into());
        self
    }

    /// Registers a protocol-engine grant credential
    pub fn with_grant(mut self, credential: impl Into<String>, session: AuthenticatedSession) -> Self {
        self.grants.insert(credential.into(), session);
        self
    }
}

#[async_trait]
impl SessionPrincipal for MemorySessions {
    async fn authenticate(
        &self,
        context: &RequestContext,
        scheme: AuthScheme,
    ) -> Result<Option<AuthenticatedSession>, GatewayError> {
        let Some(credential) = context.credential(scheme) else {
            return Ok(None);
        };
        let session = match scheme {
            AuthScheme::InteractiveSession => self
                .interactive
                .get(credential)
                .map(AuthenticatedSession::interactive),
            AuthScheme::ProtocolEngine => self.grants.get(credential).cloned(),
        };
        Ok(session)
    }
}
