//! Fixtures shared by the handler and engine unit tests.

use crate::claims::{ClaimKind, ClaimSet};
use crate::gateway::{
    AuthenticatedSession, ClaimMap, ClientRegistry, GatewayError, RegisteredClient,
    SessionPrincipal, UserDirectory, UserRecord,
};
use crate::memory::{MemoryDirectory, MemorySessions};
use crate::request::{AuthScheme, RequestContext};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DASHBOARD: &str = "dashboard-client";
pub const TENANT: &str = "tenant-client";
pub const CALLBACK: &str = "https://oauth.pstmn.io/v1/callback";
pub const ADMIN_ID: &str = "7d5c2a5e-0000-4000-8000-000000000001";
pub const TENANT_USER_ID: &str = "7d5c2a5e-0000-4000-8000-000000000002";

fn client(client_id: &str) -> RegisteredClient {
    RegisteredClient {
        client_id: client_id.to_string(),
        display_name: None,
        redirect_uris: BTreeSet::from([CALLBACK.to_string()]),
    }
}

fn user(id: &str, email: &str, role: &str, allowed_client: &str) -> UserRecord {
    let mut claims = ClaimSet::new();
    claims.push(ClaimKind::AllowedClient, allowed_client);
    UserRecord {
        id: id.to_string(),
        email: Some(email.to_string()),
        roles: vec![role.to_string()],
        claims,
    }
}

/// Both clients, an admin allowed on the dashboard and a tenant allowed on the tenant app
pub fn seeded_directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .with_client(client(DASHBOARD))
        .with_client(client(TENANT))
        .with_user(user(ADMIN_ID, "admin@propmate.com", "Admin", DASHBOARD))
        .with_user(user(TENANT_USER_ID, "tenant@gmail.com", "Tenant", TENANT))
}

/// `admin-cookie`, `tenant-cookie`, and `orphan-cookie` whose user no longer exists
pub fn seeded_sessions() -> MemorySessions {
    MemorySessions::new()
        .with_session("admin-cookie", ADMIN_ID)
        .with_session("tenant-cookie", TENANT_USER_ID)
        .with_session("orphan-cookie", "deleted-user")
}

/// Every collaborator call fails
pub struct UnavailableGateway;

#[async_trait]
impl ClientRegistry for UnavailableGateway {
    async fn find_by_client_id(
        &self,
        _client_id: &str,
    ) -> Result<Option<RegisteredClient>, GatewayError> {
        Err(GatewayError::Unavailable("client registry", "connection refused".into()))
    }

    async fn redirect_uris(
        &self,
        _client: &RegisteredClient,
    ) -> Result<BTreeSet<String>, GatewayError> {
        Err(GatewayError::Unavailable("client registry", "connection refused".into()))
    }
}

/// Session lookups never complete
pub struct PendingGateway;

#[async_trait]
impl SessionPrincipal for PendingGateway {
    async fn authenticate(
        &self,
        _context: &RequestContext,
        _scheme: AuthScheme,
    ) -> Result<Option<AuthenticatedSession>, GatewayError> {
        std::future::pending().await
    }
}

/// Counts the reads that only happen while assembling claims
pub struct CountingDirectory {
    inner: MemoryDirectory,
    pub role_reads: AtomicUsize,
    pub email_reads: AtomicUsize,
}

impl CountingDirectory {
    pub fn new(inner: MemoryDirectory) -> Self {
        Self {
            inner,
            role_reads: AtomicUsize::new(0),
            email_reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UserDirectory for CountingDirectory {
    async fn get_user(
        &self,
        session: &AuthenticatedSession,
    ) -> Result<Option<UserRecord>, GatewayError> {
        self.inner.get_user(session).await
    }

    async fn get_claims(&self, user: &UserRecord) -> Result<ClaimMap, GatewayError> {
        self.inner.get_claims(user).await
    }

    async fn get_roles(&self, user: &UserRecord) -> Result<Vec<String>, GatewayError> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_roles(user).await
    }

    async fn get_email(&self, user: &UserRecord) -> Result<Option<String>, GatewayError> {
        self.email_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_email(user).await
    }
}
