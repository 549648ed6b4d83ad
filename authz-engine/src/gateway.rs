//! Contracts with the external collaborators the decision handlers read from.
//!
//! Every method is a single-shot asynchronous read. Implementations must not
//! retry internally; a transient fault is reported as a [`GatewayError`] and
//! surfaces to the caller as a generic failure.

use crate::claims::{ClaimKind, ClaimSet};
use crate::request::{AuthScheme, RequestContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Faults raised by a collaborator rather than by the decision itself
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0} is unavailable: {1}")]
    Unavailable(&'static str, String),
    #[error("{0} returned malformed data: {1}")]
    Malformed(&'static str, String),
}

/// A client application known to the protocol engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub redirect_uris: BTreeSet<String>,
}

/// Result of authenticating a request under one [`AuthScheme`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub scheme: AuthScheme,
    pub user_id: String,
    /// Claims already bound to the authenticated identity
    #[serde(default)]
    pub claims: ClaimSet,
    /// Scopes already granted to the authenticated identity
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    /// Client a grant was issued to; a bound grant authenticates only for that client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl AuthenticatedSession {
    /// A browser session that only identifies its user
    pub fn interactive(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let mut claims = ClaimSet::new();
        claims.push(ClaimKind::Subject, user_id.clone());
        Self {
            scheme: AuthScheme::InteractiveSession,
            user_id,
            claims,
            scopes: BTreeSet::new(),
            client_id: None,
        }
    }

    /// A grant issued by the protocol engine, carrying the claims and scopes
    /// decided at authorization time
    pub fn grant(user_id: impl Into<String>, claims: ClaimSet, scopes: BTreeSet<String>) -> Self {
        Self {
            scheme: AuthScheme::ProtocolEngine,
            user_id: user_id.into(),
            claims,
            scopes,
            client_id: None,
        }
    }

    /// Binds the session to the client it was issued to
    pub fn issued_to(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Whether the session may be presented by `client_id`
    pub fn is_valid_for(&self, client_id: &str) -> bool {
        self.client_id.as_deref().is_none_or(|bound| bound == client_id)
    }
}

/// A user as held by the external user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Attached claims, including the `AllowedClient` allowlist
    #[serde(default)]
    pub claims: ClaimSet,
}

/// Attached claims grouped by kind
pub type ClaimMap = BTreeMap<ClaimKind, Vec<String>>;

/// Read-only view of the protocol engine's client registry
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Looks up a client by its public identifier
    async fn find_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<RegisteredClient>, GatewayError>;

    /// Redirect URIs registered for the client
    async fn redirect_uris(
        &self,
        client: &RegisteredClient,
    ) -> Result<BTreeSet<String>, GatewayError>;
}

/// Resolves who is calling, under an explicit authentication scheme
#[async_trait]
pub trait SessionPrincipal: Send + Sync {
    /// Returns `None` when the request is not authenticated under `scheme`
    async fn authenticate(
        &self,
        context: &RequestContext,
        scheme: AuthScheme,
    ) -> Result<Option<AuthenticatedSession>, GatewayError>;
}

/// Read-only view of the external user store
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The user the session belongs to, or `None` for an orphaned session
    async fn get_user(
        &self,
        session: &AuthenticatedSession,
    ) -> Result<Option<UserRecord>, GatewayError>;

    async fn get_user_id(&self, user: &UserRecord) -> Result<String, GatewayError> {
        Ok(user.id.clone())
    }

    async fn get_claims(&self, user: &UserRecord) -> Result<ClaimMap, GatewayError>;

    /// Role memberships in enumeration order
    async fn get_roles(&self, user: &UserRecord) -> Result<Vec<String>, GatewayError>;

    async fn get_email(&self, user: &UserRecord) -> Result<Option<String>, GatewayError>;
}

/// Groups a flat claim sequence by kind, preserving value order
pub fn group_claims(claims: &ClaimSet) -> ClaimMap {
    let mut map = ClaimMap::new();
    for claim in claims.iter() {
        map.entry(claim.kind).or_default().push(claim.value.clone());
    }
    map
}
