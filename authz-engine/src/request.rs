//! Incoming protocol requests and the ambient context they travel with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// Grant types accepted at the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "refresh_token" => Ok(Self::RefreshToken),
            other => Err(format!("unsupported grant type '{other}'")),
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two authentication domains a session can be resolved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// Browser session established by the credential provider
    InteractiveSession,
    /// Grant already vetted and issued by the protocol engine
    ProtocolEngine,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InteractiveSession => "interactive-session",
            Self::ProtocolEngine => "protocol-engine",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OAuth2/OIDC request as parsed by the transport layer. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRequest {
    client_id: String,
    redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grant_type: Option<String>,
    #[serde(default)]
    scopes: BTreeSet<String>,
}

impl ProtocolRequest {
    /// Request received at the authorization endpoint
    pub fn authorization(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            grant_type: None,
            scopes: BTreeSet::new(),
        }
    }

    /// Request received at the token endpoint
    pub fn token(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        grant_type: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            grant_type: Some(grant_type.into()),
            scopes: BTreeSet::new(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Parses a space-delimited `scope` parameter
    pub fn with_scope_param(self, scope: &str) -> Self {
        self.with_scopes(scope.split_whitespace())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The raw grant type as received, if any
    pub fn grant_type_param(&self) -> Option<&str> {
        self.grant_type.as_deref()
    }

    /// The grant type, if present and one of the supported values
    pub fn grant_type(&self) -> Option<GrantType> {
        self.grant_type.as_deref().and_then(|g| g.parse().ok())
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }
}

/// Ambient per-request context: credentials presented by the caller and the
/// cancellation signal for the whole decision.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: String,
    session_credential: Option<String>,
    grant_credential: Option<String>,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    /// Attach the interactive session credential (e.g. a session cookie value)
    pub fn with_session(mut self, credential: impl Into<String>) -> Self {
        self.session_credential = Some(credential.into());
        self
    }

    /// Attach the protocol-engine grant credential
    pub fn with_grant(mut self, credential: impl Into<String>) -> Self {
        self.grant_credential = Some(credential.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The credential presented for the given scheme
    pub fn credential(&self, scheme: AuthScheme) -> Option<&str> {
        match scheme {
            AuthScheme::InteractiveSession => self.session_credential.as_deref(),
            AuthScheme::ProtocolEngine => self.grant_credential.as_deref(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
