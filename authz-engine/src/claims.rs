//! Claims, token destinations and the principal handed to the protocol engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The closed set of claim kinds this engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClaimKind {
    #[serde(rename = "sub")]
    Subject,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "role")]
    Role,
    #[serde(rename = "AllowedClient")]
    AllowedClient,
}

impl ClaimKind {
    /// Wire name of the claim kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "sub",
            Self::Email => "email",
            Self::Role => "role",
            Self::AllowedClient => "AllowedClient",
        }
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token surface a claim may be embedded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "access_token")]
    AccessToken,
    #[serde(rename = "id_token")]
    IdentityToken,
}

pub type Destinations = BTreeSet<Destination>;

/// Routes a claim kind to the token surfaces it belongs in.
///
/// Email only reaches the identity token, roles reach both tokens and every
/// other kind (the subject included) stays in the access token.
pub fn destinations_for(kind: ClaimKind) -> Destinations {
    match kind {
        ClaimKind::Email => BTreeSet::from([Destination::IdentityToken]),
        ClaimKind::Role => BTreeSet::from([Destination::AccessToken, Destination::IdentityToken]),
        ClaimKind::Subject | ClaimKind::AllowedClient => {
            BTreeSet::from([Destination::AccessToken])
        }
    }
}

/// A single `(kind, value)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub kind: ClaimKind,
    pub value: String,
}

impl Claim {
    pub fn new(kind: ClaimKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Ordered sequence of claims assembled for one decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ClaimKind, value: impl Into<String>) {
        self.0.push(Claim::new(kind, value));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of claims of the given kind
    pub fn count(&self, kind: ClaimKind) -> usize {
        self.0.iter().filter(|c| c.kind == kind).count()
    }

    /// All values carried for the given kind, in insertion order
    pub fn values(&self, kind: ClaimKind) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.value.as_str())
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ClaimSet {
    type Item = Claim;
    type IntoIter = std::vec::IntoIter<Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A claim together with the token surfaces it is routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedClaim {
    #[serde(flatten)]
    pub claim: Claim,
    pub destinations: Destinations,
}

impl RoutedClaim {
    fn route(claim: Claim) -> Self {
        let destinations = destinations_for(claim.kind);
        Self {
            claim,
            destinations,
        }
    }
}

/// The claims-bearing principal produced by a successful decision.
///
/// Every claim carries destinations computed from the current routing policy
/// at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    claims: Vec<RoutedClaim>,
    scopes: BTreeSet<String>,
}

impl Principal {
    pub fn new(claims: ClaimSet, scopes: BTreeSet<String>) -> Self {
        Self {
            claims: claims.into_iter().map(RoutedClaim::route).collect(),
            scopes,
        }
    }

    pub fn claims(&self) -> &[RoutedClaim] {
        &self.claims
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// The bare claims, without routing
    pub fn claim_set(&self) -> ClaimSet {
        self.claims.iter().map(|c| c.claim.clone()).collect()
    }

    pub fn subject(&self) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim.kind == ClaimKind::Subject)
            .map(|c| c.claim.value.as_str())
    }

    /// Recomputes every claim's destinations from the current policy,
    /// discarding whatever routing the principal carried before.
    pub fn reroute(self) -> Self {
        Self {
            claims: self
                .claims
                .into_iter()
                .map(|c| RoutedClaim::route(c.claim))
                .collect(),
            scopes: self.scopes,
        }
    }

    /// Claims that will be embedded in the given token surface
    pub fn claims_for(&self, destination: Destination) -> impl Iterator<Item = &Claim> {
        self.claims
            .iter()
            .filter(move |c| c.destinations.contains(&destination))
            .map(|c| &c.claim)
    }
}
