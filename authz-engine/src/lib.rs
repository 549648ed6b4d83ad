//! # authz-engine
//!
//! Authorization decisions for an OAuth2/OIDC identity provider.
//!
//! Given a protocol request and the caller's session, the engine decides
//! whether a client may obtain tokens on the user's behalf and, if so, which
//! claims go into which token.
//!
//! ## Components
//!
//! - **Claims:** claim kinds, the destination router and the resulting [`Principal`].
//! - **Gateways:** traits for the client registry, session resolution and user store.
//! - **Handlers:** the authorization-endpoint and token-endpoint decisions.
//! - **Engine:** [`DecisionEngine`], which logs, validates and dispatches commands.

pub mod claims;
pub mod command;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod memory;
pub mod request;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

pub use claims::{destinations_for, Claim, ClaimKind, ClaimSet, Destination, Principal};
pub use command::{AuthorizationCommand, Command, TokenCommand};
pub use engine::DecisionEngine;
pub use error::{Decision, DecisionError, FailureKind};
pub use gateway::{
    AuthenticatedSession, ClientRegistry, GatewayError, RegisteredClient, SessionPrincipal,
    UserDirectory, UserRecord,
};
pub use memory::{MemoryDirectory, MemorySessions};
pub use request::{AuthScheme, GrantType, ProtocolRequest, RequestContext};
