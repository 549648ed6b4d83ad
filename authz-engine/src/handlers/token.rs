use super::{guarded, Handler};
use crate::claims::Principal;
use crate::command::TokenCommand;
use crate::error::{Decision, DecisionError};
use crate::gateway::{ClientRegistry, SessionPrincipal};
use crate::request::AuthScheme;
use async_trait::async_trait;
use std::sync::Arc;

pub const GRANT_NOT_AUTHENTICATED: &str = "User is not authenticated.";

/// Re-issues the principal behind a grant the protocol engine already vetted.
///
/// The allowlist is not consulted again: a grant bound to a client only
/// authenticates for that client, so it carries the original allowlist
/// decision. Only the claim destinations are recomputed so the current
/// routing policy applies.
#[derive(Clone)]
pub struct TokenHandler {
    clients: Arc<dyn ClientRegistry>,
    sessions: Arc<dyn SessionPrincipal>,
}

impl TokenHandler {
    pub fn new(clients: Arc<dyn ClientRegistry>, sessions: Arc<dyn SessionPrincipal>) -> Self {
        Self { clients, sessions }
    }
}

#[async_trait]
impl Handler<TokenCommand> for TokenHandler {
    async fn handle(&self, command: &TokenCommand) -> Decision {
        let context = &command.context;
        let client_id = command.request.client_id();

        let session = guarded(
            context,
            "authenticating the grant",
            self.sessions.authenticate(context, AuthScheme::ProtocolEngine),
        )
        .await?
        .filter(|session| session.is_valid_for(client_id))
        .ok_or_else(|| DecisionError::AccessDenied(GRANT_NOT_AUTHENTICATED.to_string()))?;

        guarded(
            context,
            "resolving the client",
            self.clients.find_by_client_id(client_id),
        )
        .await?
        .ok_or_else(|| DecisionError::InvalidClient {
            client_id: client_id.to_string(),
        })?;

        Ok(Principal::new(session.claims, session.scopes))
    }
}
