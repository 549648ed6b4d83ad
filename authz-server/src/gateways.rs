use crate::store::{GrantStore, SessionStore, StoreError};
use async_trait::async_trait;
use authz_engine::{
    AuthScheme, AuthenticatedSession, GatewayError, RequestContext, SessionPrincipal,
};

fn gateway_error(component: &'static str, err: StoreError) -> GatewayError {
    match err {
        StoreError::Deserialization(msg) => GatewayError::Malformed(component, msg),
        other => GatewayError::Unavailable(component, other.to_string()),
    }
}

/// Resolves callers from the shared store: browser sessions for the
/// interactive scheme, issued grants for the protocol-engine scheme
#[derive(Clone)]
pub struct StoreSessionGateway {
    sessions: SessionStore,
    grants: GrantStore,
}

impl StoreSessionGateway {
    pub fn new(sessions: SessionStore, grants: GrantStore) -> Self {
        Self { sessions, grants }
    }
}

#[async_trait]
impl SessionPrincipal for StoreSessionGateway {
    async fn authenticate(
        &self,
        context: &RequestContext,
        scheme: AuthScheme,
    ) -> Result<Option<AuthenticatedSession>, GatewayError> {
        let Some(credential) = context.credential(scheme) else {
            return Ok(None);
        };

        match scheme {
            AuthScheme::InteractiveSession => {
                let user_id = self
                    .sessions
                    .resolve(credential)
                    .await
                    .map_err(|e| gateway_error("session store", e))?;
                Ok(user_id.map(AuthenticatedSession::interactive))
            }
            AuthScheme::ProtocolEngine => {
                let grant = self
                    .grants
                    .redeem(credential)
                    .await
                    .map_err(|e| gateway_error("grant store", e))?;
                Ok(grant.map(|g| {
                    AuthenticatedSession::grant(g.user_id, g.claims, g.scopes)
                        .issued_to(g.client_id)
                }))
            }
        }
    }
}
