use crate::command::{AuthorizationCommand, Command, TokenCommand};
use crate::error::{Decision, DecisionError, FailureKind};
use crate::gateway::{ClientRegistry, SessionPrincipal, UserDirectory};
use crate::handlers::{AuthorizationHandler, Handler, TokenHandler};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Entry point for every decision.
///
/// Each command passes through logging, then validation, then its handler.
/// When validation reports any violation the handler is never invoked.
#[derive(Clone)]
pub struct DecisionEngine {
    authorization: Arc<dyn Handler<AuthorizationCommand>>,
    token: Arc<dyn Handler<TokenCommand>>,
}

impl DecisionEngine {
    /// Builds the engine with the standard handlers over the given gateways
    pub fn new(
        clients: Arc<dyn ClientRegistry>,
        sessions: Arc<dyn SessionPrincipal>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            authorization: Arc::new(AuthorizationHandler::new(
                clients.clone(),
                sessions.clone(),
                users,
            )),
            token: Arc::new(TokenHandler::new(clients, sessions)),
        }
    }

    pub fn with_handlers(
        authorization: Arc<dyn Handler<AuthorizationCommand>>,
        token: Arc<dyn Handler<TokenCommand>>,
    ) -> Self {
        Self {
            authorization,
            token,
        }
    }

    pub async fn authorize(&self, command: &AuthorizationCommand) -> Decision {
        dispatch(self.authorization.as_ref(), command).await
    }

    pub async fn token(&self, command: &TokenCommand) -> Decision {
        dispatch(self.token.as_ref(), command).await
    }
}

async fn dispatch<C: Command>(handler: &dyn Handler<C>, command: &C) -> Decision {
    let request_id = command.context().request_id();
    let client_id = command.request().client_id();
    debug!(
        "Handling {} request {} for client '{}'",
        C::NAME,
        request_id,
        client_id
    );

    let violations = command.validate();
    let outcome = if violations.is_empty() {
        handler.handle(command).await
    } else {
        Err(DecisionError::Validation(violations))
    };

    match &outcome {
        Ok(principal) => {
            info!(
                "{} request {} granted for client '{}'",
                C::NAME,
                request_id,
                client_id
            );
            debug!(
                "{} request {} issued for subject {:?}",
                C::NAME,
                request_id,
                principal.subject()
            );
        }
        Err(err) if err.is_challenge() => {
            info!(
                "{} request {} for client '{}' requires a login challenge",
                C::NAME,
                request_id,
                client_id
            );
        }
        Err(err) if err.kind() == FailureKind::Unavailable => {
            error!("{} request {} failed: {}", C::NAME, request_id, err);
        }
        Err(err) => {
            warn!(
                "{} request {} for client '{}' rejected ({}): {}",
                C::NAME,
                request_id,
                client_id,
                err.code(),
                err
            );
        }
    }
    outcome
}
