pub mod authorization;
pub mod token;

use crate::command::Command;
use crate::error::{Decision, DecisionError};
use crate::gateway::GatewayError;
use crate::request::RequestContext;
use async_trait::async_trait;
use std::future::Future;

pub use authorization::AuthorizationHandler;
pub use token::TokenHandler;

/// Decides one kind of command
#[async_trait]
pub trait Handler<C: Command>: Send + Sync {
    async fn handle(&self, command: &C) -> Decision;
}

/// Awaits a gateway call unless the request is cancelled first.
///
/// `step` names what was in flight and ends up in the cancellation failure.
pub(crate) async fn guarded<T, F>(
    context: &RequestContext,
    step: &'static str,
    call: F,
) -> Result<T, DecisionError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::select! {
        biased;
        _ = context.cancellation().cancelled() => Err(DecisionError::Cancelled(step)),
        result = call => result.map_err(DecisionError::from),
    }
}
