//! Commands dispatched through the [`DecisionEngine`](crate::DecisionEngine).

use crate::request::{ProtocolRequest, RequestContext};
use crate::validation::Validate;

/// A request to be decided, wrapped with its ambient context
pub trait Command: Validate + Send + Sync {
    /// Name used in logs
    const NAME: &'static str;

    fn request(&self) -> &ProtocolRequest;

    fn context(&self) -> &RequestContext;
}

/// Decision requested at the authorization endpoint
#[derive(Debug, Clone)]
pub struct AuthorizationCommand {
    pub request: ProtocolRequest,
    pub context: RequestContext,
}

impl AuthorizationCommand {
    pub fn new(request: ProtocolRequest, context: RequestContext) -> Self {
        Self { request, context }
    }
}

impl Command for AuthorizationCommand {
    const NAME: &'static str = "authorization";

    fn request(&self) -> &ProtocolRequest {
        &self.request
    }

    fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// Decision requested at the token endpoint
#[derive(Debug, Clone)]
pub struct TokenCommand {
    pub request: ProtocolRequest,
    pub context: RequestContext,
}

impl TokenCommand {
    pub fn new(request: ProtocolRequest, context: RequestContext) -> Self {
        Self { request, context }
    }
}

impl Command for TokenCommand {
    const NAME: &'static str = "token";

    fn request(&self) -> &ProtocolRequest {
        &self.request
    }

    fn context(&self) -> &RequestContext {
        &self.context
    }
}
