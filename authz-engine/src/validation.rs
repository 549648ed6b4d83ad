//! Input rules checked before a command reaches its handler.
//!
//! All rules run; every violated rule contributes its message.

use crate::command::{AuthorizationCommand, TokenCommand};
use crate::request::ProtocolRequest;

pub const CLIENT_ID_REQUIRED: &str = "Client ID must be provided.";
pub const REDIRECT_URI_REQUIRED: &str = "Redirect URI must be provided.";
pub const GRANT_TYPE_REQUIRED: &str = "Grant type must be provided.";
pub const GRANT_TYPE_UNSUPPORTED: &str = "The specified grant type is not supported.";

pub trait Validate {
    /// Returns the message of every violated rule; empty when the input is valid
    fn validate(&self) -> Vec<String>;
}

fn endpoint_rules(request: &ProtocolRequest, violations: &mut Vec<String>) {
    if request.client_id().trim().is_empty() {
        violations.push(CLIENT_ID_REQUIRED.to_string());
    }
    if request.redirect_uri().trim().is_empty() {
        violations.push(REDIRECT_URI_REQUIRED.to_string());
    }
}

impl Validate for AuthorizationCommand {
    fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        endpoint_rules(&self.request, &mut violations);
        violations
    }
}

impl Validate for TokenCommand {
    fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        endpoint_rules(&self.request, &mut violations);

        if self
            .request
            .grant_type_param()
            .is_none_or(|g| g.trim().is_empty())
        {
            violations.push(GRANT_TYPE_REQUIRED.to_string());
        }
        if self.request.grant_type().is_none() {
            violations.push(GRANT_TYPE_UNSUPPORTED.to_string());
        }
        violations
    }
}
