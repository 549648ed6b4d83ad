use crate::claims::Principal;
use crate::gateway::GatewayError;
use serde::Serialize;
use thiserror::Error;

/// Outcome of a decision: a principal or a typed failure
pub type Decision = Result<Principal, DecisionError>;

/// Caller-visible failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ClientNotFound,
    InvalidRedirectUri,
    UserNotAuthenticated,
    UserNotFound,
    AccessDenied,
    InvalidClient,
    Validation,
    /// Collaborator fault or cancellation; not a domain decision
    Unavailable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("Client not found.")]
    ClientNotFound { client_id: String },

    #[error("The specified redirect_uri is not valid for this client.")]
    InvalidRedirectUri {
        client_id: String,
        redirect_uri: String,
    },

    #[error("User is not authenticated.")]
    UserNotAuthenticated,

    #[error("User not found.")]
    UserNotFound { user_id: String },

    #[error("{0}")]
    AccessDenied(String),

    #[error("Invalid client.")]
    InvalidClient { client_id: String },

    #[error("{}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Decision cancelled while {0}")]
    Cancelled(&'static str),
}

impl DecisionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ClientNotFound { .. } => FailureKind::ClientNotFound,
            Self::InvalidRedirectUri { .. } => FailureKind::InvalidRedirectUri,
            Self::UserNotAuthenticated => FailureKind::UserNotAuthenticated,
            Self::UserNotFound { .. } => FailureKind::UserNotFound,
            Self::AccessDenied(_) => FailureKind::AccessDenied,
            Self::InvalidClient { .. } => FailureKind::InvalidClient,
            Self::Validation(_) => FailureKind::Validation,
            Self::Gateway(_) | Self::Cancelled(_) => FailureKind::Unavailable,
        }
    }

    /// Protocol-level error code reported to the caller
    pub fn code(&self) -> &'static str {
        match self.kind() {
            FailureKind::ClientNotFound | FailureKind::UserNotFound | FailureKind::InvalidClient => {
                "not_found"
            }
            FailureKind::InvalidRedirectUri => "invalid_client",
            FailureKind::UserNotAuthenticated => "UserNotAuthenticated",
            FailureKind::AccessDenied => "access_denied",
            FailureKind::Validation => "invalid_request",
            FailureKind::Unavailable => "server_error",
        }
    }

    /// Whether the caller must challenge for a login instead of answering with an error
    pub fn is_challenge(&self) -> bool {
        matches!(self, Self::UserNotAuthenticated)
    }

    /// Individual messages behind this failure
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}
