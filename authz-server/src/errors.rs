use authz_engine::{DecisionError, FailureKind};
use axum::response::IntoResponse;
use axum::Json;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Endpoint a decision was requested at; failures map to different statuses per endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Authorize,
    Token,
}

/// RFC 7807 problem details, as returned for every failed decision
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// Protocol error code, e.g. `access_denied`
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Method and path of the failed request
    pub instance: String,
    pub request_id: String,
    /// Every message behind the failure, grouped by error code
    pub error_details: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub problem: ProblemDetails,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a title, detail message and status code
    pub fn new<T: ToString, S: ToString>(title: T, detail: S, status_code: StatusCode) -> Self {
        let title = title.to_string();
        let detail = detail.to_string();
        Self {
            problem: ProblemDetails {
                error_details: BTreeMap::from([(title.clone(), vec![detail.clone()])]),
                title,
                status: status_code.as_u16(),
                detail,
                instance: String::new(),
                request_id: String::new(),
            },
            status_code,
        }
    }

    /// Create new Bad Gateway (502) for a collaborator the server depends on
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new("server_error", detail, StatusCode::BAD_GATEWAY)
    }

    /// Maps a failed decision to its problem details
    pub fn from_decision(err: &DecisionError, endpoint: Endpoint) -> Self {
        let status_code = decision_status(err, endpoint);
        let code = err.code().to_string();
        Self {
            problem: ProblemDetails {
                title: code.clone(),
                status: status_code.as_u16(),
                detail: err.to_string(),
                instance: String::new(),
                request_id: String::new(),
                error_details: BTreeMap::from([(code, err.details())]),
            },
            status_code,
        }
    }

    /// Attach the request this failure belongs to
    pub fn for_request(mut self, instance: impl Into<String>, request_id: impl Into<String>) -> Self {
        self.problem.instance = instance.into();
        self.problem.request_id = request_id.into();
        self
    }
}

fn decision_status(err: &DecisionError, endpoint: Endpoint) -> StatusCode {
    match err {
        DecisionError::Gateway(_) => return StatusCode::BAD_GATEWAY,
        DecisionError::Cancelled(_) => return StatusCode::SERVICE_UNAVAILABLE,
        _ => {}
    }
    match err.kind() {
        FailureKind::Validation | FailureKind::InvalidRedirectUri => StatusCode::BAD_REQUEST,
        FailureKind::AccessDenied => match endpoint {
            Endpoint::Authorize => StatusCode::FORBIDDEN,
            Endpoint::Token => StatusCode::UNAUTHORIZED,
        },
        FailureKind::ClientNotFound | FailureKind::UserNotFound | FailureKind::InvalidClient => {
            StatusCode::NOT_FOUND
        }
        FailureKind::UserNotAuthenticated => StatusCode::UNAUTHORIZED,
        FailureKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status_code,
            [(CONTENT_TYPE, "application/problem+json")],
            Json(self.problem),
        )
            .into_response()
    }
}
