use super::models::{ProtocolParams, SignInResponse};
use super::{bearer_token, request_id, sign_in, Deadline, TOKEN_PATH};
use crate::errors::{ApiError, Endpoint, ProblemDetails};
use crate::headers::presets;
use crate::openapi::CONNECT_TAG;
use crate::state::AppState;
use authz_engine::{RequestContext, TokenCommand};
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use http::HeaderMap;

/// Re-issues the principal behind a grant the protocol engine already vetted
#[utoipa::path(
    post,
    path = "/connect/token",
    tag = CONNECT_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Form-encoded protocol parameters"),
    params(
        ("Authorization" = String, Header, description = "Bearer grant handle from a previous sign-in"),
    ),
    responses(
        (status = 200, description = "Principal re-issued for the grant", body = SignInResponse),
        (status = 400, description = "Invalid token request", body = ProblemDetails),
        (status = 401, description = "Grant missing, expired or issued to another client", body = ProblemDetails),
        (status = 404, description = "Unknown client", body = ProblemDetails),
        (status = 502, description = "A backing store failed", body = ProblemDetails),
    )
)]
pub(crate) async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<ProtocolParams>,
) -> Response {
    let request_id = request_id(&headers);
    let instance = format!("POST {TOKEN_PATH}");
    let deadline = Deadline::start(state.config.decision_timeout());

    let mut context = RequestContext::new(&request_id).with_cancellation(deadline.token());
    if let Some(grant) = bearer_token(&headers) {
        context = context.with_grant(grant);
    }
    let request = params.token_request();
    let client_id = request.client_id().to_string();
    let command = TokenCommand::new(request, context);

    let mut response = match state.engine.token(&command).await {
        Ok(principal) => sign_in(&state, &client_id, principal, &instance, &request_id).await,
        Err(err) => ApiError::from_decision(&err, Endpoint::Token)
            .for_request(instance, request_id)
            .into_response(),
    };
    presets::no_store().apply(&mut response);
    response
}
