use super::challenge::login_challenge;
use super::models::{ProtocolParams, SignInResponse};
use super::{request_id, session_cookie, sign_in, Deadline, AUTHORIZE_PATH};
use crate::errors::{ApiError, Endpoint, ProblemDetails};
use crate::headers::presets;
use crate::openapi::CONNECT_TAG;
use crate::state::AppState;
use authz_engine::{AuthorizationCommand, RequestContext};
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, Method};

#[utoipa::path(
    get,
    path = "/connect/authorize",
    tag = CONNECT_TAG,
    params(
        ("client_id" = String, Query, description = "Client requesting authorization"),
        ("redirect_uri" = String, Query, description = "Redirect URI registered for the client"),
        ("scope" = Option<String>, Query, description = "Space separated scopes"),
    ),
    responses(
        (status = 200, description = "User authorized for the client", body = SignInResponse),
        (status = 302, description = "User must sign in first"),
        (status = 400, description = "Invalid request or redirect URI", body = ProblemDetails),
        (status = 403, description = "User not allowed to use the client", body = ProblemDetails),
        (status = 404, description = "Unknown client or user", body = ProblemDetails),
        (status = 502, description = "A backing store failed", body = ProblemDetails),
    )
)]
pub(crate) async fn authorize_query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProtocolParams>,
) -> Response {
    authorize(&state, Method::GET, &headers, params).await
}

#[utoipa::path(
    post,
    path = "/connect/authorize",
    tag = CONNECT_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Form-encoded protocol parameters"),
    responses(
        (status = 200, description = "User authorized for the client", body = SignInResponse),
        (status = 302, description = "User must sign in first"),
        (status = 400, description = "Invalid request or redirect URI", body = ProblemDetails),
        (status = 403, description = "User not allowed to use the client", body = ProblemDetails),
        (status = 404, description = "Unknown client or user", body = ProblemDetails),
        (status = 502, description = "A backing store failed", body = ProblemDetails),
    )
)]
pub(crate) async fn authorize_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<ProtocolParams>,
) -> Response {
    authorize(&state, Method::POST, &headers, params).await
}

async fn authorize(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    params: ProtocolParams,
) -> Response {
    let request_id = request_id(headers);
    let instance = format!("{method} {AUTHORIZE_PATH}");
    let deadline = Deadline::start(state.config.decision_timeout());

    let mut context = RequestContext::new(&request_id).with_cancellation(deadline.token());
    if let Some(cookie) = session_cookie(headers, &state.config.session_cookie) {
        context = context.with_session(cookie);
    }
    let request = params.authorization_request();
    let client_id = request.client_id().to_string();
    let command = AuthorizationCommand::new(request, context);

    let mut response = match state.engine.authorize(&command).await {
        Ok(principal) => sign_in(state, &client_id, principal, &instance, &request_id).await,
        Err(err) if err.is_challenge() => {
            login_challenge(&state.config.login_path, AUTHORIZE_PATH, &params)
        }
        Err(err) => ApiError::from_decision(&err, Endpoint::Authorize)
            .for_request(instance, request_id)
            .into_response(),
    };
    presets::no_store().apply(&mut response);
    response
}
