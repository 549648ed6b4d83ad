pub(crate) mod authorize;
pub(crate) mod challenge;
pub(crate) mod models;
pub(crate) mod token;

use crate::errors::ApiError;
use crate::state::AppState;
use authz_engine::{AuthScheme, Principal};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::header::{AUTHORIZATION, COOKIE};
use http::{HeaderMap, StatusCode};
use log::error;
use models::SignInResponse;
use rand::Rng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) const AUTHORIZE_PATH: &str = "/connect/authorize";
pub(crate) const TOKEN_PATH: &str = "/connect/token";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Combines the protocol decision routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            AUTHORIZE_PATH,
            get(authorize::authorize_query_handler).post(authorize::authorize_form_handler),
        )
        .route(TOKEN_PATH, post(token::token_handler))
}

/// The caller's request id, or a fresh one when the caller did not send any
pub(crate) fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:016x}", rand::thread_rng().gen::<u64>()))
}

/// Value of the named cookie across every `Cookie` header
pub(crate) fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Credential from an `Authorization: Bearer` header; the scheme name is case-insensitive
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim()
        .split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Cancels a decision once its deadline passes. Dropping it stops the timer.
pub(crate) struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    pub(crate) fn start(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            }
        });
        Self { token, timer }
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Records the principal as a grant and hands it to the protocol engine
pub(crate) async fn sign_in(
    state: &AppState,
    client_id: &str,
    principal: Principal,
    instance: &str,
    request_id: &str,
) -> Response {
    match state.grants.issue(client_id, &principal).await {
        Ok(grant) => (
            StatusCode::OK,
            Json(SignInResponse {
                scheme: AuthScheme::ProtocolEngine,
                grant,
                principal,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to record grant for client '{}': {}", client_id, err);
            ApiError::bad_gateway("The grant store is unavailable.")
                .for_request(instance, request_id)
                .into_response()
        }
    }
}
