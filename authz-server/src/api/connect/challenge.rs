use super::models::ProtocolParams;
use axum::response::{IntoResponse, Response};
use http::header::LOCATION;
use http::StatusCode;
use url::form_urlencoded;

/// Sends the browser to sign in, returning to the same endpoint with the same
/// protocol parameters afterwards
pub fn login_challenge(login_path: &str, request_path: &str, params: &ProtocolParams) -> Response {
    let location = format!(
        "{login_path}?{}",
        form_urlencoded::Serializer::new(String::new())
            .append_pair("ReturnUrl", &return_url(request_path, params))
            .finish()
    );
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

fn return_url(request_path: &str, params: &ProtocolParams) -> String {
    if params.is_empty() {
        request_path.to_string()
    } else {
        format!("{request_path}?{}", params.query_string())
    }
}
