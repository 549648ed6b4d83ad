use authz_engine::{AuthScheme, Principal, ProtocolRequest};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

/// Protocol parameters exactly as received, in order, from the query or the form body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ProtocolParams(Vec<(String, String)>);

impl ProtocolParams {
    /// First value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-encodes the parameters as a query string, without the leading `?`
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// The request as seen at the authorization endpoint
    pub fn authorization_request(&self) -> ProtocolRequest {
        ProtocolRequest::authorization(
            self.get("client_id").unwrap_or_default(),
            self.get("redirect_uri").unwrap_or_default(),
        )
        .with_scope_param(self.get("scope").unwrap_or_default())
    }

    /// The request as seen at the token endpoint
    pub fn token_request(&self) -> ProtocolRequest {
        let client_id = self.get("client_id").unwrap_or_default();
        let redirect_uri = self.get("redirect_uri").unwrap_or_default();
        let request = match self.get("grant_type") {
            Some(grant_type) => ProtocolRequest::token(client_id, redirect_uri, grant_type),
            None => ProtocolRequest::authorization(client_id, redirect_uri),
        };
        request.with_scope_param(self.get("scope").unwrap_or_default())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProtocolParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Payload handed to the protocol engine when a decision succeeds
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    /// Scheme the protocol engine signs the principal in with
    #[schema(value_type = String, example = "protocol-engine")]
    pub scheme: AuthScheme,
    /// Handle presented as a bearer credential at the token endpoint
    pub grant: String,
    /// Claims with their token destinations, and the granted scopes
    #[schema(value_type = Object)]
    pub principal: Principal,
}
