use crate::config::AuthzConfig;
use crate::create_app;
use crate::directory::DirectorySeed;
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::{GrantStore, SessionStore, Store};
use axum::body::Body;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;
use url::form_urlencoded;

/// Test fixture running the full application over in-memory stores and the
/// development directory.
///
/// Browser sessions are opened directly in the session store, the way the
/// credential provider does it in production.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     let cookie = fixture.sign_in(TestFixture::ADMIN_ID).await;
///
///     let response = fixture.get_with_cookie("/connect/authorize?...", &cookie).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the application was built with
    pub config: AuthzConfig,
    sessions: SessionStore,
}

impl TestFixture {
    /// Development user allowed to use `dashboard-client`
    pub const ADMIN_ID: &'static str = "3f6c1a52-8d0e-4b57-9a61-0c2d7e4f1a01";
    /// Development user allowed to use `tenant-client`
    pub const TENANT_USER_ID: &'static str = "9b2e47d0-51c3-4e8a-b7f2-6d1c0a3e5b02";

    pub async fn new() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let config = AuthzConfig::for_test();
        let directory = DirectorySeed::development()
            .into_directory()
            .expect("Development directory must be valid");
        let sessions = SessionStore::new(Self::memory_store(config.store.session_ttl));
        let grants = GrantStore::new(Self::memory_store(config.store.grant_ttl));

        let state = AppState::from_parts(config.clone(), directory, sessions.clone(), grants);
        let app = create_app(state);

        Self {
            app,
            config,
            sessions,
        }
    }

    fn memory_store(ttl_secs: u64) -> Store {
        Store::InMemory(InMemoryStore::new(ttl_secs, 16).expect("Failed to create memory store"))
    }

    /// Opens a browser session for the user and returns its cookie value
    pub async fn sign_in(&self, user_id: &str) -> String {
        self.sessions
            .open_session(user_id)
            .await
            .expect("Failed to open session")
    }

    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder().method(method).uri(uri.as_ref())
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        self.get_with_headers(uri, &[]).await
    }

    /// Sends a GET request carrying the session cookie
    pub async fn get_with_cookie(&self, uri: impl AsRef<str>, cookie: &str) -> TestResponse {
        let cookie = self.cookie_header(cookie);
        self.get_with_headers(uri, &[(COOKIE.as_str(), cookie.as_str())])
            .await
    }

    pub async fn get_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = self.request_builder(Method::GET, uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a form-encoded body
    pub async fn post_form(&self, uri: impl AsRef<str>, form: &[(&str, &str)]) -> TestResponse {
        self.post_form_with_headers(uri, form, &[]).await
    }

    pub async fn post_form_with_cookie(
        &self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        cookie: &str,
    ) -> TestResponse {
        let cookie = self.cookie_header(cookie);
        self.post_form_with_headers(uri, form, &[(COOKIE.as_str(), cookie.as_str())])
            .await
    }

    /// Sends a POST request presenting a grant handle as bearer credential
    pub async fn post_form_with_bearer(
        &self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        grant: &str,
    ) -> TestResponse {
        let bearer = format!("Bearer {grant}");
        self.post_form_with_headers(uri, form, &[(AUTHORIZATION.as_str(), bearer.as_str())])
            .await
    }

    pub async fn post_form_with_headers(
        &self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter())
            .finish();
        let mut builder = self
            .request_builder(Method::POST, uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and returns a TestResponse
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Redirects carry no body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    fn cookie_header(&self, cookie: &str) -> String {
        format!("{}={cookie}", self.config.session_cookie)
    }
}

/// Response from a test request with convenient access to status, headers and JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
