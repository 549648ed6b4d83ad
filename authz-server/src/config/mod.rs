pub(crate) use crate::config::store::{StoreConfig, StoreKind};
use confique::Config;
use std::time::Duration;

pub mod store;

/// Main configuration structure for the authorization server
#[derive(Debug, Config, Clone)]
pub struct AuthzConfig {
    /// The port the server will listen to (default: 7780)
    #[config(env = "AUTHZ_PORT", default = 7780)]
    pub port: u16,

    /// Where unauthenticated users are sent to sign in (default: /login)
    #[config(env = "AUTHZ_LOGIN_PATH", default = "/login")]
    pub login_path: String,

    /// Name of the interactive session cookie (default: .authz.session)
    #[config(env = "AUTHZ_SESSION_COOKIE", default = ".authz.session")]
    pub session_cookie: String,

    /// JSON file with the clients and users to serve; the development seed is used when unset
    #[config(env = "AUTHZ_DIRECTORY_PATH")]
    pub directory_path: Option<String>,

    /// Deadline for a single decision in seconds (default: 10)
    #[config(env = "AUTHZ_DECISION_TIMEOUT", default = 10)]
    pub decision_timeout: u64,

    /// Session and grant store configuration
    #[config(nested)]
    pub store: StoreConfig,
}

impl AuthzConfig {
    /// Creates a new configuration from environment variables
    pub fn new() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout)
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self {
            port: 0,
            login_path: "/login".to_string(),
            session_cookie: ".authz.session".to_string(),
            directory_path: None,
            decision_timeout: 5,
            store: StoreConfig {
                backend: StoreKind::InMemory,
                grant_ttl: 60,
                session_ttl: 60,
                memory_capacity: 16,
                redis_url: String::new(),
            },
        }
    }
}
