use confique::Config;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

/// Specifies which store backend holds sessions and grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    InMemory,
    Redis,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(format!(
                "unknown store backend '{other}', expected 'in-memory' or 'redis'"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for StoreKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

/// Configuration for the session and grant store
#[derive(Debug, Config, Clone)]
pub struct StoreConfig {
    /// Store backend: "in-memory" (default) or "redis"
    #[config(env = "AUTHZ_STORE_BACKEND", default = "in-memory")]
    pub backend: StoreKind,

    /// Grant lifetime in seconds (default: 14 days, the refresh token lifetime)
    #[config(env = "AUTHZ_STORE_GRANT_TTL", default = 1209600)]
    pub grant_ttl: u64,

    /// Sliding session lifetime in seconds (default: 1 hour)
    #[config(env = "AUTHZ_STORE_SESSION_TTL", default = 3600)]
    pub session_ttl: u64,

    /// Maximum capacity of each in-memory store in MiB (default: 64 MiB)
    #[config(env = "AUTHZ_STORE_MEMORY_CAPACITY", default = 64)]
    pub memory_capacity: usize,

    /// Redis connection string, required for the redis backend
    #[config(env = "AUTHZ_STORE_REDIS_URL", default = "")]
    pub redis_url: String,
}
