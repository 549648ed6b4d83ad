//! Clients and users the server decides for, loaded once at startup.

use authz_engine::{ClaimKind, ClaimSet, MemoryDirectory, RegisteredClient, UserRecord};
use log::{info, warn};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

const DEFAULT_REDIRECT_URI: &str = "https://oauth.pstmn.io/v1/callback";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read directory file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse directory file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate {0} '{1}' in directory")]
    Duplicate(&'static str, String),
}

/// Directory contents as read from a JSON file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub clients: Vec<RegisteredClient>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl DirectorySeed {
    /// Development data: the dashboard and tenant applications with one user each
    pub fn development() -> Self {
        let client = |client_id: &str, display_name: &str| RegisteredClient {
            client_id: client_id.to_string(),
            display_name: Some(display_name.to_string()),
            redirect_uris: BTreeSet::from([DEFAULT_REDIRECT_URI.to_string()]),
        };
        let user = |id: &str, email: &str, role: &str, allowed_client: &str| {
            let mut claims = ClaimSet::new();
            claims.push(ClaimKind::AllowedClient, allowed_client);
            UserRecord {
                id: id.to_string(),
                email: Some(email.to_string()),
                roles: vec![role.to_string()],
                claims,
            }
        };

        Self {
            clients: vec![
                client("dashboard-client", "Dashboard Client"),
                client("tenant-client", "Tenant Client"),
            ],
            users: vec![
                user(
                    "3f6c1a52-8d0e-4b57-9a61-0c2d7e4f1a01",
                    "admin@propmate.com",
                    "Admin",
                    "dashboard-client",
                ),
                user(
                    "9b2e47d0-51c3-4e8a-b7f2-6d1c0a3e5b02",
                    "tenant@gmail.com",
                    "Tenant",
                    "tenant-client",
                ),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Builds the in-memory directory, rejecting duplicate client or user ids
    pub fn into_directory(self) -> Result<MemoryDirectory, DirectoryError> {
        let mut directory = MemoryDirectory::new();

        let mut client_ids = HashSet::new();
        for client in self.clients {
            if !client_ids.insert(client.client_id.clone()) {
                return Err(DirectoryError::Duplicate("client", client.client_id));
            }
            directory = directory.with_client(client);
        }

        let mut user_ids = HashSet::new();
        for user in self.users {
            if !user_ids.insert(user.id.clone()) {
                return Err(DirectoryError::Duplicate("user", user.id));
            }
            for allowed in user.claims.values(ClaimKind::AllowedClient) {
                if !client_ids.contains(allowed) {
                    warn!(
                        "User '{}' is allowed on unknown client '{}'",
                        user.id, allowed
                    );
                }
            }
            directory = directory.with_user(user);
        }

        Ok(directory)
    }
}

/// Loads the directory from `path`, or the development seed when no path is configured
pub fn load_directory(path: Option<&str>) -> Result<MemoryDirectory, DirectoryError> {
    let seed = match path {
        Some(path) => {
            info!("Loading directory from {}", path);
            DirectorySeed::from_file(path)?
        }
        None => {
            warn!("No directory file configured, using the development seed");
            DirectorySeed::development()
        }
    };
    let directory = seed.into_directory()?;
    info!(
        "Directory ready with {} clients and {} users",
        directory.client_count(),
        directory.user_count()
    );
    Ok(directory)
}
