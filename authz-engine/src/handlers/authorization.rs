use super::{guarded, Handler};
use crate::claims::{ClaimKind, ClaimSet, Principal};
use crate::command::AuthorizationCommand;
use crate::error::{Decision, DecisionError};
use crate::gateway::{ClientRegistry, SessionPrincipal, UserDirectory};
use crate::request::AuthScheme;
use async_trait::async_trait;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

pub const ACCESS_DENIED_FOR_CLIENT: &str = "User is not authorized for this client.";

/// Decides whether an authorization-endpoint request may proceed, and with
/// which principal.
///
/// Checks run in a fixed order and the first failing one ends the decision:
/// client existence, redirect URI registration, interactive session, user
/// existence, then the user's `AllowedClient` allowlist. Claims are only
/// assembled once every check has passed.
#[derive(Clone)]
pub struct AuthorizationHandler {
    clients: Arc<dyn ClientRegistry>,
    sessions: Arc<dyn SessionPrincipal>,
    users: Arc<dyn UserDirectory>,
}

impl AuthorizationHandler {
    pub fn new(
        clients: Arc<dyn ClientRegistry>,
        sessions: Arc<dyn SessionPrincipal>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            clients,
            sessions,
            users,
        }
    }
}

#[async_trait]
impl Handler<AuthorizationCommand> for AuthorizationHandler {
    async fn handle(&self, command: &AuthorizationCommand) -> Decision {
        let request = &command.request;
        let context = &command.context;
        let client_id = request.client_id();

        let client = guarded(
            context,
            "resolving the client",
            self.clients.find_by_client_id(client_id),
        )
        .await?
        .ok_or_else(|| DecisionError::ClientNotFound {
            client_id: client_id.to_string(),
        })?;

        let redirect_uris = guarded(
            context,
            "reading redirect URIs",
            self.clients.redirect_uris(&client),
        )
        .await?;
        if !redirect_uris.contains(request.redirect_uri()) {
            return Err(DecisionError::InvalidRedirectUri {
                client_id: client_id.to_string(),
                redirect_uri: request.redirect_uri().to_string(),
            });
        }

        let session = guarded(
            context,
            "authenticating the session",
            self.sessions
                .authenticate(context, AuthScheme::InteractiveSession),
        )
        .await?
        .ok_or(DecisionError::UserNotAuthenticated)?;

        let user = guarded(context, "resolving the user", self.users.get_user(&session))
            .await?
            .ok_or_else(|| DecisionError::UserNotFound {
                user_id: session.user_id.clone(),
            })?;

        let attached = guarded(context, "reading user claims", self.users.get_claims(&user)).await?;
        let allowed = attached
            .get(&ClaimKind::AllowedClient)
            .is_some_and(|clients| clients.iter().any(|c| c == client_id));
        if !allowed {
            debug!(
                "User '{}' has no AllowedClient claim for '{}'",
                user.id, client_id
            );
            return Err(DecisionError::AccessDenied(
                ACCESS_DENIED_FOR_CLIENT.to_string(),
            ));
        }

        let user_id = guarded(context, "reading the user id", self.users.get_user_id(&user)).await?;
        let email = guarded(context, "reading the user email", self.users.get_email(&user))
            .await?
            .unwrap_or_default();
        let roles = guarded(context, "reading user roles", self.users.get_roles(&user)).await?;

        let mut claims = ClaimSet::new();
        claims.push(ClaimKind::Subject, user_id);
        claims.push(ClaimKind::Email, email);
        let mut seen = HashSet::new();
        for role in roles {
            if seen.insert(role.clone()) {
                claims.push(ClaimKind::Role, role);
            }
        }

        Ok(Principal::new(claims, request.scopes().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, Destination};
    use crate::error::FailureKind;
    use crate::gateway::UserRecord;
    use crate::memory::{MemoryDirectory, MemorySessions};
    use crate::request::{ProtocolRequest, RequestContext};
    use crate::test_utils::{
        seeded_directory, seeded_sessions, CountingDirectory, PendingGateway,
        UnavailableGateway, ADMIN_ID, CALLBACK, DASHBOARD, TENANT,
    };
    use std::collections::BTreeSet;
    use std::sync::atomic::Ordering;

    fn handler() -> AuthorizationHandler {
        let directory = Arc::new(seeded_directory());
        AuthorizationHandler::new(directory.clone(), Arc::new(seeded_sessions()), directory)
    }

    fn command(client_id: &str, redirect_uri: &str, cookie: Option<&str>) -> AuthorizationCommand {
        let mut context = RequestContext::new("test");
        if let Some(cookie) = cookie {
            context = context.with_session(cookie);
        }
        AuthorizationCommand::new(
            ProtocolRequest::authorization(client_id, redirect_uri),
            context,
        )
    }

    #[tokio::test]
    async fn test_admin_is_granted_dashboard_client() {
        let principal = handler()
            .handle(&command(DASHBOARD, CALLBACK, Some("admin-cookie")))
            .await
            .expect("decision should succeed");

        let claims: Vec<_> = principal.claims().iter().map(|c| c.claim.clone()).collect();
        assert_eq!(
            claims,
            vec![
                Claim::new(ClaimKind::Subject, ADMIN_ID),
                Claim::new(ClaimKind::Email, "admin@propmate.com"),
                Claim::new(ClaimKind::Role, "Admin"),
            ]
        );

        let destinations: Vec<_> = principal
            .claims()
            .iter()
            .map(|c| c.destinations.clone())
            .collect();
        assert_eq!(
            destinations,
            vec![
                BTreeSet::from([Destination::AccessToken]),
                BTreeSet::from([Destination::IdentityToken]),
                BTreeSet::from([Destination::AccessToken, Destination::IdentityToken]),
            ]
        );
    }

    #[tokio::test]
    async fn test_allowlist_excludes_client() {
        let result = handler()
            .handle(&command(DASHBOARD, CALLBACK, Some("tenant-cookie")))
            .await;
        assert_eq!(
            result,
            Err(DecisionError::AccessDenied(ACCESS_DENIED_FOR_CLIENT.to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let result = handler()
            .handle(&command("ghost-client", CALLBACK, Some("admin-cookie")))
            .await;
        assert_eq!(result.unwrap_err().kind(), FailureKind::ClientNotFound);
    }

    #[tokio::test]
    async fn test_client_existence_is_checked_before_redirect_uri() {
        let result = handler()
            .handle(&command("ghost-client", "https://evil.example/cb", None))
            .await;
        assert_eq!(result.unwrap_err().kind(), FailureKind::ClientNotFound);
    }

    #[tokio::test]
    async fn test_unregistered_redirect_uri() {
        let result = handler()
            .handle(&command(DASHBOARD, "https://evil.example/cb", Some("admin-cookie")))
            .await;
        assert_eq!(
            result,
            Err(DecisionError::InvalidRedirectUri {
                client_id: DASHBOARD.to_string(),
                redirect_uri: "https://evil.example/cb".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_redirect_uri_match_is_exact() {
        let result = handler()
            .handle(&command(DASHBOARD, "https://oauth.pstmn.io/v1/callback/", Some("admin-cookie")))
            .await;
        assert_eq!(result.unwrap_err().kind(), FailureKind::InvalidRedirectUri);
    }

    #[tokio::test]
    async fn test_missing_session_challenges() {
        let err = handler()
            .handle(&command(DASHBOARD, CALLBACK, None))
            .await
            .unwrap_err();
        assert_eq!(err, DecisionError::UserNotAuthenticated);
        assert!(err.is_challenge());

        let err = handler()
            .handle(&command(DASHBOARD, CALLBACK, Some("expired-cookie")))
            .await
            .unwrap_err();
        assert!(err.is_challenge());
    }

    #[tokio::test]
    async fn test_orphaned_session() {
        let result = handler()
            .handle(&command(DASHBOARD, CALLBACK, Some("orphan-cookie")))
            .await;
        assert_eq!(
            result,
            Err(DecisionError::UserNotFound {
                user_id: "deleted-user".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_repeated_decisions_are_identical() {
        let handler = handler();
        let command = command(DASHBOARD, CALLBACK, Some("admin-cookie"));
        let first = handler.handle(&command).await;
        let second = handler.handle(&command).await;
        assert_eq!(first, second);

        let denied = self::command(TENANT, CALLBACK, Some("admin-cookie"));
        assert_eq!(handler.handle(&denied).await, handler.handle(&denied).await);
    }

    #[tokio::test]
    async fn test_roles_and_email_edge_cases() {
        let mut claims = ClaimSet::new();
        claims.push(ClaimKind::AllowedClient, DASHBOARD);
        let no_roles = UserRecord {
            id: "plain".into(),
            email: None,
            roles: vec![],
            claims: claims.clone(),
        };
        let many_roles = UserRecord {
            id: "busy".into(),
            email: Some("busy@example.com".into()),
            roles: vec!["Tenant".into(), "PropertyManager".into(), "Tenant".into()],
            claims,
        };
        let directory = Arc::new(seeded_directory().with_user(no_roles).with_user(many_roles));
        let sessions = Arc::new(
            MemorySessions::new()
                .with_session("plain-cookie", "plain")
                .with_session("busy-cookie", "busy"),
        );
        let handler = AuthorizationHandler::new(directory.clone(), sessions, directory);

        let principal = handler
            .handle(&command(DASHBOARD, CALLBACK, Some("plain-cookie")))
            .await
            .unwrap();
        let claims = principal.claim_set();
        assert_eq!(claims.count(ClaimKind::Subject), 1);
        assert_eq!(claims.count(ClaimKind::Email), 1);
        assert_eq!(claims.count(ClaimKind::Role), 0);
        assert_eq!(claims.values(ClaimKind::Email).collect::<Vec<_>>(), vec![""]);

        let principal = handler
            .handle(&command(DASHBOARD, CALLBACK, Some("busy-cookie")))
            .await
            .unwrap();
        assert_eq!(
            principal
                .claim_set()
                .values(ClaimKind::Role)
                .collect::<Vec<_>>(),
            vec!["Tenant", "PropertyManager"]
        );
    }

    #[tokio::test]
    async fn test_scopes_pass_through() {
        let mut command = command(DASHBOARD, CALLBACK, Some("admin-cookie"));
        command.request = command
            .request
            .with_scopes(["openid", "offline_access", "unregistered-scope"]);

        let principal = handler().handle(&command).await.unwrap();
        assert_eq!(
            principal.scopes(),
            &BTreeSet::from([
                "offline_access".to_string(),
                "openid".to_string(),
                "unregistered-scope".to_string()
            ])
        );
    }

    #[tokio::test]
    async fn test_denial_happens_before_claim_assembly() {
        let directory = Arc::new(CountingDirectory::new(seeded_directory()));
        let handler = AuthorizationHandler::new(
            Arc::new(seeded_directory()),
            Arc::new(seeded_sessions()),
            directory.clone(),
        );

        let result = handler
            .handle(&command(DASHBOARD, CALLBACK, Some("tenant-cookie")))
            .await;
        assert!(result.is_err());
        assert_eq!(directory.role_reads.load(Ordering::SeqCst), 0);
        assert_eq!(directory.email_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gateway_fault_is_generic_failure() {
        let directory = Arc::new(seeded_directory());
        let handler = AuthorizationHandler::new(
            Arc::new(UnavailableGateway),
            Arc::new(seeded_sessions()),
            directory,
        );

        let err = handler
            .handle(&command(DASHBOARD, CALLBACK, Some("admin-cookie")))
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::Gateway(_)));
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_inflight_call() {
        let directory = Arc::new(seeded_directory());
        let handler = AuthorizationHandler::new(
            directory.clone(),
            Arc::new(PendingGateway),
            directory,
        );

        let command = command(DASHBOARD, CALLBACK, Some("admin-cookie"));
        let token = command.context.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = handler.handle(&command).await.unwrap_err();
        assert_eq!(err, DecisionError::Cancelled("authenticating the session"));
    }

    #[tokio::test]
    async fn test_empty_directory_reports_missing_client() {
        let directory = Arc::new(MemoryDirectory::new());
        let handler =
            AuthorizationHandler::new(directory.clone(), Arc::new(seeded_sessions()), directory);
        let err = handler
            .handle(&command(DASHBOARD, CALLBACK, Some("admin-cookie")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Client not found.");
    }
}
