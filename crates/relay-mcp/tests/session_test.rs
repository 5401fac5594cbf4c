//! Session lifecycle driven the way a host transport would: authenticate,
//! attach the principal to a connection, validate and refresh tokens.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;

use common::TestClient;
use relay_mcp::error::{McpError, McpResult};
use relay_mcp::protocol::Metadata;
use relay_mcp::providers::Authenticator;
use relay_mcp::server::McpServerBuilder;
use relay_mcp::session::{
    Principal, SessionConfig, SessionManager, StaticUserDirectory,
};

fn session_manager() -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        SessionConfig::new(b"integration-secret".to_vec()),
        Arc::new(StaticUserDirectory::with_users(["alice"])),
    ))
}

/// Bearer authenticator backed by the session store
struct SessionAuthenticator {
    sessions: Arc<SessionManager>,
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    async fn authenticate(&self, scheme: &str, credentials: &str) -> McpResult<Principal> {
        if scheme != "bearer" {
            return Err(McpError::AuthenticationRequired);
        }
        let session = self.sessions.validate(credentials).await?;
        Ok(Principal::new(session.user_id).with_permission("*:*"))
    }
}

#[tokio::test]
async fn host_flow_attaches_session_principal() {
    let sessions = session_manager();
    let server = McpServerBuilder::new()
        .with_session_manager(Arc::clone(&sessions))
        .build()
        .expect("build failed");

    let session = sessions
        .create_session("alice", "apikey", Metadata::new())
        .await
        .expect("session creation failed");

    // The transport presents the bearer token; the authenticator resolves
    // it to a principal the host pins on the connection.
    let authenticator = SessionAuthenticator {
        sessions: Arc::clone(&sessions),
    };
    let principal = authenticator
        .authenticate("bearer", &session.token)
        .await
        .expect("token should validate");
    assert_eq!(principal.subject, "alice");
    assert!(principal.is_authorized("tools", "call"));

    let (mut client, connection) = TestClient::connect(&server).await;
    connection.set_principal(principal);
    assert_eq!(connection.rate_limit_identity(), "alice");

    // The connection behaves normally afterwards.
    let response = client.request(1, "ping", None).await;
    assert!(response["result"].is_object());

    server.shutdown().await;
}

#[tokio::test]
async fn revoked_session_stops_authenticating() {
    let sessions = session_manager();
    let authenticator = SessionAuthenticator {
        sessions: Arc::clone(&sessions),
    };

    let session = sessions
        .create_session("alice", "apikey", Metadata::new())
        .await
        .expect("session creation failed");
    assert!(authenticator
        .authenticate("bearer", &session.token)
        .await
        .is_ok());

    sessions.revoke(&session.id);
    let err = authenticator
        .authenticate("bearer", &session.token)
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::AuthenticationRequired));
}

#[tokio::test]
async fn refresh_invalidates_the_old_token() {
    let sessions = session_manager();
    let session = sessions
        .create_session("alice", "apikey", Metadata::new())
        .await
        .expect("session creation failed");

    let refreshed = sessions
        .refresh(&session.refresh_token)
        .await
        .expect("refresh failed");

    assert!(sessions.validate(&refreshed.token).await.is_ok());
    assert!(sessions.validate(&session.token).await.is_err());
    // The old refresh token was rotated out too.
    assert!(sessions.refresh(&session.refresh_token).await.is_err());
}

#[tokio::test]
async fn sliding_expiration_keeps_active_sessions_alive() {
    let config = SessionConfig {
        session_ttl: TimeDelta::seconds(1),
        sliding_expiration: Some(TimeDelta::hours(1)),
        ..SessionConfig::new(b"integration-secret".to_vec())
    };
    let sessions = Arc::new(SessionManager::new(
        config,
        Arc::new(StaticUserDirectory::with_users(["alice"])),
    ));

    let session = sessions
        .create_session("alice", "apikey", Metadata::new())
        .await
        .expect("session creation failed");

    let validated = sessions
        .validate(&session.token)
        .await
        .expect("validation failed");
    assert!(validated.expires_at - session.expires_at > TimeDelta::minutes(30));
}

#[tokio::test]
async fn foreign_token_rejected_outright() {
    let sessions = session_manager();
    let foreign = Arc::new(SessionManager::new(
        SessionConfig::new(b"other-secret".to_vec()),
        Arc::new(StaticUserDirectory::with_users(["alice"])),
    ));

    // A token minted under a different secret fails the integrity check.
    let session = foreign
        .create_session("alice", "apikey", Metadata::new())
        .await
        .expect("session creation failed");
    assert!(!sessions.verify_token_integrity(&session.token));
    assert!(sessions.validate(&session.token).await.is_err());
}
