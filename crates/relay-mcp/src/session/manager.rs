//! Session Manager
//!
//! Session creation, validation, refresh and revocation. Tokens are
//! `base64(32 random bytes) + "." + base64(HMAC-SHA-256(secret, material))`
//! so possession of the store is not enough to mint one. A session is
//! valid iff it is active, unexpired and its user is still active;
//! refreshable iff active and inside the refresh window. Creating a
//! session past `max_sessions_per_user` revokes the user's oldest sessions
//! by last activity.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

// Layer 3: Internal module imports
use super::error::{SessionError, SessionResult};
use crate::protocol::Metadata;

type HmacSha256 = Hmac<Sha256>;

/// Answers whether a user exists and is active
///
/// Persistent user storage is a host collaborator; the core only asks this
/// one question.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether `user_id` names an active user
    async fn is_active(&self, user_id: &str) -> bool;
}

/// Fixed-set directory for tests and single-tenant embeddings
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    active: std::collections::HashSet<String>,
}

impl StaticUserDirectory {
    /// Directory with the given active users
    pub fn with_users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active: users.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn is_active(&self, user_id: &str) -> bool {
        self.active.contains(user_id)
    }
}

/// One authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session id
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Bearer token (material.signature)
    pub token: String,
    /// Refresh token (same construction)
    pub refresh_token: String,
    /// Authentication method that created the session
    pub auth_method: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Hard expiry for the bearer token
    pub expires_at: DateTime<Utc>,
    /// Hard expiry for the refresh token
    pub refresh_expires_at: DateTime<Utc>,
    /// Last validation or refresh
    pub last_activity_at: DateTime<Utc>,
    /// False once revoked
    pub active: bool,
    /// Host-defined metadata
    pub metadata: Metadata,
}

impl Session {
    /// Whether the session is valid at `now` (user liveness checked
    /// separately)
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }

    /// Whether the session may be refreshed at `now`
    pub fn is_refreshable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.refresh_expires_at
    }
}

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC secret for token integrity
    pub secret: Vec<u8>,
    /// Bearer token lifetime
    pub session_ttl: TimeDelta,
    /// Refresh token lifetime
    pub refresh_ttl: TimeDelta,
    /// When set, validation extends `expires_at` to `now + sliding` if the
    /// remaining lifetime is shorter
    pub sliding_expiration: Option<TimeDelta>,
    /// Cap on concurrent sessions per user; oldest-by-activity are revoked
    pub max_sessions_per_user: usize,
    /// How often the expiry sweep runs
    pub sweep_interval: Duration,
}

impl SessionConfig {
    /// Config with the given secret and library defaults
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            session_ttl: TimeDelta::hours(1),
            refresh_ttl: TimeDelta::days(30),
            sliding_expiration: None,
            max_sessions_per_user: 5,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Session store and lifecycle operations
pub struct SessionManager {
    sessions: DashMap<String, Session>,
    token_index: DashMap<String, String>,
    refresh_index: DashMap<String, String>,
    users: Arc<dyn UserDirectory>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a manager over the given user directory
    pub fn new(config: SessionConfig, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            sessions: DashMap::new(),
            token_index: DashMap::new(),
            refresh_index: DashMap::new(),
            users,
            config,
        }
    }

    /// Mint a `material.signature` token
    fn generate_token(&self) -> SessionResult<String> {
        let mut material = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut material);
        let material = URL_SAFE_NO_PAD.encode(material);
        let signature = self.sign(&material)?;
        Ok(format!("{material}.{signature}"))
    }

    fn sign(&self, material: &str) -> SessionResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|_| SessionError::BadToken)?;
        mac.update(material.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Verify a token's HMAC without touching the store
    pub fn verify_token_integrity(&self, token: &str) -> bool {
        let Some((material, signature)) = token.split_once('.') else {
            return false;
        };
        match self.sign(material) {
            Ok(expected) => {
                // Length-equal comparison; tokens are fixed-size so a simple
                // equality check does not leak useful timing here.
                expected == signature
            }
            Err(_) => false,
        }
    }

    /// Create a session for an active user
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UserNotActive` when the directory disclaims
    /// the user.
    pub async fn create_session(
        &self,
        user_id: &str,
        auth_method: &str,
        metadata: Metadata,
    ) -> SessionResult<Session> {
        if !self.users.is_active(user_id).await {
            return Err(SessionError::UserNotActive(user_id.to_string()));
        }

        self.enforce_session_cap(user_id);

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: self.generate_token()?,
            refresh_token: self.generate_token()?,
            auth_method: auth_method.to_string(),
            created_at: now,
            expires_at: now + self.config.session_ttl,
            refresh_expires_at: now + self.config.refresh_ttl,
            last_activity_at: now,
            active: true,
            metadata,
        };

        self.token_index
            .insert(session.token.clone(), session.id.clone());
        self.refresh_index
            .insert(session.refresh_token.clone(), session.id.clone());
        self.sessions.insert(session.id.clone(), session.clone());
        debug!(user = %user_id, session = %session.id, "session created");
        Ok(session)
    }

    /// Revoke oldest-by-activity sessions beyond the per-user cap
    fn enforce_session_cap(&self, user_id: &str) {
        let cap = self.config.max_sessions_per_user;
        if cap == 0 {
            return;
        }

        let mut live: Vec<(String, DateTime<Utc>)> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().user_id == user_id && entry.value().active)
            .map(|entry| (entry.key().clone(), entry.value().last_activity_at))
            .collect();

        // Leave room for the session about to be created.
        if live.len() < cap {
            return;
        }
        live.sort_by_key(|(_, last_activity)| *last_activity);
        let excess = live.len() + 1 - cap;
        for (session_id, _) in live.into_iter().take(excess) {
            self.revoke(&session_id);
        }
    }

    /// Validate a bearer token and return its session
    ///
    /// Applies sliding expiration when configured and stamps
    /// `last_activity_at`.
    ///
    /// # Errors
    ///
    /// `BadToken` for integrity failures, `NotFound` for unknown tokens,
    /// `Invalid` for revoked/expired sessions or deactivated users.
    pub async fn validate(&self, token: &str) -> SessionResult<Session> {
        if !self.verify_token_integrity(token) {
            return Err(SessionError::BadToken);
        }
        let session_id = self
            .token_index
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::NotFound)?;

        let now = Utc::now();
        let (user_id, valid) = {
            let session = self.sessions.get(&session_id).ok_or(SessionError::NotFound)?;
            (session.user_id.clone(), session.is_valid_at(now))
        };
        if !valid {
            return Err(SessionError::Invalid {
                reason: "session is revoked or expired".to_string(),
            });
        }
        if !self.users.is_active(&user_id).await {
            return Err(SessionError::Invalid {
                reason: format!("user {user_id} is no longer active"),
            });
        }

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound)?;
        if let Some(sliding) = self.config.sliding_expiration {
            if sliding > TimeDelta::zero() && session.expires_at - now < sliding {
                session.expires_at = now + sliding;
            }
        }
        session.last_activity_at = now;
        Ok(session.clone())
    }

    /// Exchange a refresh token for a fresh (token, refreshToken) pair
    ///
    /// # Errors
    ///
    /// `BadToken`/`NotFound` for unusable tokens, `NotRefreshable` when the
    /// refresh window passed or the session is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> SessionResult<Session> {
        if !self.verify_token_integrity(refresh_token) {
            return Err(SessionError::BadToken);
        }
        let session_id = self
            .refresh_index
            .get(refresh_token)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::NotFound)?;

        let now = Utc::now();
        {
            let session = self.sessions.get(&session_id).ok_or(SessionError::NotFound)?;
            if !session.is_refreshable_at(now) {
                return Err(SessionError::NotRefreshable {
                    reason: "refresh window passed or session revoked".to_string(),
                });
            }
            if !self.users.is_active(&session.user_id).await {
                return Err(SessionError::NotRefreshable {
                    reason: "user is no longer active".to_string(),
                });
            }
        }

        let new_token = self.generate_token()?;
        let new_refresh = self.generate_token()?;

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound)?;
        self.token_index.remove(&session.token);
        self.refresh_index.remove(&session.refresh_token);

        session.token = new_token.clone();
        session.refresh_token = new_refresh.clone();
        session.expires_at = now + self.config.session_ttl;
        session.refresh_expires_at = now + self.config.refresh_ttl;
        session.last_activity_at = now;

        self.token_index.insert(new_token, session_id.clone());
        self.refresh_index.insert(new_refresh, session_id.clone());
        debug!(session = %session_id, "session refreshed");
        Ok(session.clone())
    }

    /// Revoke a session by id, returning whether it was live
    pub fn revoke(&self, session_id: &str) -> bool {
        let Some(mut session) = self.sessions.get_mut(session_id) else {
            return false;
        };
        if !session.active {
            return false;
        }
        session.active = false;
        self.token_index.remove(&session.token);
        self.refresh_index.remove(&session.refresh_token);
        debug!(session = %session_id, "session revoked");
        true
    }

    /// Revoke every session of a user, returning how many
    pub fn revoke_all_for_user(&self, user_id: &str) -> usize {
        let ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().user_id == user_id && entry.value().active)
            .map(|entry| entry.key().clone())
            .collect();
        ids.iter().filter(|id| self.revoke(id)).count()
    }

    /// Look up a session by id
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Count of sessions currently active for a user
    pub fn active_session_count(&self, user_id: &str) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().user_id == user_id && entry.value().active)
            .count()
    }

    /// Drop sessions whose refresh window has passed; returns how many
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let dead: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                let session = entry.value();
                !session.active || now >= session.refresh_expires_at
            })
            .map(|entry| entry.key().clone())
            .collect();

        let swept = dead.len();
        for session_id in dead {
            if let Some((_, session)) = self.sessions.remove(&session_id) {
                self.token_index.remove(&session.token);
                self.refresh_index.remove(&session.refresh_token);
            }
        }
        if swept > 0 {
            debug!(swept, "swept dead sessions");
        }
        swept
    }

    /// Start the periodic expiry sweep; runs until `shutdown` is cancelled
    pub fn start_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let sweep_interval = manager.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.sweep_expired(Utc::now());
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("session sweeper shut down");
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        manager_with(SessionConfig::new(b"test-secret".to_vec()))
    }

    fn manager_with(config: SessionConfig) -> SessionManager {
        SessionManager::new(
            config,
            Arc::new(StaticUserDirectory::with_users(["alice", "bob"])),
        )
    }

    #[tokio::test]
    async fn create_and_validate() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        assert!(session.active);
        assert_eq!(session.user_id, "alice");
        let validated = manager.validate(&session.token).await.unwrap();
        assert_eq!(validated.id, session.id);
    }

    #[tokio::test]
    async fn token_shape_is_material_dot_signature() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        let parts: Vec<&str> = session.token.split('.').collect();
        assert_eq!(parts.len(), 2);
        // 32 bytes -> 43 unpadded url-safe base64 chars.
        assert_eq!(parts[0].len(), 43);
        assert!(manager.verify_token_integrity(&session.token));
    }

    #[tokio::test]
    async fn tampered_token_rejected() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        let mut tampered = session.token.clone();
        tampered.replace_range(0..1, if &tampered[0..1] == "A" { "B" } else { "A" });
        assert!(!manager.verify_token_integrity(&tampered));
        assert!(matches!(
            manager.validate(&tampered).await,
            Err(SessionError::BadToken)
        ));
    }

    #[tokio::test]
    async fn inactive_user_cannot_create() {
        let manager = manager();
        assert!(matches!(
            manager
                .create_session("mallory", "apikey", Metadata::new())
                .await,
            Err(SessionError::UserNotActive(_))
        ));
    }

    #[tokio::test]
    async fn revoked_session_fails_validation() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        assert!(manager.revoke(&session.id));
        assert!(!manager.revoke(&session.id));
        assert!(manager.validate(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn session_cap_revokes_oldest_by_activity() {
        let config = SessionConfig {
            max_sessions_per_user: 2,
            ..SessionConfig::new(b"s".to_vec())
        };
        let manager = manager_with(config);

        let first = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Touch the first so the second becomes oldest-by-activity.
        manager.validate(&first.token).await.unwrap();

        let third = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        assert_eq!(manager.active_session_count("alice"), 2);
        assert!(manager.get(&second.id).map(|s| !s.active).unwrap_or(false));
        assert!(manager.validate(&first.token).await.is_ok());
        assert!(manager.validate(&third.token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rotates_both_tokens() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        let refreshed = manager.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(refreshed.token, session.token);
        assert_ne!(refreshed.refresh_token, session.refresh_token);

        // Old bearer token no longer resolves.
        assert!(manager.validate(&session.token).await.is_err());
        assert!(manager.validate(&refreshed.token).await.is_ok());
    }

    #[tokio::test]
    async fn sliding_expiration_extends_lifetime() {
        let config = SessionConfig {
            session_ttl: TimeDelta::seconds(10),
            sliding_expiration: Some(TimeDelta::hours(1)),
            ..SessionConfig::new(b"s".to_vec())
        };
        let manager = manager_with(config);
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();

        let validated = manager.validate(&session.token).await.unwrap();
        assert!(validated.expires_at > session.expires_at);
    }

    #[tokio::test]
    async fn revoke_all_for_user() {
        let manager = manager();
        manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();
        manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();
        manager
            .create_session("bob", "apikey", Metadata::new())
            .await
            .unwrap();

        assert_eq!(manager.revoke_all_for_user("alice"), 2);
        assert_eq!(manager.active_session_count("alice"), 0);
        assert_eq!(manager.active_session_count("bob"), 1);
    }

    #[tokio::test]
    async fn sweep_drops_dead_sessions() {
        let manager = manager();
        let session = manager
            .create_session("alice", "apikey", Metadata::new())
            .await
            .unwrap();
        manager.revoke(&session.id);

        assert_eq!(manager.sweep_expired(Utc::now()), 1);
        assert!(manager.get(&session.id).is_none());
    }
}
