//! Session lifecycle coordinator
//!
//! Owns the auth state machine:
//! `Unknown -> Verifying -> { Authenticated, Anonymous }` at process
//! start, `Authenticated -> Refreshing -> { Authenticated, Anonymous }`
//! for profile refreshes, and any state `-> Anonymous` on logout.
//!
//! The rules for tearing a session down are deliberately asymmetric:
//! a 401 or an invalid envelope deletes the token, while a timeout or an
//! unreachable server keeps the user logged in and surfaces the error.
//! A connectivity blip must never log anyone out.

use crate::error::{ApiError, Result};
use crate::executor::RequestExecutor;
use crate::token::{TokenStore, TOKEN_KEY};
use crate::types::{AuthResponse, RegisterInput, User, UserEnvelope};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process start, stored credentials not examined yet
    Unknown,
    /// A stored token is being verified with the server
    Verifying,
    /// Token accepted; a profile is loaded
    Authenticated,
    /// No usable credentials
    Anonymous,
    /// Authenticated, with a profile refresh in flight
    Refreshing,
}

struct Snapshot {
    state: SessionState,
    user: Option<User>,
}

/// Clears an in-flight flag when dropped
struct InFlightFlag<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightFlag<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Coordinates login state, token persistence, and profile refreshes
pub struct SessionCoordinator {
    executor: Arc<RequestExecutor>,
    tokens: Arc<dyn TokenStore>,
    snapshot: RwLock<Snapshot>,
    verifying: AtomicBool,
    refreshing: AtomicBool,
}

impl SessionCoordinator {
    /// Create a coordinator over the executor's token store
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        let tokens = executor.tokens();
        Self {
            executor,
            tokens,
            snapshot: RwLock::new(Snapshot {
                state: SessionState::Unknown,
                user: None,
            }),
            verifying: AtomicBool::new(false),
            refreshing: AtomicBool::new(false),
        }
    }

    // ==================== Snapshot Reads ====================

    /// Current state
    pub async fn state(&self) -> SessionState {
        self.snapshot.read().await.state
    }

    /// Current profile, if one is loaded
    pub async fn current_user(&self) -> Option<User> {
        self.snapshot.read().await.user.clone()
    }

    /// True while a session is established, including mid-refresh
    pub async fn is_authenticated(&self) -> bool {
        matches!(
            self.snapshot.read().await.state,
            SessionState::Authenticated | SessionState::Refreshing
        )
    }

    // ==================== Lifecycle ====================

    /// Verify stored credentials at process start.
    ///
    /// Returns the resulting state. Only a connectivity failure is an
    /// error; every other outcome resolves the machine to `Authenticated`
    /// or `Anonymous`. An invalid token, a malformed body, or a server
    /// error all fail closed: the token is deleted. While one resume is
    /// verifying, an overlapping call returns the current state without
    /// a second request.
    pub async fn resume(&self) -> Result<SessionState> {
        if self
            .verifying
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            debug!("Resume already in flight");
            return Ok(self.state().await);
        }
        let _latch = InFlightFlag {
            flag: &self.verifying,
        };

        let Some(_token) = self.tokens.get(TOKEN_KEY).await else {
            debug!("No stored token, starting anonymous");
            self.set(SessionState::Anonymous, None).await;
            return Ok(SessionState::Anonymous);
        };

        let prior = self.state().await;
        self.set_state(SessionState::Verifying).await;
        debug!("Token found, verifying session");

        match self.executor.get("/api/auth/me").await {
            Ok(value) => {
                let envelope: UserEnvelope = match serde_json::from_value(value) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(error = %e, "Undecodable verification body, clearing session");
                        self.teardown().await;
                        return Ok(SessionState::Anonymous);
                    }
                };
                match envelope.user {
                    Some(user) if envelope.success => {
                        info!(username = %user.username, "Session resumed");
                        self.set(SessionState::Authenticated, Some(user)).await;
                        Ok(SessionState::Authenticated)
                    }
                    _ => {
                        warn!("Stored token rejected, clearing session");
                        self.teardown().await;
                        Ok(SessionState::Anonymous)
                    }
                }
            }
            Err(e) if e.is_connectivity() => {
                // Server unreachable: token may still be good, keep it
                warn!(error = %e, "Session verification unreachable, keeping prior state");
                self.set_state(prior).await;
                Err(e)
            }
            Err(ApiError::Unauthorized(_)) => {
                warn!("Stored token expired or invalid");
                self.teardown().await;
                Ok(SessionState::Anonymous)
            }
            Err(e) => {
                warn!(error = %e, "Session verification failed, clearing session");
                self.teardown().await;
                Ok(SessionState::Anonymous)
            }
        }
    }

    /// Exchange credentials for a session
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let body = json!({ "username": username, "password": password });
        let value = self.executor.post("/api/auth/login", &body).await?;
        let response: AuthResponse = serde_json::from_value(value)?;

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "Login failed".to_string());
            return Err(ApiError::Unauthorized(message));
        }

        match (response.token, response.user) {
            (Some(token), Some(user)) => {
                self.tokens.set(TOKEN_KEY, &token).await;
                info!(username = %user.username, "Login successful");
                self.set(SessionState::Authenticated, Some(user.clone())).await;
                Ok(user)
            }
            _ => Err(ApiError::Malformed(
                "Login response missing token or user".to_string(),
            )),
        }
    }

    /// Create an account; the backend logs the new member straight in
    pub async fn register(&self, input: &RegisterInput) -> Result<User> {
        let body = serde_json::to_value(input)?;
        let value = self.executor.post("/api/auth/register", &body).await?;
        let response: AuthResponse = serde_json::from_value(value)?;

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "Registration failed".to_string());
            return Err(ApiError::Unknown(message));
        }

        match (response.token, response.user) {
            (Some(token), Some(user)) => {
                self.tokens.set(TOKEN_KEY, &token).await;
                info!(username = %user.username, "Registration successful");
                self.set(SessionState::Authenticated, Some(user.clone())).await;
                Ok(user)
            }
            _ => Err(ApiError::Malformed(
                "Registration response missing token or user".to_string(),
            )),
        }
    }

    /// Re-fetch the profile for an established session.
    ///
    /// No-op (`Ok(None)`) when not authenticated or when a refresh is
    /// already in flight. A 401 or an invalid envelope tears the session
    /// down; connectivity and server errors keep it and propagate.
    pub async fn refresh(&self) -> Result<Option<User>> {
        if !self.is_authenticated().await {
            debug!("Refresh skipped, not authenticated");
            return Ok(None);
        }

        if self
            .refreshing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight");
            return Ok(None);
        }
        let _latch = InFlightFlag {
            flag: &self.refreshing,
        };

        self.set_state(SessionState::Refreshing).await;
        debug!("Refreshing user profile");

        match self.executor.get("/api/auth/me").await {
            Ok(value) => {
                let envelope: UserEnvelope = match serde_json::from_value(value) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        self.set_state(SessionState::Authenticated).await;
                        return Err(e.into());
                    }
                };
                match envelope.user {
                    Some(user) if envelope.success => {
                        debug!(username = %user.username, "Profile refreshed");
                        self.set(SessionState::Authenticated, Some(user.clone())).await;
                        Ok(Some(user))
                    }
                    _ => {
                        warn!("Session no longer valid, logging out");
                        self.logout().await;
                        Err(ApiError::Unauthorized(
                            envelope
                                .message
                                .unwrap_or_else(|| "Session no longer valid".to_string()),
                        ))
                    }
                }
            }
            Err(ApiError::Unauthorized(message)) => {
                warn!("Token expired during refresh, logging out");
                self.logout().await;
                Err(ApiError::Unauthorized(message))
            }
            Err(e) => {
                // Keep the session over transient trouble
                warn!(error = %e, "Refresh failed, keeping session");
                self.set_state(SessionState::Authenticated).await;
                Err(e)
            }
        }
    }

    /// End the session: best-effort server notice, unconditional local wipe
    pub async fn logout(&self) {
        match self.executor.post_empty("/api/auth/logout").await {
            Ok(_) => debug!("Logout acknowledged by server"),
            Err(e) => warn!(error = %e, "Logout request failed, clearing local session anyway"),
        }
        self.teardown().await;
        info!("Logged out");
    }

    /// Shallow-merge updated profile fields into the stored user.
    ///
    /// Mirrors the server's partial update responses; a no-op when no
    /// user is loaded. Ignores merges that would leave the profile
    /// undecodable.
    pub async fn merge_user(&self, patch: &Value) -> Option<User> {
        let mut snapshot = self.snapshot.write().await;
        let current = snapshot.user.as_ref()?;

        let mut merged = match serde_json::to_value(current) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        };
        if let Value::Object(fields) = patch {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        }

        match serde_json::from_value::<User>(Value::Object(merged)) {
            Ok(user) => {
                snapshot.user = Some(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring profile patch that broke the user shape");
                snapshot.user.clone()
            }
        }
    }

    // ==================== Internals ====================

    async fn set(&self, state: SessionState, user: Option<User>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.state = state;
        snapshot.user = user;
    }

    async fn set_state(&self, state: SessionState) {
        self.snapshot.write().await.state = state;
    }

    /// Remove the token and drop to `Anonymous`
    async fn teardown(&self) {
        self.tokens.remove(TOKEN_KEY).await;
        self.set(SessionState::Anonymous, None).await;
    }
}
