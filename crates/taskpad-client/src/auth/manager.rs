/*
[INPUT]:  Task client, user credentials, client event bus
[OUTPUT]: Session lifecycle (login/register/logout/refresh) and auto-refresh
[POS]:    Auth layer - owns the access token and keeps the transport in sync
[UPDATE]: When auth endpoints, refresh cadence, or teardown rules change
*/

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use reqwest::Method;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::ClientEvent;
use crate::http::{RequestContext, Result, TaskpadClient, TaskpadError};
use crate::types::{LoginRequest, RegisterRequest, TokenResponse, UserIdentity};

use super::store::{Session, SessionStore};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a session operation, with a human-readable reason on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl AuthOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Owns the session and its refresh schedule.
///
/// Must be created inside a Tokio runtime: construction spawns the listener
/// that mirrors transport-level forced logouts into local state. Clones share
/// the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: TaskpadClient,
    store: SessionStore,
    refresh_interval: Duration,
    auto_refresh: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new(client: TaskpadClient) -> Self {
        let inner = Arc::new(SessionInner {
            refresh_interval: client.config().refresh_interval,
            store: SessionStore::new(),
            auto_refresh: Mutex::new(None),
            shutdown: CancellationToken::new(),
            client,
        });

        spawn_event_listener(
            Arc::downgrade(&inner),
            inner.client.events().subscribe(),
            inner.shutdown.clone(),
        );

        Self { inner }
    }

    pub fn client(&self) -> &TaskpadClient {
        &self.inner.client
    }

    pub fn snapshot(&self) -> Session {
        self.inner.store.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.is_authenticated()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.inner.store.user()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.store.token()
    }

    /// Whether a refresh timer is currently scheduled
    pub fn auto_refresh_armed(&self) -> bool {
        let guard = self
            .inner
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return AuthOutcome::failed("Email and password are required");
        }

        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.inner.token_request("/api/auth/login", &body).await {
            Ok(token) => {
                self.inner.apply_token(token);
                self.inner.store.set_user(Some(UserIdentity::new(email)));
                info!("login succeeded");
                AuthOutcome::ok()
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                AuthOutcome::failed(failure_reason(&err, "Login failed"))
            }
        }
    }

    /// POST /api/auth/register
    ///
    /// The endpoint does not echo a profile, so identity comes from the
    /// submitted fields.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return AuthOutcome::failed("Email and password are required");
        }

        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.inner.token_request("/api/auth/register", &body).await {
            Ok(token) => {
                self.inner.apply_token(token);
                self.inner
                    .store
                    .set_user(Some(UserIdentity::new(email).with_name(name)));
                info!("registration succeeded");
                AuthOutcome::ok()
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                AuthOutcome::failed(failure_reason(&err, "Registration failed"))
            }
        }
    }

    /// POST /api/auth/logout
    ///
    /// The backend call is best-effort; local state is always cleared.
    pub async fn logout(&self) -> AuthOutcome {
        let result = async {
            let builder = self.inner.client.request(Method::POST, "/api/auth/logout")?;
            self.inner
                .client
                .send_empty(builder, RequestContext::without_refresh())
                .await
        }
        .await;

        self.inner.clear_local();

        match result {
            Ok(()) => info!("logged out"),
            Err(err) => warn!(error = %err, "logout request failed; local session cleared anyway"),
        }
        AuthOutcome::ok()
    }

    /// POST /api/auth/refresh
    ///
    /// On failure the session is torn down and a forced logout is broadcast.
    pub async fn refresh(&self) -> AuthOutcome {
        self.inner.refresh().await
    }

    /// Tear down background work: the refresh timer and the event listener.
    ///
    /// Session state is left untouched; no timer is armed afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.disarm_auto_refresh();
        debug!("session manager shut down");
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .field("user", &self.user())
            .field("auto_refresh_armed", &self.auto_refresh_armed())
            .finish()
    }
}

impl SessionInner {
    async fn token_request<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> Result<String> {
        let builder = self.client.request(Method::POST, endpoint)?.json(body);
        let response: TokenResponse = self
            .client
            .send_json(builder, RequestContext::without_refresh())
            .await?;
        if response.access_token.is_empty() {
            return Err(TaskpadError::InvalidResponse(
                "auth endpoint returned an empty access token".to_string(),
            ));
        }
        Ok(response.access_token)
    }

    async fn refresh(self: &Arc<Self>) -> AuthOutcome {
        match self.client.refresher().refresh().await {
            Ok(token) => {
                self.apply_token(token);
                debug!("access token refreshed");
                AuthOutcome::ok()
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; clearing session");
                self.clear_local();
                self.client.events().forced_logout();
                AuthOutcome::failed(TaskpadError::SessionExpired.to_string())
            }
        }
    }

    /// Store the token, sync the transport copy and re-arm the timer.
    fn apply_token(self: &Arc<Self>, token: String) {
        self.store.set_token(token.clone());
        self.client.set_access_token(Some(token));
        self.arm_auto_refresh();
    }

    fn clear_local(&self) {
        self.store.clear();
        self.client.set_access_token(None);
        self.disarm_auto_refresh();
    }

    fn arm_auto_refresh(self: &Arc<Self>) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let cancel = self.shutdown.child_token();
        {
            let mut guard = self.auto_refresh.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = guard.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        let weak = Arc::downgrade(self);
        let interval = self.refresh_interval.max(MIN_REFRESH_INTERVAL);
        // Anchored at arm time, not at the task's first poll.
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(inner) = weak.upgrade() else { break };
                debug!(interval_secs = interval.as_secs(), "auto-refresh timer fired");
                inner.refresh().await;

                // A successful refresh re-arms a new timer and a failed one
                // clears the session; both cancel this one.
                if cancel.is_cancelled() {
                    break;
                }
            }
        });
    }

    fn disarm_auto_refresh(&self) {
        let mut guard = self.auto_refresh.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = guard.take() {
            token.cancel();
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn spawn_event_listener(
    weak: Weak<SessionInner>,
    mut events: broadcast::Receiver<ClientEvent>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Ok(ClientEvent::ForcedLogout) => {
                    let Some(inner) = weak.upgrade() else { break };
                    inner.clear_local();
                    info!("session cleared after forced logout");
                }
                Ok(ClientEvent::TokenRotated { access_token }) => {
                    let Some(inner) = weak.upgrade() else { break };
                    // A rotation queued before a logout must not revive the session.
                    if inner.client.access_token().as_deref() != Some(access_token.as_str()) {
                        debug!("ignoring stale token rotation");
                        continue;
                    }
                    inner.apply_token(access_token);
                    debug!("adopted token rotated by transport");
                }
                Ok(ClientEvent::Notice { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session listener lagged behind client events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Backend `message` when present, otherwise `fallback`.
fn failure_reason(err: &TaskpadError, fallback: &str) -> String {
    err.server_message()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
