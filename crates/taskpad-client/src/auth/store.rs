/*
[INPUT]:  Access tokens and identity records from auth endpoints
[OUTPUT]: Session snapshots and derived authentication status
[POS]:    Auth layer - single source of truth for session state
[UPDATE]: When adding session fields or changing storage strategy
*/

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::UserIdentity;

/// Snapshot of the client-side session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Empty when signed out
    pub access_token: String,
    pub user: Option<UserIdentity>,
    /// When the current token was stored
    pub token_set_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Thread-safe in-memory session store
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    data: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new access token
    pub fn set_token(&self, token: String) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.access_token = token;
        guard.token_set_at = Some(Utc::now());
    }

    pub fn set_user(&self, user: Option<UserIdentity>) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.user = user;
    }

    /// Get the current token if available
    pub fn token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Some(guard.access_token.clone()).filter(|token| !token.is_empty())
    }

    pub fn user(&self) -> Option<UserIdentity> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.is_authenticated()
    }

    pub fn snapshot(&self) -> Session {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear token and identity
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Session::default();
    }
}
