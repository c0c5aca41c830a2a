//! Credentials and authenticated sessions
//!
//! A `Session` is produced by `DeviceGateway::login` and passed explicitly to
//! every later call. It starts valid and becomes invalid for good once any
//! call sees an authorization failure; the next pass logs in again.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Login credentials for the remote service
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer-token session
pub struct Session {
    token: String,
    issued_at: DateTime<Utc>,
    valid: AtomicBool,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Utc::now(),
            valid: AtomicBool::new(true),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Mark the session unusable after an authorization failure
    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            tracing::warn!("Session invalidated by authorization failure");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("valid", &self.is_valid())
            .finish()
    }
}
