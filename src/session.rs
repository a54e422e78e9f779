//! Authenticated session threaded through every backend call.

use crate::domain::id::WireId;
use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the logged-in user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

/// User record returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: WireId,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
}

/// Username/password login form
#[derive(Clone, Serialize)]
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

/// Profile data forwarded after a Google sign-in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Bearer token plus the user it belongs to.
///
/// Immutable once built; logging out means dropping it.
#[derive(Clone)]
pub struct Session {
    token: String,
    user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty() && !self.user.id.as_str().is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.user.user_type == UserType::Admin
    }

    /// Fails with `Forbidden` unless the session belongs to an admin
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(BoardError::Forbidden(format!(
                "{} requires an admin account",
                action
            )))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.token.chars().take(8).collect();
        f.debug_struct("Session")
            .field("token", &format!("{}...", preview))
            .field("user", &self.user)
            .finish()
    }
}
