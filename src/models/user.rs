//! Identity provider user record and board invites.

use serde::{Deserialize, Serialize};

/// User record as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl DirectoryUser {
    /// Display name with fallback: display name, then the local part of the
    /// email, then the full email.
    pub fn display_name_or_fallback(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => display_name_from_email(&self.email),
        }
    }
}

/// Local part of an email address, falling back to the whole address.
pub fn display_name_from_email(email: &str) -> String {
    email
        .split_once('@')
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| email.to_string())
}

/// Pending board invite for an email address, consumed at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: String,
    pub email: String,
    pub board_id: String,
    #[serde(default)]
    pub accepted: bool,
}
