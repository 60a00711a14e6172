// SPDX-License-Identifier: MIT

//! Board and membership models for storage and API.

use serde::{Deserialize, Serialize};

/// A member's role on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

/// A board's record associating a user with a role.
///
/// `uid` is None for pre-registration placeholders: the user was invited by
/// email before they had an account. The uid is back-filled when they
/// register or log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub uid: Option<String>,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl Membership {
    /// True if this membership matches the given uid or email.
    pub fn matches(&self, uid: &str, email: &str) -> bool {
        self.uid.as_deref() == Some(uid) || self.email == email
    }
}

/// Board document stored in Firestore.
///
/// `task_count` and `completed_task_count` are denormalized aggregates,
/// recomputed from the task subcollection after every task mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Document ID (client-generated UUID)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Immutable owner reference (uid)
    pub created_by: String,
    pub creator_name: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    #[serde(default)]
    pub task_count: u32,
    #[serde(default)]
    pub completed_task_count: u32,
    #[serde(default)]
    pub users: Vec<Membership>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
    }

    #[test]
    fn test_membership_matches_by_uid_or_email() {
        let member = Membership {
            uid: Some("u1".to_string()),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            role: Role::Member,
        };
        assert!(member.matches("u1", "other@example.com"));
        assert!(member.matches("other", "alice@example.com"));
        assert!(!member.matches("other", "other@example.com"));
    }

    #[test]
    fn test_placeholder_membership_matches_by_email_only() {
        let placeholder = Membership {
            uid: None,
            email: "carol@example.com".to_string(),
            display_name: "carol".to_string(),
            role: Role::Member,
        };
        assert!(placeholder.matches("any-uid", "carol@example.com"));
        assert!(!placeholder.matches("any-uid", "bob@example.com"));
    }
}
