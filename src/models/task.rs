// SPDX-License-Identifier: MIT

//! Task and comment models for storage and API.

use crate::models::Membership;
use serde::{Deserialize, Deserializer, Serialize};

/// Task document stored under `boards/{id}/tasks`.
///
/// `assigned_to` entries are denormalized membership snapshots taken at
/// assignment time, not live references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Document ID (client-generated UUID)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
    pub created_by: String,
    pub creator_name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub assigned_to: Vec<Membership>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updater_name: Option<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// Older documents stored a single assignee object instead of a list.
/// Normalize both shapes to a vector at the store boundary so policy code
/// only ever sees a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Membership>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Membership>),
        One(Membership),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(list)) => list,
        Some(OneOrMany::One(single)) => vec![single],
    })
}

impl Task {
    /// True if the given user appears in the assignee list by uid or email.
    pub fn is_assigned_to(&self, uid: &str, email: &str) -> bool {
        self.assigned_to.iter().any(|m| m.matches(uid, email))
    }
}

/// Comment stored under `boards/{id}/tasks/{id}/comments`. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_by: String,
    pub creator_name: String,
    pub creator_email: String,
    pub created_at: String,
}
