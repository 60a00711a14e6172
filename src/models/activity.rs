// SPDX-License-Identifier: MIT

//! Activity log model.

use serde::{Deserialize, Serialize};

/// Append-only activity record in the flat `activity` collection.
///
/// Deleted only as part of account deletion for the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub description: String,
    pub user_id: String,
    pub user_email: String,
    /// Event time. Stored as a string because historical records carry a
    /// mix of formats; see `time_utils::parse_stored_timestamp`.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,
}
