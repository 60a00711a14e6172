//! Database layer (Firestore).

pub mod activity;
pub mod boards;
pub mod firestore;
pub mod invites;
pub mod tasks;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const BOARDS: &str = "boards";
    /// Subcollection of `boards/{id}`
    pub const TASKS: &str = "tasks";
    /// Subcollection of `boards/{id}/tasks/{id}`
    pub const COMMENTS: &str = "comments";
    pub const ACTIVITY: &str = "activity";
    pub const INVITES: &str = "invites";
}
