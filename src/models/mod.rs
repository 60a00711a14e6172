// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod board;
pub mod task;
pub mod user;

pub use activity::Activity;
pub use board::{Board, Membership, Role};
pub use task::{Comment, Task};
pub use user::{DirectoryUser, Invite};
