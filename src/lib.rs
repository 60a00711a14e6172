// SPDX-License-Identifier: MIT

//! Boardstack: multi-user task board backend.
//!
//! This crate provides the JSON API for managing boards, tasks, comments
//! and board memberships on top of Firestore, with accounts handled by an
//! external identity provider.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ActivityService, Directory, LifecycleService, Mailer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub directory: Directory,
    pub mailer: Mailer,
    pub activity: ActivityService,
    pub lifecycle: LifecycleService,
}
