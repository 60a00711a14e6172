// SPDX-License-Identifier: MIT

use boardstack::config::Config;
use boardstack::db::FirestoreDb;
use boardstack::middleware::auth::{create_jwt, AuthUser};
use boardstack::routes::create_router;
use boardstack::services::{ActivityService, Directory, LifecycleService, Mailer};
use boardstack::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let directory = Directory::new_mock();
    let mailer = Mailer::disabled();
    let activity = ActivityService::new(db.clone());
    let lifecycle = LifecycleService::new(db.clone(), directory.clone(), mailer.clone());

    let state = Arc::new(AppState {
        config,
        db,
        directory,
        mailer,
        activity,
        lifecycle,
    });

    (create_router(state.clone()), state)
}

/// A signed session token for a regular test user.
#[allow(dead_code)]
pub fn test_token(state: &AppState) -> String {
    token_for(state, false)
}

/// A signed session token carrying the admin claim.
#[allow(dead_code)]
pub fn admin_token(state: &AppState) -> String {
    token_for(state, true)
}

#[allow(dead_code)]
fn token_for(state: &AppState, is_admin: bool) -> String {
    let user = AuthUser {
        uid: "test-uid".to_string(),
        email: "tester@example.com".to_string(),
        display_name: "Tester".to_string(),
        is_admin,
    };
    create_jwt(&user, &state.config.jwt_signing_key).expect("Failed to sign test JWT")
}
