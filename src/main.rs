// SPDX-License-Identifier: MIT

//! Boardstack API Server
//!
//! Multi-user task board backend: boards, tasks, comments, memberships and
//! activity history on top of Firestore and an external identity provider.

use boardstack::{
    config::Config,
    db::FirestoreDb,
    services::{ActivityService, Directory, LifecycleService, Mailer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Boardstack API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Identity provider adapter
    let directory = Directory::new(&config);
    tracing::info!(url = %config.identity_api_url, "Identity directory initialized");

    // Outbound email (disabled when SMTP is not configured)
    let mailer = Mailer::from_config(&config);
    if mailer.is_enabled() {
        tracing::info!("SMTP mailer initialized");
    } else {
        tracing::warn!("SMTP not configured, outbound email disabled");
    }

    let activity = ActivityService::new(db.clone());
    let lifecycle = LifecycleService::new(db.clone(), directory.clone(), mailer.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        directory,
        mailer,
        activity,
        lifecycle,
    });

    // Build router
    let app = boardstack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("boardstack=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
