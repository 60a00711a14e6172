// SPDX-License-Identifier: MIT

//! Admin routes: user directory management.
//!
//! Admin status comes from the identity provider's custom claims and rides
//! in the session token; every handler here re-checks it.

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::DirectoryUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{uid}", put(update_user))
        .route("/api/admin/users/{uid}", delete(delete_user))
}

/// Provider pages are capped; this bounds the pagination loop for a
/// runaway token.
const MAX_PAGES: usize = 50;

fn require_admin(user: &AuthUser) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// List every account, following provider pagination.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<DirectoryUser>>> {
    require_admin(&user)?;

    let mut users = Vec::new();
    let mut page_token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let (page, next) = state.directory.list_users(page_token.as_deref()).await?;
        users.extend(page);
        match next {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(Json(users))
}

#[derive(Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must not be empty"))]
    pub display_name: Option<String>,
    pub disabled: Option<bool>,
}

/// Update another user's display name or disabled flag.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<DirectoryUser>> {
    require_admin(&user)?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if uid == user.uid && payload.disabled == Some(true) {
        return Err(AppError::BadRequest(
            "You cannot disable your own account".to_string(),
        ));
    }

    state
        .directory
        .update_user(&uid, payload.display_name.as_deref(), payload.disabled)
        .await?;

    let updated = state
        .directory
        .get_user_by_id(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(admin = %user.uid, target = %uid, "Admin updated user");
    Ok(Json(updated))
}

/// Delete another user's account with the full data cascade, exactly as if
/// they had deleted it themselves.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<serde_json::Value>> {
    require_admin(&user)?;

    if uid == user.uid {
        return Err(AppError::BadRequest(
            "Use account deletion to delete your own account".to_string(),
        ));
    }

    let target = state
        .directory
        .get_user_by_id(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let target_user = AuthUser {
        uid: target.uid.clone(),
        email: target.email.clone(),
        display_name: target.display_name_or_fallback(),
        is_admin: target.is_admin,
    };
    state.lifecycle.delete_account(&target_user).await?;

    tracing::info!(admin = %user.uid, target = %uid, "Admin deleted user");
    Ok(Json(serde_json::json!({ "status": "account_deleted" })))
}
