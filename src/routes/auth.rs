// SPDX-License-Identifier: MIT

//! Registration, login and profile routes.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::DirectoryUser;
use crate::services::notify::Notice;
use crate::time_utils::parse_stored_timestamp;
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile", put(update_profile))
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
}

impl From<&AuthUser> for SessionUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &AuthUser,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let token = create_jwt(user, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let response = AuthResponse {
        token: token.clone(),
        user: user.into(),
    };
    Ok((jar.add(session_cookie(&token)), Json(response)))
}

/// Register a new account.
///
/// Besides creating the identity record, registration binds any pre-existing
/// email-only records (placeholder memberships, task assignments, invites)
/// to the new uid.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();

    let created = state.directory.create_user(&email, &payload.password).await?;
    state
        .directory
        .update_user(&created.uid, Some(&payload.display_name), None)
        .await?;

    let user = AuthUser {
        uid: created.uid,
        email,
        display_name: payload.display_name,
        is_admin: false,
    };

    bind_and_consume(&state, &user).await;

    state.mailer.notify(&user.email, Notice::Welcome);
    state.activity.record("Registered an account".to_string(), &user, None);

    tracing::info!(uid = %user.uid, email = %user.email, "User registered");
    start_session(&state, jar, &user)
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();

    let Some(uid) = state.directory.verify_password(&email, &payload.password).await? else {
        return Err(AppError::Unauthorized);
    };

    let record = state
        .directory
        .get_user_by_id(&uid)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if record.disabled {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    let user = AuthUser {
        uid,
        email: record.email.clone(),
        display_name: record.display_name_or_fallback(),
        is_admin: record.is_admin,
    };

    // Records created while the user was logged out get claimed here.
    bind_and_consume(&state, &user).await;

    state.activity.record("Logged in".to_string(), &user, None);

    tracing::info!(uid = %user.uid, "User logged in");
    start_session(&state, jar, &user)
}

/// Log out: clear the session cookie. The JWT itself is stateless and simply
/// expires.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    (jar, Json(serde_json::json!({ "status": "logged_out" })))
}

/// A task the user is involved in (created or assigned), annotated with its
/// board for the profile view.
#[derive(Serialize)]
pub struct InvolvedTask {
    pub board_id: String,
    pub board_name: String,
    #[serde(flatten)]
    pub task: crate::models::Task,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: SessionUser,
    pub boards: Vec<crate::models::Board>,
    pub tasks: Vec<InvolvedTask>,
}

/// Current profile, refreshed from the identity provider, with the user's
/// boards and involved tasks (newest first).
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let record = state
        .directory
        .get_user_by_id(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;

    let mut boards = state.db.boards_owned_by(&user.uid).await?;
    boards.extend(state.db.boards_shared_with(&user.uid, &user.email).await?);

    let mut tasks = Vec::new();
    for board in &boards {
        for task in state.db.tasks_for_board(&board.id).await? {
            if task.created_by == user.uid || task.is_assigned_to(&user.uid, &user.email) {
                tasks.push(InvolvedTask {
                    board_id: board.id.clone(),
                    board_name: board.name.clone(),
                    task,
                });
            }
        }
    }
    tasks.sort_by(|a, b| {
        let at = parse_stored_timestamp(&a.task.updated_at);
        let bt = parse_stored_timestamp(&b.task.updated_at);
        bt.cmp(&at)
    });

    Ok(Json(ProfileResponse {
        user: session_user(&record),
        boards,
        tasks,
    }))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
}

/// Update the display name, then reissue the session so the token carries
/// the new name.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .directory
        .update_user(&user.uid, Some(&payload.display_name), None)
        .await?;

    let updated = AuthUser {
        display_name: payload.display_name,
        ..user.clone()
    };
    state
        .activity
        .record("Updated profile".to_string(), &updated, None);

    start_session(&state, jar, &updated)
}

fn session_user(record: &DirectoryUser) -> SessionUser {
    SessionUser {
        uid: record.uid.clone(),
        email: record.email.clone(),
        display_name: record.display_name_or_fallback(),
        is_admin: record.is_admin,
    }
}

/// Run the late-binding scans and invite consumption for a user. Both are
/// best-effort at the auth boundary: a failed scan must not block the login.
async fn bind_and_consume(state: &AppState, user: &AuthUser) {
    if let Err(e) = state
        .lifecycle
        .bind_email_records(&user.uid, &user.email, &user.display_name)
        .await
    {
        tracing::error!(error = %e, uid = %user.uid, "Late-binding scan failed");
    }
    if let Err(e) = state
        .lifecycle
        .consume_invites(&user.uid, &user.email, &user.display_name)
        .await
    {
        tracing::error!(error = %e, uid = %user.uid, "Invite consumption failed");
    }
}
