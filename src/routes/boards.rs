// SPDX-License-Identifier: MIT

//! Board routes: listing, detail, membership management and CSV export.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::display_name_from_email;
use crate::models::{Board, Comment, Invite, Membership, Role, Task};
use crate::services::notify::Notice;
use crate::services::{export, permissions};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/boards", get(list_owned_boards))
        .route("/api/boards", post(create_board))
        .route("/api/boards/shared", get(list_shared_boards))
        .route("/api/boards/{board_id}", get(board_detail))
        .route("/api/boards/{board_id}", put(update_board))
        .route("/api/boards/{board_id}", delete(delete_board))
        .route("/api/boards/{board_id}/members", post(add_member))
        .route(
            "/api/boards/{board_id}/members/{member_id}",
            delete(remove_member),
        )
        .route("/api/boards/{board_id}/leave", post(leave_board))
        .route("/api/boards/{board_id}/export.csv", get(export_board_tasks))
        .route("/api/boards/export.csv", get(export_owned_boards))
        .route("/api/boards/shared/export.csv", get(export_shared_boards))
}

/// Fetch a board or 404.
pub(crate) async fn load_board(state: &AppState, board_id: &str) -> Result<Board> {
    state
        .db
        .get_board(board_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))
}

async fn list_owned_boards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Board>>> {
    Ok(Json(state.db.boards_owned_by(&user.uid).await?))
}

async fn list_shared_boards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Board>>> {
    Ok(Json(
        state.db.boards_shared_with(&user.uid, &user.email).await?,
    ))
}

#[derive(Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 100, message = "Board name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: String,
}

async fn create_board(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<Json<Board>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let board = Board {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        description: payload.description,
        created_by: user.uid.clone(),
        creator_name: user.display_name.clone(),
        created_at: now_rfc3339(),
        task_count: 0,
        completed_task_count: 0,
        users: vec![Membership {
            uid: Some(user.uid.clone()),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: Role::Owner,
        }],
    };

    state.db.create_board(&board).await?;
    state.activity.record(
        format!("Created board \"{}\"", board.name),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(board))
}

/// A task together with its comment thread, as shown on the board page.
#[derive(Serialize)]
pub struct TaskWithComments {
    #[serde(flatten)]
    pub task: Task,
    pub comments: Vec<Comment>,
}

/// Whether each member has completed registration (placeholder memberships
/// have no uid yet).
#[derive(Serialize)]
pub struct MemberStatus {
    pub email: String,
    pub registered: bool,
}

#[derive(Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub tasks: Vec<TaskWithComments>,
    /// Count of the tasks the caller may see; `task_count` on the board is
    /// the total.
    pub visible_task_count: u32,
    pub member_status: Vec<MemberStatus>,
    /// Whether the board creator's account still exists.
    pub creator_status: CreatorStatus,
    pub current_user_role: Role,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatorStatus {
    Active,
    Deleted,
    Unknown,
}

/// Board detail: the board, the tasks the caller may see, and each task's
/// comments.
async fn board_detail(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<Json<BoardDetail>> {
    let board = load_board(&state, &board_id).await?;

    let Some(membership) = permissions::membership_of(&board, &user) else {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    };
    let role = membership.role;

    let all_tasks = state.db.tasks_for_board(&board.id).await?;
    let visible = permissions::visible_tasks(&board, all_tasks, &user);

    let mut tasks = Vec::with_capacity(visible.len());
    for task in visible {
        let comments = state.db.comments_for_task(&board.id, &task.id).await?;
        tasks.push(TaskWithComments { task, comments });
    }

    let member_status = board
        .users
        .iter()
        .map(|m| MemberStatus {
            email: m.email.clone(),
            registered: m.uid.is_some(),
        })
        .collect();

    // Best-effort: the board stays readable when the identity provider
    // cannot be reached.
    let creator_status = match state.directory.get_user_by_id(&board.created_by).await {
        Ok(Some(_)) => CreatorStatus::Active,
        Ok(None) => CreatorStatus::Deleted,
        Err(e) => {
            tracing::warn!(error = %e, board_id = %board.id, "Creator lookup failed");
            CreatorStatus::Unknown
        }
    };

    let visible_task_count = tasks.len() as u32;
    Ok(Json(BoardDetail {
        board,
        tasks,
        visible_task_count,
        member_status,
        creator_status,
        current_user_role: role,
    }))
}

#[derive(Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 100, message = "Board name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: String,
}

/// Update a board's name and description. Any member may edit the info;
/// membership and counters are managed through their own endpoints.
async fn update_board(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(payload): Json<UpdateBoardRequest>,
) -> Result<Json<Board>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut board = load_board(&state, &board_id).await?;
    if !permissions::is_member(&board, &user) {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    }

    board.name = payload.name;
    board.description = payload.description;
    state.db.update_board(&board).await?;

    state.activity.record(
        format!("Updated board \"{}\"", board.name),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(board))
}

/// Delete a board and everything under it. Owner only.
async fn delete_board(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let board = load_board(&state, &board_id).await?;
    if !permissions::can_delete_board(&board, &user) {
        return Err(AppError::Forbidden(
            "Only the board owner can delete the board".to_string(),
        ));
    }

    state.lifecycle.delete_board_cascade(&board).await?;

    state
        .activity
        .record(format!("Deleted board \"{}\"", board.name), &user, None);

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

#[derive(Deserialize, Validate)]
pub struct MemberRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

/// Add a member by email. If no account exists for the email yet, a
/// placeholder membership and a pending invite are created; the membership
/// binds to the real account when the user registers.
async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(payload): Json<MemberRequest>,
) -> Result<Json<Board>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let board = load_board(&state, &board_id).await?;
    if !permissions::can_manage_members(&board, &user) {
        return Err(AppError::Forbidden(
            "Only the board owner can manage members".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if board.users.iter().any(|m| m.email == email) {
        return Err(AppError::BadRequest(format!(
            "{} is already a member of this board",
            email
        )));
    }

    let (membership, notice) = match state.directory.get_user_by_email(&email).await? {
        Some(record) => (
            Membership {
                uid: Some(record.uid.clone()),
                email: record.email.clone(),
                display_name: record.display_name_or_fallback(),
                role: Role::Member,
            },
            Notice::AddedToBoard {
                board_name: board.name.clone(),
            },
        ),
        None => (
            Membership {
                uid: None,
                email: email.clone(),
                display_name: display_name_from_email(&email),
                role: Role::Member,
            },
            Notice::InvitedToBoard {
                board_name: board.name.clone(),
            },
        ),
    };
    let invited = membership.uid.is_none();

    let updated = state
        .db
        .mutate_board_members(&board.id, move |members| {
            if members.iter().any(|m| m.email == membership.email) {
                return false;
            }
            members.push(membership.clone());
            true
        })
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;

    if invited {
        let invite = Invite {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            board_id: board.id.clone(),
            accepted: false,
        };
        state.db.create_invite(&invite).await?;
    }

    state.mailer.notify(&email, notice);
    state.activity.record(
        format!("Added {} to board \"{}\"", email, board.name),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(updated))
}

/// Remove a member. The path segment identifies the member by uid, or by
/// email for placeholder memberships that have no uid yet. The owner
/// membership is never removable.
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, member_id)): Path<(String, String)>,
) -> Result<Json<Board>> {
    let board = load_board(&state, &board_id).await?;
    if !permissions::can_manage_members(&board, &user) {
        return Err(AppError::Forbidden(
            "Only the board owner can manage members".to_string(),
        ));
    }

    let Some(member) = board
        .users
        .iter()
        .find(|m| m.uid.as_deref() == Some(member_id.as_str()) || m.email == member_id)
    else {
        return Err(AppError::NotFound(
            "No such member on this board".to_string(),
        ));
    };
    if !permissions::is_removable(member) {
        return Err(AppError::BadRequest(
            "The board owner cannot be removed".to_string(),
        ));
    }
    let removed_uid = member.uid.clone();
    let email = member.email.clone();

    let member_email = email.clone();
    let updated = state
        .db
        .mutate_board_members(&board.id, move |members| {
            let before = members.len();
            members.retain(|m| !(m.email == member_email && m.role != Role::Owner));
            members.len() != before
        })
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;

    unassign_member_tasks(&state, &board.id, removed_uid.as_deref(), &email).await?;

    state.mailer.notify(
        &email,
        Notice::RemovedFromBoard {
            board_name: board.name.clone(),
        },
    );
    state.activity.record(
        format!("Removed {} from board \"{}\"", email, board.name),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(updated))
}

/// Leave a board. The owner cannot leave without dissolving the board, so
/// an owner leaving deletes the board outright.
async fn leave_board(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let board = load_board(&state, &board_id).await?;
    if !permissions::is_member(&board, &user) {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    }

    if permissions::is_board_owner(&board, &user) {
        state.lifecycle.delete_board_cascade(&board).await?;
        state
            .activity
            .record(format!("Deleted board \"{}\"", board.name), &user, None);
        return Ok(Json(serde_json::json!({ "status": "board_deleted" })));
    }

    let uid = user.uid.clone();
    let email = user.email.clone();
    state
        .db
        .mutate_board_members(&board.id, move |members| {
            let before = members.len();
            members.retain(|m| !m.matches(&uid, &email));
            members.len() != before
        })
        .await?;

    unassign_member_tasks(&state, &board.id, Some(&user.uid), &user.email).await?;

    state.activity.record(
        format!("Left board \"{}\"", board.name),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(serde_json::json!({ "status": "left" })))
}

/// Drop a user from every assignee list on a board.
async fn unassign_member_tasks(
    state: &AppState,
    board_id: &str,
    uid: Option<&str>,
    email: &str,
) -> Result<()> {
    let uid = uid.unwrap_or("");
    for mut task in state.db.tasks_for_board(board_id).await? {
        if task.is_assigned_to(uid, email) {
            task.assigned_to.retain(|m| !m.matches(uid, email));
            state.db.update_task(board_id, &task).await?;
        }
    }
    Ok(())
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

/// Export a board's tasks as CSV. Members see only their visible tasks.
async fn export_board_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse> {
    let board = load_board(&state, &board_id).await?;
    if !permissions::is_member(&board, &user) {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    }

    let all_tasks = state.db.tasks_for_board(&board.id).await?;
    let visible = permissions::visible_tasks(&board, all_tasks, &user);
    let csv = export::tasks_csv(&visible)?;

    Ok(csv_response(&format!("{}_tasks.csv", board.id), csv))
}

/// Export the caller's owned boards as CSV.
async fn export_owned_boards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let boards = state.db.boards_owned_by(&user.uid).await?;
    let csv = export::boards_csv(&boards)?;
    Ok(csv_response("boards.csv", csv))
}

/// Export the boards shared with the caller as CSV.
async fn export_shared_boards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let boards = state.db.boards_shared_with(&user.uid, &user.email).await?;
    let csv = export::boards_csv(&boards)?;
    Ok(csv_response("shared_boards.csv", csv))
}
