// SPDX-License-Identifier: MIT

//! Task and comment routes.
//!
//! Write access is scoped per task: the task creator and the board owner
//! get full edits, every other member may only change the completion flag.
//! A narrowed submission is not rejected; the disallowed fields are simply
//! discarded.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Board, Comment, Membership, Task};
use crate::routes::boards::load_board;
use crate::services::notify::Notice;
use crate::services::permissions::{self, EditScope};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/boards/{board_id}/tasks", post(create_task))
        .route("/api/boards/{board_id}/tasks/{task_id}", put(update_task))
        .route("/api/boards/{board_id}/tasks/{task_id}", delete(delete_task))
        .route(
            "/api/boards/{board_id}/tasks/{task_id}/toggle",
            post(toggle_task),
        )
        .route(
            "/api/boards/{board_id}/tasks/{task_id}/comments",
            get(list_comments),
        )
        .route(
            "/api/boards/{board_id}/tasks/{task_id}/comments",
            post(add_comment),
        )
}

const PRIORITIES: [&str; 3] = ["low", "medium", "high"];

async fn load_task(state: &AppState, board_id: &str, task_id: &str) -> Result<Task> {
    state
        .db
        .get_task(board_id, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

/// Resolve assignee emails against the board's membership list, producing
/// denormalized membership snapshots.
fn resolve_assignees(board: &Board, emails: &[String]) -> Result<Vec<Membership>> {
    let mut assignees = Vec::with_capacity(emails.len());
    for raw in emails {
        let email = raw.trim().to_lowercase();
        let member = board
            .users
            .iter()
            .find(|m| m.email == email)
            .ok_or_else(|| {
                AppError::BadRequest(format!("{} is not a member of this board", email))
            })?;
        if !assignees.iter().any(|m: &Membership| m.email == email) {
            assignees.push(member.clone());
        }
    }
    Ok(assignees)
}

/// Emails present in `after` but not in `before`.
fn assignment_diff(before: &[Membership], after: &[Membership]) -> Vec<String> {
    after
        .iter()
        .filter(|m| !before.iter().any(|b| b.email == m.email))
        .map(|m| m.email.clone())
        .collect()
}

fn notify_assignment_changes(
    state: &AppState,
    board: &Board,
    actor: &AuthUser,
    before: &[Membership],
    after: &[Membership],
) {
    for email in assignment_diff(before, after) {
        if email != actor.email {
            state.mailer.notify(
                &email,
                Notice::TaskAssigned {
                    board_name: board.name.clone(),
                },
            );
        }
    }
    for email in assignment_diff(after, before) {
        if email != actor.email {
            state.mailer.notify(
                &email,
                Notice::TaskUnassigned {
                    board_name: board.name.clone(),
                },
            );
        }
    }
}

/// Tell the board owner when someone else completes a task on their board.
fn notify_owner_of_completion(state: &AppState, board: &Board, actor: &AuthUser, task: &Task) {
    if permissions::is_board_owner(board, actor) {
        return;
    }
    let Some(owner) = board.users.iter().find(|m| m.role == crate::models::Role::Owner) else {
        return;
    };
    state.mailer.notify(
        &owner.email,
        Notice::TaskCompleted {
            board_name: board.name.clone(),
            task_title: task.title.clone(),
        },
    );
}

#[derive(Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Task title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub assigned_to: Vec<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<Task>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !PRIORITIES.contains(&payload.priority.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Priority must be one of: {}",
            PRIORITIES.join(", ")
        )));
    }

    let board = load_board(&state, &board_id).await?;
    if !permissions::is_member(&board, &user) {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    }

    let assigned_to = resolve_assignees(&board, &payload.assigned_to)?;
    let now = now_rfc3339();
    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        description: payload.description,
        due_date: payload.due_date,
        priority: payload.priority,
        completed: false,
        created_by: user.uid.clone(),
        creator_name: user.display_name.clone(),
        assigned_to,
        created_at: now.clone(),
        updated_at: now,
        updated_by: None,
        updater_name: None,
    };

    state.db.add_task(&board.id, &task).await?;

    notify_assignment_changes(&state, &board, &user, &[], &task.assigned_to);
    state.activity.record(
        format!("Created task \"{}\"", task.title),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(task))
}

#[derive(Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Task title is required"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
    pub assigned_to: Option<Vec<String>>,
}

/// Apply an update submission to a task within the caller's edit scope.
///
/// A narrowed scope does not reject the submission; everything except the
/// completion flag is silently discarded. Resolved assignees are only
/// passed for full-scope edits.
fn apply_task_update(
    task: &mut Task,
    payload: UpdateTaskRequest,
    assignees: Option<Vec<Membership>>,
    scope: EditScope,
) {
    if scope == EditScope::Full {
        if let Some(title) = payload.title {
            task.title = title;
        }
        if let Some(description) = payload.description {
            task.description = description;
        }
        if let Some(due_date) = payload.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = payload.priority {
            task.priority = priority;
        }
        if let Some(assignees) = assignees {
            task.assigned_to = assignees;
        }
    }
    if let Some(completed) = payload.completed {
        task.completed = completed;
    }
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, task_id)): Path<(String, String)>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if let Some(priority) = &payload.priority {
        if !PRIORITIES.contains(&priority.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Priority must be one of: {}",
                PRIORITIES.join(", ")
            )));
        }
    }

    let board = load_board(&state, &board_id).await?;
    let mut task = load_task(&state, &board_id, &task_id).await?;

    let Some(scope) = permissions::task_edit_scope(&board, &task, &user) else {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    };

    let before_assignees = task.assigned_to.clone();
    let was_completed = task.completed;

    let assignees = match (&scope, &payload.assigned_to) {
        (EditScope::Full, Some(emails)) => Some(resolve_assignees(&board, emails)?),
        _ => None,
    };
    apply_task_update(&mut task, payload, assignees, scope);

    task.updated_at = now_rfc3339();
    task.updated_by = Some(user.uid.clone());
    task.updater_name = Some(user.display_name.clone());

    state.db.update_task(&board.id, &task).await?;

    notify_assignment_changes(&state, &board, &user, &before_assignees, &task.assigned_to);
    if !was_completed && task.completed {
        notify_owner_of_completion(&state, &board, &user, &task);
    }

    state.activity.record(
        format!("Updated task \"{}\"", task.title),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(task))
}

/// Flip a task's completion flag. Any board member may toggle; this is the
/// completion-only path made explicit.
async fn toggle_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, task_id)): Path<(String, String)>,
) -> Result<Json<Task>> {
    let board = load_board(&state, &board_id).await?;
    let mut task = load_task(&state, &board_id, &task_id).await?;

    if permissions::task_edit_scope(&board, &task, &user).is_none() {
        return Err(AppError::Forbidden(
            "You are not a member of this board".to_string(),
        ));
    }

    task.completed = !task.completed;
    task.updated_at = now_rfc3339();
    task.updated_by = Some(user.uid.clone());
    task.updater_name = Some(user.display_name.clone());

    state.db.update_task(&board.id, &task).await?;

    if task.completed {
        notify_owner_of_completion(&state, &board, &user, &task);
    }

    let verb = if task.completed { "Completed" } else { "Reopened" };
    state.activity.record(
        format!("{} task \"{}\"", verb, task.title),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, task_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    let board = load_board(&state, &board_id).await?;
    let task = load_task(&state, &board_id, &task_id).await?;

    if !permissions::can_delete_task(&board, &task, &user) {
        return Err(AppError::Forbidden(
            "Only the task creator or the board owner can delete a task".to_string(),
        ));
    }

    state.db.delete_task(&board.id, &task.id).await?;

    state.activity.record(
        format!("Deleted task \"{}\"", task.title),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<Comment>>> {
    let board = load_board(&state, &board_id).await?;
    let task = load_task(&state, &board_id, &task_id).await?;

    if !permissions::can_view_task(&board, &task, &user) {
        return Err(AppError::Forbidden(
            "You cannot view this task".to_string(),
        ));
    }

    Ok(Json(state.db.comments_for_task(&board_id, &task_id).await?))
}

#[derive(Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment text is required"))]
    pub text: String,
}

/// Append a comment. Comments are append-only; there is no edit or delete.
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((board_id, task_id)): Path<(String, String)>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let board = load_board(&state, &board_id).await?;
    let task = load_task(&state, &board_id, &task_id).await?;

    if !permissions::can_view_task(&board, &task, &user) {
        return Err(AppError::Forbidden(
            "You cannot comment on this task".to_string(),
        ));
    }

    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        text: payload.text,
        created_by: user.uid.clone(),
        creator_name: user.display_name.clone(),
        creator_email: user.email.clone(),
        created_at: now_rfc3339(),
    };

    state.db.add_comment(&board_id, &task_id, &comment).await?;

    state.activity.record(
        format!("Commented on task \"{}\"", task.title),
        &user,
        Some((&board.id, &board.name)),
    );

    Ok(Json(comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn member(email: &str) -> Membership {
        Membership {
            uid: Some(format!("uid-{}", email)),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            role: Role::Member,
        }
    }

    fn board_with(members: Vec<Membership>) -> Board {
        Board {
            id: "b1".to_string(),
            name: "B1".to_string(),
            description: String::new(),
            created_by: "u1".to_string(),
            creator_name: "alice".to_string(),
            created_at: "2026-08-01T10:00:00Z".to_string(),
            task_count: 0,
            completed_task_count: 0,
            users: members,
        }
    }

    #[test]
    fn test_resolve_assignees_snapshots_members() {
        let board = board_with(vec![member("bob@example.com")]);
        let resolved = resolve_assignees(&board, &["Bob@Example.com ".to_string()]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].email, "bob@example.com");
    }

    #[test]
    fn test_resolve_assignees_rejects_non_member() {
        let board = board_with(vec![member("bob@example.com")]);
        let err = resolve_assignees(&board, &["eve@example.com".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_resolve_assignees_dedupes() {
        let board = board_with(vec![member("bob@example.com")]);
        let resolved = resolve_assignees(
            &board,
            &["bob@example.com".to_string(), "bob@example.com".to_string()],
        )
        .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    fn existing_task() -> Task {
        Task {
            id: "t1".to_string(),
            title: "Original title".to_string(),
            description: "Original description".to_string(),
            due_date: "2026-09-01".to_string(),
            priority: "low".to_string(),
            completed: false,
            created_by: "u1".to_string(),
            creator_name: "alice".to_string(),
            assigned_to: vec![member("bob@example.com")],
            created_at: "2026-08-01T10:00:00Z".to_string(),
            updated_at: "2026-08-01T10:00:00Z".to_string(),
            updated_by: None,
            updater_name: None,
        }
    }

    fn full_payload() -> UpdateTaskRequest {
        UpdateTaskRequest {
            title: Some("Hijacked title".to_string()),
            description: Some("Hijacked description".to_string()),
            due_date: Some("2030-01-01".to_string()),
            priority: Some("high".to_string()),
            completed: Some(true),
            assigned_to: Some(vec!["carol@example.com".to_string()]),
        }
    }

    #[test]
    fn test_completion_only_edit_discards_other_fields() {
        let mut task = existing_task();

        // A full submission from a member with narrowed scope: only the
        // completion flag may land.
        apply_task_update(&mut task, full_payload(), None, EditScope::CompletionOnly);

        assert!(task.completed);
        assert_eq!(task.title, "Original title");
        assert_eq!(task.description, "Original description");
        assert_eq!(task.due_date, "2026-09-01");
        assert_eq!(task.priority, "low");
        assert_eq!(task.assigned_to.len(), 1);
        assert_eq!(task.assigned_to[0].email, "bob@example.com");
    }

    #[test]
    fn test_full_scope_edit_applies_all_fields() {
        let mut task = existing_task();
        let assignees = vec![member("carol@example.com")];

        apply_task_update(&mut task, full_payload(), Some(assignees), EditScope::Full);

        assert!(task.completed);
        assert_eq!(task.title, "Hijacked title");
        assert_eq!(task.priority, "high");
        assert_eq!(task.assigned_to[0].email, "carol@example.com");
    }

    #[test]
    fn test_full_scope_edit_keeps_omitted_fields() {
        let mut task = existing_task();
        let payload = UpdateTaskRequest {
            title: Some("New title".to_string()),
            description: None,
            due_date: None,
            priority: None,
            completed: None,
            assigned_to: None,
        };

        apply_task_update(&mut task, payload, None, EditScope::Full);

        assert_eq!(task.title, "New title");
        assert_eq!(task.description, "Original description");
        assert!(!task.completed);
        assert_eq!(task.assigned_to[0].email, "bob@example.com");
    }

    #[test]
    fn test_assignment_diff() {
        let before = vec![member("bob@example.com")];
        let after = vec![member("bob@example.com"), member("carol@example.com")];

        assert_eq!(assignment_diff(&before, &after), vec!["carol@example.com"]);
        assert_eq!(assignment_diff(&after, &before), Vec::<String>::new());
        assert_eq!(assignment_diff(&after, &after), Vec::<String>::new());
    }
}
