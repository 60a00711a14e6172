// SPDX-License-Identifier: MIT

//! Permission and visibility engine.
//!
//! Pure decision logic over `(identity, board, task)`. All policy lives
//! here; route handlers only translate decisions into HTTP responses.
//!
//! Membership is matched by uid OR email: a membership with no uid is a
//! pre-registration placeholder, reachable only through its email until the
//! invited user registers.

use crate::middleware::auth::AuthUser;
use crate::models::{Board, Membership, Role, Task};

/// How much of a task a user may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Title, description, due date, priority, assignees and completion.
    Full,
    /// Completion flag only; everything else in the submission is
    /// discarded. Degrade-not-deny for collaborative completion toggling.
    CompletionOnly,
}

/// Find the acting user's membership on a board, if any.
pub fn membership_of<'a>(board: &'a Board, who: &AuthUser) -> Option<&'a Membership> {
    board.users.iter().find(|m| m.matches(&who.uid, &who.email))
}

/// Membership test: matched by uid or email.
pub fn is_member(board: &Board, who: &AuthUser) -> bool {
    membership_of(board, who).is_some()
}

/// Board ownership: the owner-role membership, or the immutable
/// `created_by` reference (they are the same user by invariant).
pub fn is_board_owner(board: &Board, who: &AuthUser) -> bool {
    board.created_by == who.uid
        || membership_of(board, who).is_some_and(|m| m.role == Role::Owner)
}

/// Task visibility within a board: the owner sees all tasks, other members
/// only tasks assigned to them.
pub fn can_view_task(board: &Board, task: &Task, who: &AuthUser) -> bool {
    if !is_member(board, who) {
        return false;
    }
    is_board_owner(board, who) || task.is_assigned_to(&who.uid, &who.email)
}

/// Filter a board's tasks down to those the user may see.
pub fn visible_tasks(board: &Board, tasks: Vec<Task>, who: &AuthUser) -> Vec<Task> {
    if is_board_owner(board, who) {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|t| t.is_assigned_to(&who.uid, &who.email))
        .collect()
}

/// Edit scope for a task: full for the task creator or the board owner,
/// completion-only for any other member, None for non-members.
pub fn task_edit_scope(board: &Board, task: &Task, who: &AuthUser) -> Option<EditScope> {
    if !is_member(board, who) {
        return None;
    }
    if task.created_by == who.uid || is_board_owner(board, who) {
        Some(EditScope::Full)
    } else {
        Some(EditScope::CompletionOnly)
    }
}

/// Task deletion: creator or board owner only.
pub fn can_delete_task(board: &Board, task: &Task, who: &AuthUser) -> bool {
    is_member(board, who) && (task.created_by == who.uid || is_board_owner(board, who))
}

/// Membership mutation (add/remove member): board owner only.
pub fn can_manage_members(board: &Board, who: &AuthUser) -> bool {
    is_board_owner(board, who)
}

/// Board deletion: owner only.
pub fn can_delete_board(board: &Board, who: &AuthUser) -> bool {
    is_board_owner(board, who)
}

/// The owner membership is never removable, regardless of caller.
pub fn is_removable(member: &Membership) -> bool {
    member.role != Role::Owner
}
