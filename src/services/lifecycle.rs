// SPDX-License-Identifier: MIT

//! Cascading lifecycle operations: board deletion, account deletion, and
//! late-binding of email-invited users.
//!
//! The cascades are sequential multi-document deletes, not atomic batches.
//! A crash mid-cascade leaves partial state; every step is idempotent, so
//! re-running the operation completes the cleanup.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Board, Membership, Role};
use crate::services::directory::Directory;
use crate::services::export;
use crate::services::notify::{Mailer, Notice};

#[derive(Clone)]
pub struct LifecycleService {
    db: FirestoreDb,
    directory: Directory,
    mailer: Mailer,
}

impl LifecycleService {
    pub fn new(db: FirestoreDb, directory: Directory, mailer: Mailer) -> Self {
        Self {
            db,
            directory,
            mailer,
        }
    }

    /// Delete a board and everything under it: each task's comments, the
    /// tasks, then the board document itself.
    pub async fn delete_board_cascade(&self, board: &Board) -> Result<()> {
        let tasks = self.db.tasks_for_board(&board.id).await?;
        for task in &tasks {
            self.db.delete_task(&board.id, &task.id).await?;
        }
        self.db.delete_board_doc(&board.id).await?;

        tracing::info!(
            board_id = %board.id,
            tasks = tasks.len(),
            "Board deleted with task cascade"
        );
        Ok(())
    }

    /// Delete a user's account and all their data.
    ///
    /// Order: export and email the data first (last chance to read it), then
    /// revoke the login, then remove the data. Each step after the identity
    /// deletion is best-effort: a partial failure is logged and the deletion
    /// continues, so the user is never left with a working login and
    /// half-deleted data.
    pub async fn delete_account(&self, who: &AuthUser) -> Result<()> {
        match export::collect_user_export(&self.db, &who.uid, &who.email).await {
            Ok(data) => match export::build_export_archive(&who.uid, &data) {
                Ok((filename, archive)) => {
                    if let Err(e) = self
                        .mailer
                        .send_with_zip(&who.email, Notice::AccountDeleted, &filename, archive)
                        .await
                    {
                        tracing::error!(error = %e, uid = %who.uid, "Export email failed");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, uid = %who.uid, "Export archive failed");
                }
            },
            Err(e) => {
                tracing::error!(error = %e, uid = %who.uid, "Export collection failed");
            }
        }

        // Revoking the login is the one step that must succeed.
        self.directory.delete_user(&who.uid).await?;

        if let Err(e) = self.scrub_board_data(who).await {
            tracing::error!(error = %e, uid = %who.uid, "Board scrub incomplete");
        }

        if let Err(e) = self.db.delete_activities_for_user(&who.uid).await {
            tracing::error!(error = %e, uid = %who.uid, "Activity purge incomplete");
        }

        tracing::info!(uid = %who.uid, email = %who.email, "Account deleted");
        Ok(())
    }

    /// Delete boards the user owns; on every other board, drop their
    /// membership and unassign them from tasks.
    async fn scrub_board_data(&self, who: &AuthUser) -> Result<()> {
        let boards = self.db.all_boards().await?;

        for board in boards {
            if board.created_by == who.uid {
                self.delete_board_cascade(&board).await?;
                continue;
            }

            if board.users.iter().any(|m| m.matches(&who.uid, &who.email)) {
                let uid = who.uid.clone();
                let email = who.email.clone();
                self.db
                    .mutate_board_members(&board.id, |members| {
                        let before = members.len();
                        members.retain(|m| !m.matches(&uid, &email));
                        members.len() != before
                    })
                    .await?;
            }

            for mut task in self.db.tasks_for_board(&board.id).await? {
                if task.is_assigned_to(&who.uid, &who.email) {
                    task.assigned_to
                        .retain(|m| !m.matches(&who.uid, &who.email));
                    self.db.update_task(&board.id, &task).await?;
                }
            }
        }

        Ok(())
    }

    /// Attach a newly known uid to every email-only record: placeholder
    /// memberships and task assignee snapshots. Runs at registration and
    /// again at login, so records created while the user was logged out are
    /// eventually claimed.
    pub async fn bind_email_records(
        &self,
        uid: &str,
        email: &str,
        display_name: &str,
    ) -> Result<()> {
        self.db
            .claim_memberships_by_email(email, uid, display_name)
            .await?;
        self.db
            .claim_task_assignments_by_email(email, uid, display_name)
            .await?;
        Ok(())
    }

    /// Consume pending invites for an email: materialize the membership on
    /// each invited board (if not already present) and mark the invite
    /// accepted.
    pub async fn consume_invites(
        &self,
        uid: &str,
        email: &str,
        display_name: &str,
    ) -> Result<usize> {
        let invites = self.db.pending_invites_for_email(email).await?;
        let mut accepted = 0;

        for invite in &invites {
            let uid = uid.to_string();
            let membership = Membership {
                uid: Some(uid.clone()),
                email: email.to_string(),
                display_name: display_name.to_string(),
                role: Role::Member,
            };

            let board = self
                .db
                .mutate_board_members(&invite.board_id, move |members| {
                    if members.iter().any(|m| m.matches(&uid, &membership.email)) {
                        return false;
                    }
                    members.push(membership.clone());
                    true
                })
                .await?;

            if board.is_none() {
                tracing::warn!(
                    invite_id = %invite.id,
                    board_id = %invite.board_id,
                    "Invite points at a deleted board"
                );
            }

            self.db.mark_invite_accepted(invite).await?;
            accepted += 1;
        }

        if accepted > 0 {
            tracing::info!(email, accepted, "Consumed pending invites");
        }
        Ok(accepted)
    }
}
