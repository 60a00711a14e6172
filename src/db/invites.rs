// SPDX-License-Identifier: MIT

//! Invite store and the late-binding collection scans that attach a newly
//! registered uid to email-only records.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::Invite;

impl FirestoreDb {
    /// Create a pending invite.
    pub async fn create_invite(&self, invite: &Invite) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::INVITES)
            .document_id(&invite.id)
            .object(invite)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get unaccepted invites for an email address.
    pub async fn pending_invites_for_email(&self, email: &str) -> Result<Vec<Invite>, AppError> {
        let email = email.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::INVITES)
            .filter(move |q| {
                q.for_all([
                    q.field("email").eq(email.clone()),
                    q.field("accepted").eq(false),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an invite as accepted.
    pub async fn mark_invite_accepted(&self, invite: &Invite) -> Result<(), AppError> {
        let accepted = Invite {
            accepted: true,
            ..invite.clone()
        };
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::INVITES)
            .document_id(&invite.id)
            .object(&accepted)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Back-fill uid and display name onto placeholder memberships matching
    /// an email, across every board.
    ///
    /// Full collection scan; boards created concurrently with the scan may
    /// be missed and are picked up on the user's next login.
    pub async fn claim_memberships_by_email(
        &self,
        email: &str,
        uid: &str,
        display_name: &str,
    ) -> Result<usize, AppError> {
        let boards = self.all_boards().await?;
        let mut updated = 0;

        for mut board in boards {
            let mut modified = false;
            for member in &mut board.users {
                if member.email == email && member.uid.is_none() {
                    member.uid = Some(uid.to_string());
                    member.display_name = display_name.to_string();
                    modified = true;
                }
            }
            if modified {
                self.update_board(&board).await?;
                updated += 1;
            }
        }

        if updated > 0 {
            tracing::info!(email, uid, boards = updated, "Claimed placeholder memberships");
        }
        Ok(updated)
    }

    /// Back-fill uid and display name onto task assignee snapshots matching
    /// an email, across every board's task subcollection.
    pub async fn claim_task_assignments_by_email(
        &self,
        email: &str,
        uid: &str,
        display_name: &str,
    ) -> Result<usize, AppError> {
        let boards = self.all_boards().await?;
        let mut updated = 0;

        for board in boards {
            let tasks = self.tasks_for_board(&board.id).await?;
            for mut task in tasks {
                let mut modified = false;
                for assignee in &mut task.assigned_to {
                    if assignee.email == email && assignee.uid.is_none() {
                        assignee.uid = Some(uid.to_string());
                        assignee.display_name = display_name.to_string();
                        modified = true;
                    }
                }
                if modified {
                    self.update_task(&board.id, &task).await?;
                    updated += 1;
                }
            }
        }

        if updated > 0 {
            tracing::info!(email, uid, tasks = updated, "Claimed task assignments");
        }
        Ok(updated)
    }
}
