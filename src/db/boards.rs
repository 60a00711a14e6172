// SPDX-License-Identifier: MIT

//! Board store: CRUD over board documents and their membership lists.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{Board, Membership};

impl FirestoreDb {
    /// Get a board by ID.
    pub async fn get_board(&self, board_id: &str) -> Result<Option<Board>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BOARDS)
            .obj()
            .one(board_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get boards owned (created) by a user.
    pub async fn boards_owned_by(&self, uid: &str) -> Result<Vec<Board>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOARDS)
            .filter(move |q| q.for_all([q.field("created_by").eq(uid.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get boards shared with a user: any board whose membership list matches
    /// the uid or email, excluding boards the user owns.
    ///
    /// Membership matching cannot be expressed as a Firestore equality filter
    /// on an array of maps, so this is a collection scan with client-side
    /// filtering. Acceptable at current scale; a reverse membership index
    /// would be the upgrade path.
    pub async fn boards_shared_with(
        &self,
        uid: &str,
        email: &str,
    ) -> Result<Vec<Board>, AppError> {
        let all: Vec<Board> = self.all_boards().await?;

        Ok(all
            .into_iter()
            .filter(|b| {
                b.created_by != uid && b.users.iter().any(|m| m.matches(uid, email))
            })
            .collect())
    }

    /// Fetch every board (used by shared-board queries and lifecycle scans).
    pub async fn all_boards(&self) -> Result<Vec<Board>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOARDS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new board document (document ID taken from `board.id`).
    pub async fn create_board(&self, board: &Board) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::BOARDS)
            .document_id(&board.id)
            .object(board)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write a full board document back.
    pub async fn update_board(&self, board: &Board) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::BOARDS)
            .document_id(&board.id)
            .object(board)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a board document. Tasks are deleted separately by the
    /// lifecycle cascade before this is called.
    pub async fn delete_board_doc(&self, board_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::BOARDS)
            .document_id(board_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mutate a board's membership list inside a Firestore transaction.
    ///
    /// The closure receives the current list and returns true if it changed
    /// it. The read is bound to the transaction through a consistency
    /// selector, so the commit conflict-checks against it: a concurrent
    /// writer aborts the commit, and the whole read-mutate-write is retried
    /// on a fresh snapshot instead of silently losing an update. The closure
    /// may therefore run more than once.
    ///
    /// Returns the board as written, or None if the board does not exist.
    pub async fn mutate_board_members<F>(
        &self,
        board_id: &str,
        mutate: F,
    ) -> Result<Option<Board>, AppError>
    where
        F: Fn(&mut Vec<Membership>) -> bool,
    {
        const TX_ATTEMPTS: usize = 3;

        let client = self.get_client()?;

        let mut last_err = None;
        for attempt in 1..=TX_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            // Reads must go through a client carrying the transaction's
            // consistency selector, or they are plain snapshot reads the
            // commit never conflict-checks.
            let tx_client = client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );

            let board: Option<Board> = tx_client
                .fluent()
                .select()
                .by_id_in(collections::BOARDS)
                .obj()
                .one(board_id)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to read board in transaction: {}", e))
                })?;

            let Some(mut board) = board else {
                let _ = transaction.rollback().await;
                return Ok(None);
            };

            if !mutate(&mut board.users) {
                // Nothing changed; skip the write.
                let _ = transaction.rollback().await;
                return Ok(Some(board));
            }

            client
                .fluent()
                .update()
                .in_col(collections::BOARDS)
                .document_id(board_id)
                .object(&board)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add board update to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => {
                    tracing::debug!(
                        board_id,
                        members = board.users.len(),
                        "Membership list updated"
                    );
                    return Ok(Some(board));
                }
                Err(e) => {
                    tracing::warn!(
                        board_id,
                        attempt,
                        error = %e,
                        "Membership transaction aborted, retrying"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(AppError::Database(format!(
            "Membership transaction failed after {} attempts: {}",
            TX_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}
