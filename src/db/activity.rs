// SPDX-License-Identifier: MIT

//! Activity log store: append-only records in a flat collection.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::Activity;
use crate::time_utils::parse_stored_timestamp;

impl FirestoreDb {
    /// Append an activity record.
    pub async fn add_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACTIVITY)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get recent activities for a user.
    ///
    /// The limited fetch is unordered (no index on timestamp), so results
    /// are sorted client-side, newest first. Records with unparseable
    /// timestamps sort to the end.
    pub async fn activities_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Activity>, AppError> {
        let user_id = user_id.to_string();
        let mut activities: Vec<Activity> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        activities.sort_by_key(|a| {
            std::cmp::Reverse(
                parse_stored_timestamp(&a.timestamp)
                    .map(|dt| dt.timestamp())
                    .unwrap_or(0),
            )
        });

        Ok(activities)
    }

    /// Delete every activity record for a user (account deletion only).
    pub async fn delete_activities_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        let uid = user_id.to_string();
        let activities: Vec<Activity> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY)
            .filter(move |q| q.for_all([q.field("user_id").eq(uid.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let client = self.get_client()?;
        for activity in &activities {
            client
                .fluent()
                .delete()
                .from(collections::ACTIVITY)
                .document_id(&activity.id)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tracing::debug!(user_id, count = activities.len(), "Deleted activity records");
        Ok(activities.len())
    }
}
