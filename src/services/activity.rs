// SPDX-License-Identifier: MIT

//! Activity log service.
//!
//! Appends are fire-and-forget: activity logging must never block or fail
//! the primary operation, so failures are logged and swallowed.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Activity;
use crate::time_utils::{now_rfc3339, parse_stored_timestamp};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

/// How many recent records feed the 7-day chart.
const CHART_SOURCE_LIMIT: u32 = 100;

/// One day of the 7-day activity chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    pub count: u32,
}

#[derive(Clone)]
pub struct ActivityService {
    db: FirestoreDb,
}

impl ActivityService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Append an activity record in the background.
    pub fn record(
        &self,
        description: String,
        who: &AuthUser,
        board: Option<(&str, &str)>,
    ) {
        let activity = Activity {
            id: uuid::Uuid::new_v4().to_string(),
            description,
            user_id: who.uid.clone(),
            user_email: who.email.clone(),
            timestamp: now_rfc3339(),
            board_id: board.map(|(id, _)| id.to_string()),
            board_name: board.map(|(_, name)| name.to_string()),
        };

        let db = self.db.clone();
        tokio::spawn(async move {
            if let Err(e) = db.add_activity(&activity).await {
                tracing::error!(
                    error = %e,
                    user_id = %activity.user_id,
                    "Failed to record activity"
                );
            }
        });
    }

    /// Recent activities for a user, newest first.
    pub async fn recent_for_user(&self, uid: &str, limit: u32) -> Result<Vec<Activity>> {
        self.db.activities_for_user(uid, limit).await
    }

    /// Bucket the user's recent activity into the last 7 calendar days.
    pub async fn chart_data(&self, uid: &str) -> Result<Vec<ChartPoint>> {
        let activities = self.db.activities_for_user(uid, CHART_SOURCE_LIMIT).await?;
        Ok(bucket_last_seven_days(
            &activities,
            Utc::now().date_naive(),
        ))
    }
}

/// Produce a fixed 7-day series (today inclusive, oldest first), seeded with
/// zeros. Activities outside the window are ignored; records with
/// unrecognized timestamps are logged and skipped rather than failing the
/// aggregation.
pub fn bucket_last_seven_days(activities: &[Activity], today: NaiveDate) -> Vec<ChartPoint> {
    let mut series: Vec<ChartPoint> = (0..7)
        .rev()
        .map(|offset| ChartPoint {
            date: (today - Duration::days(offset)).format("%Y-%m-%d").to_string(),
            count: 0,
        })
        .collect();

    for activity in activities {
        let Some(parsed) = parse_stored_timestamp(&activity.timestamp) else {
            tracing::warn!(
                activity_id = %activity.id,
                raw = %activity.timestamp,
                "Skipping activity with unrecognized timestamp"
            );
            continue;
        };

        let day = parsed.date_naive().format("%Y-%m-%d").to_string();
        if let Some(point) = series.iter_mut().find(|p| p.date == day) {
            point.count += 1;
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, timestamp: &str) -> Activity {
        Activity {
            id: id.to_string(),
            description: "did something".to_string(),
            user_id: "u1".to_string(),
            user_email: "alice@example.com".to_string(),
            timestamp: timestamp.to_string(),
            board_id: None,
            board_name: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn test_empty_series_is_seven_zeroed_days() {
        let series = bucket_last_seven_days(&[], today());
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, "2026-08-23");
        assert_eq!(series[6].date, "2026-08-29");
        assert!(series.iter().all(|p| p.count == 0));
    }

    #[test]
    fn test_activities_counted_per_day() {
        let activities = vec![
            activity("a", "2026-08-29T08:00:00Z"),
            activity("b", "2026-08-29T15:30:00Z"),
            activity("c", "2026-08-27T09:00:00Z"),
        ];
        let series = bucket_last_seven_days(&activities, today());
        assert_eq!(series[6].count, 2); // today
        assert_eq!(series[4].count, 1); // two days ago
    }

    #[test]
    fn test_out_of_window_activities_ignored() {
        let activities = vec![activity("old", "2026-08-01T12:00:00Z")];
        let series = bucket_last_seven_days(&activities, today());
        assert!(series.iter().all(|p| p.count == 0));
    }

    #[test]
    fn test_malformed_timestamps_skipped_not_fatal() {
        let activities = vec![
            activity("bad", "yesterday-ish"),
            activity("good", "2026-08-29T08:00:00Z"),
        ];
        let series = bucket_last_seven_days(&activities, today());
        assert_eq!(series[6].count, 1);
    }

    #[test]
    fn test_unix_seconds_timestamp_accepted() {
        // 2026-08-29T00:00:00Z
        let secs = NaiveDate::from_ymd_opt(2026, 8, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        let activities = vec![activity("n", &secs.to_string())];
        let series = bucket_last_seven_days(&activities, today());
        assert_eq!(series[6].count, 1);
    }
}
