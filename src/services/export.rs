// SPDX-License-Identifier: MIT

//! CSV and ZIP data export.
//!
//! CSV rendering is pure so it can be tested without a store. The ZIP
//! archive is built fully in memory; exports are small (one user's data).

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Activity, Board, Task};
use chrono::Utc;
use serde::Serialize;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A task row in the account export, annotated with its board.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedTask {
    pub board_id: String,
    #[serde(flatten)]
    pub task: Task,
}

/// Everything a user gets back when exporting their account.
#[derive(Debug, Serialize)]
pub struct UserExport {
    pub boards: Vec<Board>,
    pub tasks: Vec<ExportedTask>,
    pub activities: Vec<Activity>,
}

/// Collect a user's exportable data: boards they own, tasks they created or
/// are assigned to on any board, and their activity log.
pub async fn collect_user_export(
    db: &FirestoreDb,
    uid: &str,
    email: &str,
) -> Result<UserExport> {
    let all_boards = db.all_boards().await?;

    let mut boards = Vec::new();
    let mut tasks = Vec::new();
    for board in all_boards {
        let owned = board.created_by == uid;
        let member = board.users.iter().any(|m| m.matches(uid, email));
        if !owned && !member {
            continue;
        }

        for task in db.tasks_for_board(&board.id).await? {
            if task.created_by == uid || task.is_assigned_to(uid, email) {
                tasks.push(ExportedTask {
                    board_id: board.id.clone(),
                    task,
                });
            }
        }

        if owned {
            boards.push(board);
        }
    }

    let activities = db.activities_for_user(uid, 1000).await?;

    Ok(UserExport {
        boards,
        tasks,
        activities,
    })
}

/// Build the export ZIP archive in memory. Returns `(filename, bytes)`.
pub fn build_export_archive(uid: &str, export: &UserExport) -> Result<(String, Vec<u8>)> {
    let filename = format!("{}_export_{}.zip", uid, Utc::now().format("%Y%m%d%H%M%S"));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    add_json_entry(&mut writer, options, "boards.json", &export.boards)?;
    add_json_entry(&mut writer, options, "tasks.json", &export.tasks)?;
    add_json_entry(&mut writer, options, "activities.json", &export.activities)?;

    let cursor = writer
        .finish()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("finish archive: {}", e)))?;

    Ok((filename, cursor.into_inner()))
}

fn add_json_entry<T: Serialize>(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    name: &str,
    value: &T,
) -> Result<()> {
    writer
        .start_file(name, options)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("archive entry {}: {}", name, e)))?;
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize {}: {}", name, e)))?;
    writer
        .write_all(&json)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("write {}: {}", name, e)))?;
    Ok(())
}

/// Render tasks as CSV, one row per task.
pub fn tasks_csv(tasks: &[Task]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Task ID",
            "Title",
            "Description",
            "Status",
            "Priority",
            "Due Date",
            "Assigned To",
            "Created By",
            "Created At",
            "Updated At",
        ])
        .map_err(csv_error)?;

    for task in tasks {
        let assignees = if task.assigned_to.is_empty() {
            "Unassigned".to_string()
        } else {
            task.assigned_to
                .iter()
                .map(|m| m.email.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let status = if task.completed { "Completed" } else { "Active" };

        writer
            .write_record([
                task.id.as_str(),
                task.title.as_str(),
                task.description.as_str(),
                status,
                task.priority.as_str(),
                task.due_date.as_str(),
                assignees.as_str(),
                task.creator_name.as_str(),
                task.created_at.as_str(),
                task.updated_at.as_str(),
            ])
            .map_err(csv_error)?;
    }

    finish_csv(writer)
}

/// Render boards as CSV, one row per board, with denormalized task counts.
pub fn boards_csv(boards: &[Board]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Board Name",
            "Description",
            "Created At",
            "Total Tasks",
            "Completed Tasks",
            "Users",
        ])
        .map_err(csv_error)?;

    for board in boards {
        let users = board
            .users
            .iter()
            .map(|m| m.email.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        writer
            .write_record([
                board.name.as_str(),
                board.description.as_str(),
                board.created_at.as_str(),
                board.task_count.to_string().as_str(),
                board.completed_task_count.to_string().as_str(),
                users.as_str(),
            ])
            .map_err(csv_error)?;
    }

    finish_csv(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| {
        AppError::Internal(anyhow::anyhow!("flush csv: {}", e))
    })?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(anyhow::anyhow!("csv utf8: {}", e)))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("write csv: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Membership, Role};

    fn member(uid: &str, email: &str) -> Membership {
        Membership {
            uid: Some(uid.to_string()),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            role: Role::Member,
        }
    }

    fn task(title: &str, completed: bool, assigned_to: Vec<Membership>) -> Task {
        Task {
            id: "t1".to_string(),
            title: title.to_string(),
            description: "desc".to_string(),
            due_date: "2026-09-01".to_string(),
            priority: "high".to_string(),
            completed,
            created_by: "u1".to_string(),
            creator_name: "Alice".to_string(),
            assigned_to,
            created_at: "2026-08-01T10:00:00Z".to_string(),
            updated_at: "2026-08-02T10:00:00Z".to_string(),
            updated_by: None,
            updater_name: None,
        }
    }

    #[test]
    fn test_tasks_csv_columns_and_status() {
        let tasks = vec![
            task("Ship it", true, vec![member("u2", "bob@example.com")]),
            task("Plan it", false, vec![]),
        ];
        let out = tasks_csv(&tasks).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Task ID,Title,Description,Status,Priority,Due Date,Assigned To,Created By,Created At,Updated At"
        );
        let first = lines.next().unwrap();
        assert!(first.contains("Completed"));
        assert!(first.contains("bob@example.com"));
        let second = lines.next().unwrap();
        assert!(second.contains("Active"));
        assert!(second.contains("Unassigned"));
    }

    #[test]
    fn test_tasks_csv_joins_multiple_assignees() {
        let tasks = vec![task(
            "Pair work",
            false,
            vec![member("u2", "bob@example.com"), member("u3", "carol@example.com")],
        )];
        let out = tasks_csv(&tasks).unwrap();
        assert!(out.contains("bob@example.com, carol@example.com"));
    }

    #[test]
    fn test_boards_csv_counts_and_users() {
        let board = Board {
            id: "b1".to_string(),
            name: "Roadmap".to_string(),
            description: "Q3".to_string(),
            created_by: "u1".to_string(),
            creator_name: "Alice".to_string(),
            created_at: "2026-08-01T10:00:00Z".to_string(),
            task_count: 5,
            completed_task_count: 2,
            users: vec![member("u1", "alice@example.com"), member("u2", "bob@example.com")],
        };
        let out = boards_csv(&[board]).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Board Name,Description,Created At,Total Tasks,Completed Tasks,Users"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("Roadmap"));
        assert!(row.contains(",5,2,"));
        assert!(row.contains("alice@example.com, bob@example.com"));
    }

    #[test]
    fn test_export_archive_contains_three_entries() {
        let export = UserExport {
            boards: vec![],
            tasks: vec![],
            activities: vec![],
        };
        let (filename, bytes) = build_export_archive("u1", &export).unwrap();
        assert!(filename.starts_with("u1_export_"));
        assert!(filename.ends_with(".zip"));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["boards.json", "tasks.json", "activities.json"]);
    }
}
