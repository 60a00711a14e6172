// SPDX-License-Identifier: MIT

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). The emulator provides a clean state for
//! each test run.

use boardstack::models::{Board, Membership, Role, Task};
use boardstack::time_utils::now_rfc3339;

mod common;
use common::test_db;

fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn test_board(id: &str, owner_uid: &str) -> Board {
    Board {
        id: id.to_string(),
        name: "Integration board".to_string(),
        description: "created by tests".to_string(),
        created_by: owner_uid.to_string(),
        creator_name: "Alice".to_string(),
        created_at: now_rfc3339(),
        task_count: 0,
        completed_task_count: 0,
        users: vec![Membership {
            uid: Some(owner_uid.to_string()),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            role: Role::Owner,
        }],
    }
}

fn test_task(id: &str, completed: bool) -> Task {
    Task {
        id: id.to_string(),
        title: "Integration task".to_string(),
        description: String::new(),
        due_date: String::new(),
        priority: "medium".to_string(),
        completed,
        created_by: "owner-uid".to_string(),
        creator_name: "Alice".to_string(),
        assigned_to: vec![],
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
        updated_by: None,
        updater_name: None,
    }
}

#[tokio::test]
async fn test_board_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let board_id = unique_id("board");

    assert!(db.get_board(&board_id).await.unwrap().is_none());

    let board = test_board(&board_id, "owner-uid");
    db.create_board(&board).await.unwrap();

    let fetched = db.get_board(&board_id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Integration board");
    assert_eq!(fetched.users.len(), 1);
    assert_eq!(fetched.users[0].role, Role::Owner);
}

#[tokio::test]
async fn test_task_mutations_keep_counters_consistent() {
    require_emulator!();

    let db = test_db().await;
    let board_id = unique_id("board");
    db.create_board(&test_board(&board_id, "owner-uid"))
        .await
        .unwrap();

    db.add_task(&board_id, &test_task(&unique_id("task"), false))
        .await
        .unwrap();
    let done_id = unique_id("task");
    db.add_task(&board_id, &test_task(&done_id, true))
        .await
        .unwrap();

    let board = db.get_board(&board_id).await.unwrap().unwrap();
    assert_eq!(board.task_count, 2);
    assert_eq!(board.completed_task_count, 1);

    db.delete_task(&board_id, &done_id).await.unwrap();

    let board = db.get_board(&board_id).await.unwrap().unwrap();
    assert_eq!(board.task_count, 1);
    assert_eq!(board.completed_task_count, 0);
}

#[tokio::test]
async fn test_membership_mutation_in_transaction() {
    require_emulator!();

    let db = test_db().await;
    let board_id = unique_id("board");
    db.create_board(&test_board(&board_id, "owner-uid"))
        .await
        .unwrap();

    let updated = db
        .mutate_board_members(&board_id, |members| {
            members.push(Membership {
                uid: None,
                email: "invitee@example.com".to_string(),
                display_name: "invitee".to_string(),
                role: Role::Member,
            });
            true
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.users.len(), 2);

    // No-change mutation must not write.
    let unchanged = db
        .mutate_board_members(&board_id, |_| false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.users.len(), 2);

    // Missing board yields None.
    let missing = db
        .mutate_board_members(&unique_id("nope"), |_| true)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_concurrent_membership_mutations_both_apply() {
    require_emulator!();

    let db = test_db().await;
    let board_id = unique_id("board");
    db.create_board(&test_board(&board_id, "owner-uid"))
        .await
        .unwrap();

    let push = |email: &str| {
        let email = email.to_string();
        move |members: &mut Vec<Membership>| {
            members.push(Membership {
                uid: None,
                email: email.clone(),
                display_name: email.split('@').next().unwrap().to_string(),
                role: Role::Member,
            });
            true
        }
    };

    // Two overlapping read-mutate-write cycles on the same board. Without
    // the transactional conflict check one of the pushes is lost.
    let db2 = db.clone();
    let board_id2 = board_id.clone();
    let (a, b) = tokio::join!(
        db.mutate_board_members(&board_id, push("bob@example.com")),
        db2.mutate_board_members(&board_id2, push("carol@example.com")),
    );
    a.unwrap();
    b.unwrap();

    let fetched = db.get_board(&board_id).await.unwrap().unwrap();
    assert_eq!(fetched.users.len(), 3);
    assert!(fetched.users.iter().any(|m| m.email == "bob@example.com"));
    assert!(fetched.users.iter().any(|m| m.email == "carol@example.com"));
}

#[tokio::test]
async fn test_claim_memberships_backfills_uid() {
    require_emulator!();

    let db = test_db().await;
    let board_id = unique_id("board");
    let email = format!("{}@example.com", unique_id("carol"));

    let mut board = test_board(&board_id, "owner-uid");
    board.users.push(Membership {
        uid: None,
        email: email.clone(),
        display_name: "carol".to_string(),
        role: Role::Member,
    });
    db.create_board(&board).await.unwrap();

    let claimed = db
        .claim_memberships_by_email(&email, "carol-uid", "Carol")
        .await
        .unwrap();
    assert!(claimed >= 1);

    let fetched = db.get_board(&board_id).await.unwrap().unwrap();
    let member = fetched.users.iter().find(|m| m.email == email).unwrap();
    assert_eq!(member.uid.as_deref(), Some("carol-uid"));
    assert_eq!(member.display_name, "Carol");
}
