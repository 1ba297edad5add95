//! Integration tests for the core library flows
//!
//! Everything runs against in-memory databases; the sync backend and the
//! search providers are exercised only through their pure parsing and
//! snapshot logic here.

use bookflow::challenge::daily_goals;
use bookflow::shelf::{sort_books, SortDirection, SortKey};
use bookflow::storage::models::{NewBook, NewReadingChallenge, NewShelf, ReadingStatus};
use bookflow::storage::{profiles, queries, Database};
use bookflow::sync::snapshots::{apply_payload, build_payload, local_updated_at};
use bookflow::sync::{buddies, client::remote_wins, Collection, SnapshotEnvelope};
use chrono::{Datelike, Duration, NaiveDate, Utc};

async fn fresh_db() -> Database {
    Database::new_in_memory().await.expect("in-memory database")
}

async fn add_book(
    db: &Database,
    username: &str,
    title: &str,
    author: &str,
    status: ReadingStatus,
) -> i64 {
    let mut book = NewBook::new(username.to_string(), title.to_string());
    book.authors = vec![author.to_string()];
    book.status = status;
    queries::insert_book(db.pool(), &book).await.expect("insert book")
}

#[tokio::test]
async fn test_catalogue_and_shelf_views() {
    let db = fresh_db().await;
    profiles::save_profile(db.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();

    add_book(&db, "alice", "The Dispossessed", "Ursula K. Le Guin", ReadingStatus::Read).await;
    add_book(&db, "alice", "Annihilation", "Jeff VanderMeer", ReadingStatus::Reading).await;
    let dune = add_book(&db, "alice", "Dune", "Frank Herbert", ReadingStatus::WantToRead).await;

    // Status-backed shelves resolve through the status column
    let reading = queries::find_shelf_by_uid(db.pool(), "alice", "system-reading")
        .await
        .unwrap()
        .unwrap();
    let on_reading = queries::list_books_for_shelf(db.pool(), &reading).await.unwrap();
    assert_eq!(on_reading.len(), 1);
    assert_eq!(on_reading[0].title, "Annihilation");

    // A custom shelf holds whatever is put on it, regardless of status
    let shelf_id = queries::create_shelf(
        db.pool(),
        &NewShelf::new("alice".to_string(), "Desert Worlds".to_string()),
    )
    .await
    .unwrap();
    queries::add_book_to_shelf(db.pool(), dune, shelf_id).await.unwrap();

    queries::set_book_status(db.pool(), dune, ReadingStatus::Read).await.unwrap();
    let custom = queries::find_shelf_by_id(db.pool(), shelf_id).await.unwrap().unwrap();
    assert_eq!(
        queries::count_books_in_shelf(db.pool(), &custom).await.unwrap(),
        1,
        "custom membership must survive status changes"
    );

    // Sorting ignores leading articles
    let mut all = queries::list_books(db.pool(), "alice").await.unwrap();
    sort_books(&mut all, SortKey::Title, SortDirection::Ascending);
    let titles: Vec<_> = all.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Annihilation", "The Dispossessed", "Dune"]);
}

#[tokio::test]
async fn test_challenge_end_to_end() {
    let db = fresh_db().await;
    profiles::save_profile(db.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();

    let mut challenge = NewReadingChallenge::new("alice".to_string(), 2025, 12);
    challenge.weekly_page_target = Some(210);
    queries::upsert_challenge(db.pool(), &challenge).await.unwrap();

    // A 210-page week: log entries for the first three days
    let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    let sunday = monday + Duration::days(6);
    queries::record_reading_log(db.pool(), "alice", monday, 30, None)
        .await
        .unwrap();
    queries::record_reading_log(db.pool(), "alice", monday + Duration::days(1), 60, None)
        .await
        .unwrap();
    queries::record_reading_log(db.pool(), "alice", monday + Duration::days(2), 70, None)
        .await
        .unwrap();

    let logs = queries::list_reading_logs(db.pool(), "alice", monday, sunday, None)
        .await
        .unwrap();
    let goals = daily_goals(monday, sunday, 210, 0, &queries::reading_log_map(&logs));

    assert_eq!(goals.len(), 7);
    // On pace for two days, then a 20-page shortfall on day three
    assert_eq!(goals[0].target_pages, 30);
    assert_eq!(goals[1].target_pages, 30);
    assert_eq!(goals[2].target_pages, 30);
    assert_eq!(goals[2].actual_pages, 10);
    // 140 pages left over 4 days
    assert_eq!(goals[3].target_pages, 35);

    // Yearly progress counts finished books
    let book = add_book(&db, "alice", "Dune", "Frank Herbert", ReadingStatus::Reading).await;
    queries::set_book_status(db.pool(), book, ReadingStatus::Read).await.unwrap();
    let finished = queries::count_books_finished_in_year(db.pool(), "alice", Utc::now().year())
        .await
        .unwrap();
    assert_eq!(finished, 1);
}

#[tokio::test]
async fn test_buddy_share_between_users() {
    let db = fresh_db().await;
    profiles::save_profile(db.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();
    profiles::save_profile(db.pool(), "bob", r#"{"display_name":"Bob"}"#)
        .await
        .unwrap();

    let book = add_book(&db, "alice", "Piranesi", "Susanna Clarke", ReadingStatus::Read).await;

    // Sharing before the buddy handshake fails
    assert!(buddies::share_book(db.pool(), None, "alice", "bob", book).await.is_err());

    let request = buddies::send_friend_request(db.pool(), None, "alice", "bob")
        .await
        .unwrap();
    buddies::accept_friend_request(db.pool(), None, request).await.unwrap();

    let item = buddies::share_book(db.pool(), None, "alice", "bob", book)
        .await
        .unwrap();
    let imported = buddies::accept_shared_item(db.pool(), "bob", item).await.unwrap();

    let bobs_copy = queries::find_book_by_id(db.pool(), imported).await.unwrap().unwrap();
    assert_eq!(bobs_copy.username, "bob");
    assert_eq!(bobs_copy.get_status(), ReadingStatus::NoStatus);

    // Alice's original is untouched
    let original = queries::find_book_by_id(db.pool(), book).await.unwrap().unwrap();
    assert_eq!(original.get_status(), ReadingStatus::Read);
}

#[tokio::test]
async fn test_two_device_snapshot_sync() {
    // Device A has the data
    let device_a = fresh_db().await;
    profiles::save_profile(device_a.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();
    let shelf = queries::create_shelf(
        device_a.pool(),
        &NewShelf::new("alice".to_string(), "Re-reads".to_string()),
    )
    .await
    .unwrap();
    let book = add_book(&device_a, "alice", "Dune", "Frank Herbert", ReadingStatus::Read).await;
    queries::add_book_to_shelf(device_a.pool(), book, shelf).await.unwrap();

    // Simulate push: build envelopes the way SyncManager does
    let mut envelopes = Vec::new();
    for collection in Collection::all() {
        envelopes.push(SnapshotEnvelope {
            username: "alice".to_string(),
            collection,
            updated_at: Utc::now(),
            payload: build_payload(device_a.pool(), "alice", collection).await.unwrap(),
        });
    }

    // Device B is empty: every remote snapshot wins
    let device_b = fresh_db().await;
    profiles::save_profile(device_b.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();

    for envelope in &envelopes {
        let local = local_updated_at(device_b.pool(), "alice", envelope.collection)
            .await
            .unwrap();
        if envelope.collection == Collection::Books || envelope.collection == Collection::Shelves {
            assert!(remote_wins(local, envelope), "empty local collection must lose");
        }
        if remote_wins(local, envelope) {
            apply_payload(device_b.pool(), "alice", envelope.collection, &envelope.payload)
                .await
                .unwrap();
        }
    }

    let restored = queries::list_books(device_b.pool(), "alice").await.unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].get_status(), ReadingStatus::Read);

    let uids = queries::list_shelf_uids_for_book(device_b.pool(), restored[0].book_id)
        .await
        .unwrap();
    assert_eq!(uids.len(), 1, "custom-shelf membership must survive the round trip");

    // A stale envelope does not clobber device B's fresher copy
    let stale = SnapshotEnvelope {
        username: "alice".to_string(),
        collection: Collection::Books,
        updated_at: Utc::now() - Duration::days(1),
        payload: serde_json::json!([]),
    };
    let local = local_updated_at(device_b.pool(), "alice", Collection::Books)
        .await
        .unwrap();
    assert!(!remote_wins(local, &stale));
}

#[tokio::test]
async fn test_account_wipe_is_scoped() {
    let db = fresh_db().await;
    profiles::save_profile(db.pool(), "alice", r#"{"display_name":"Alice"}"#)
        .await
        .unwrap();
    profiles::save_profile(db.pool(), "bob", r#"{"display_name":"Bob"}"#)
        .await
        .unwrap();

    add_book(&db, "alice", "Dune", "Frank Herbert", ReadingStatus::Read).await;
    add_book(&db, "bob", "Emma", "Jane Austen", ReadingStatus::Reading).await;

    let request = buddies::send_friend_request(db.pool(), None, "alice", "bob")
        .await
        .unwrap();
    buddies::accept_friend_request(db.pool(), None, request).await.unwrap();

    queries::wipe_user_data(db.pool(), "alice").await.unwrap();

    assert!(profiles::get_profile(db.pool(), "alice").await.unwrap().is_none());
    assert!(queries::list_books(db.pool(), "alice").await.unwrap().is_empty());
    assert!(!queries::are_buddies(db.pool(), "bob", "alice").await.unwrap());

    // Bob's world is intact
    assert!(profiles::get_profile(db.pool(), "bob").await.unwrap().is_some());
    assert_eq!(queries::list_books(db.pool(), "bob").await.unwrap().len(), 1);
}
