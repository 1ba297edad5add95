// BookFlow - Personal Reading Tracker
// Copyright (C) 2025 BookFlow contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Database query functions
//!
//! Repository pattern per entity type. All operations are async and go
//! through the shared SqlitePool.
//!
//! Two membership rules worth keeping in mind:
//! - a book belongs to a system shelf purely through its `status` column;
//! - a book belongs to a custom shelf purely through the BookShelves junction.
//! The two never interact.

use crate::error::{BookFlowError, Result};
use crate::storage::models::*;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// Insert a new book
///
/// Generates a fresh `book_uid` and returns the book_id of the inserted row.
/// Books inserted with status `read` get `finished_at` stamped immediately.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<i64> {
    let book_uid = Uuid::new_v4().to_string();
    let authors_json = serde_json::to_string(&book.authors)?;
    let finished = matches!(book.status, ReadingStatus::Read);

    let result = sqlx::query(
        r#"
        INSERT INTO Books (
            book_uid, username, title, authors, status,
            cover_url, description, page_count, rating, notes,
            series_name, series_number, sort_hint, provider, provider_id,
            finished_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                  CASE WHEN ? THEN CURRENT_TIMESTAMP ELSE NULL END)
        "#,
    )
    .bind(&book_uid)
    .bind(&book.username)
    .bind(&book.title)
    .bind(&authors_json)
    .bind(book.status.as_str())
    .bind(&book.cover_url)
    .bind(&book.description)
    .bind(book.page_count)
    .bind(book.rating)
    .bind(&book.notes)
    .bind(&book.series_name)
    .bind(book.series_number)
    .bind(book.sort_hint)
    .bind(&book.provider)
    .bind(&book.provider_id)
    .bind(finished)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find book by ID
pub async fn find_book_by_id(pool: &SqlitePool, book_id: i64) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Find book by stable uid for a user
pub async fn find_book_by_uid(
    pool: &SqlitePool,
    username: &str,
    book_uid: &str,
) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(
        "SELECT * FROM Books WHERE username = ? AND book_uid = ?",
    )
    .bind(username)
    .bind(book_uid)
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

/// Update an existing book's mutable fields
///
/// Status is intentionally not written here; use [`set_book_status`] so the
/// `finished_at` stamp stays consistent.
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE Books SET
            title = ?, authors = ?, cover_url = ?, description = ?,
            page_count = ?, rating = ?, notes = ?,
            series_name = ?, series_number = ?, sort_hint = ?,
            provider = ?, provider_id = ?
        WHERE book_id = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.authors)
    .bind(&book.cover_url)
    .bind(&book.description)
    .bind(book.page_count)
    .bind(book.rating)
    .bind(&book.notes)
    .bind(&book.series_name)
    .bind(book.series_number)
    .bind(book.sort_hint)
    .bind(&book.provider)
    .bind(&book.provider_id)
    .bind(book.book_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Change a book's reading status
///
/// Moving to `read` stamps `finished_at` the first time only, so re-reading
/// does not move a book between challenge years.
pub async fn set_book_status(
    pool: &SqlitePool,
    book_id: i64,
    status: ReadingStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE Books SET
            status = ?,
            finished_at = CASE
                WHEN ? AND finished_at IS NULL THEN CURRENT_TIMESTAMP
                ELSE finished_at
            END
        WHERE book_id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(matches!(status, ReadingStatus::Read))
    .bind(book_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Set the manual ordering hint
pub async fn set_sort_hint(pool: &SqlitePool, book_id: i64, sort_hint: Option<i32>) -> Result<()> {
    sqlx::query("UPDATE Books SET sort_hint = ? WHERE book_id = ?")
        .bind(sort_hint)
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// List all books for a user
pub async fn list_books(pool: &SqlitePool, username: &str) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM Books WHERE username = ? ORDER BY title",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// List books with a given reading status
pub async fn list_books_by_status(
    pool: &SqlitePool,
    username: &str,
    status: ReadingStatus,
) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM Books WHERE username = ? AND status = ? ORDER BY title",
    )
    .bind(username)
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Search local books by title or author substring
pub async fn search_books(pool: &SqlitePool, username: &str, query: &str) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", query);
    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM Books WHERE username = ? AND (title LIKE ? OR authors LIKE ?) ORDER BY title",
    )
    .bind(username)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Count books per reading status
pub async fn count_books_by_status(
    pool: &SqlitePool,
    username: &str,
    status: ReadingStatus,
) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM Books WHERE username = ? AND status = ?")
            .bind(username)
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Count books finished within a calendar year
///
/// Feeds yearly challenge progress.
pub async fn count_books_finished_in_year(
    pool: &SqlitePool,
    username: &str,
    year: i32,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM Books
        WHERE username = ? AND status = 'read'
          AND finished_at IS NOT NULL
          AND CAST(strftime('%Y', finished_at) AS INTEGER) = ?
        "#,
    )
    .bind(username)
    .bind(year)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Delete a book (junction rows removed via CASCADE)
pub async fn delete_book(pool: &SqlitePool, book_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM Books WHERE book_id = ?")
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(())
}

// ============================================================================
// SHELF QUERIES
// ============================================================================

/// Fixed uids for the three status-backed system shelves
const SYSTEM_SHELVES: [(&str, &str, ReadingStatus); 3] = [
    ("system-want-to-read", "Want to Read", ReadingStatus::WantToRead),
    ("system-reading", "Currently Reading", ReadingStatus::Reading),
    ("system-read", "Read", ReadingStatus::Read),
];

/// Create the three system shelves for a user if missing
///
/// Idempotent; called whenever a profile is created or loaded.
pub async fn ensure_system_shelves(pool: &SqlitePool, username: &str) -> Result<()> {
    for (uid, name, status) in SYSTEM_SHELVES {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO Shelves (shelf_uid, username, name, is_system, status_backed)
            VALUES (?, ?, ?, 1, ?)
            "#,
        )
        .bind(uid)
        .bind(username)
        .bind(name)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Create a custom shelf
///
/// Returns the shelf_id. Duplicate names for the same user are rejected.
pub async fn create_shelf(pool: &SqlitePool, shelf: &NewShelf) -> Result<i64> {
    if shelf.name.trim().is_empty() {
        return Err(BookFlowError::invalid_input("Shelf name cannot be empty"));
    }

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT shelf_id FROM Shelves WHERE username = ? AND name = ?")
            .bind(&shelf.username)
            .bind(&shelf.name)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(BookFlowError::invalid_input(format!(
            "Shelf '{}' already exists",
            shelf.name
        )));
    }

    let shelf_uid = Uuid::new_v4().to_string();
    let result = sqlx::query(
        "INSERT INTO Shelves (shelf_uid, username, name, is_system) VALUES (?, ?, ?, 0)",
    )
    .bind(&shelf_uid)
    .bind(&shelf.username)
    .bind(&shelf.name)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find shelf by stable uid for a user
pub async fn find_shelf_by_uid(
    pool: &SqlitePool,
    username: &str,
    shelf_uid: &str,
) -> Result<Option<Shelf>> {
    let shelf = sqlx::query_as::<_, Shelf>(
        "SELECT * FROM Shelves WHERE username = ? AND shelf_uid = ?",
    )
    .bind(username)
    .bind(shelf_uid)
    .fetch_optional(pool)
    .await?;

    Ok(shelf)
}

/// Find shelf by name for a user
pub async fn find_shelf_by_name(
    pool: &SqlitePool,
    username: &str,
    name: &str,
) -> Result<Option<Shelf>> {
    let shelf = sqlx::query_as::<_, Shelf>(
        "SELECT * FROM Shelves WHERE username = ? AND name = ?",
    )
    .bind(username)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(shelf)
}

/// List all shelves for a user (system shelves first, then by name)
pub async fn list_shelves(pool: &SqlitePool, username: &str) -> Result<Vec<Shelf>> {
    let shelves = sqlx::query_as::<_, Shelf>(
        "SELECT * FROM Shelves WHERE username = ? ORDER BY is_system DESC, name",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(shelves)
}

/// Rename a custom shelf
pub async fn rename_shelf(pool: &SqlitePool, shelf_id: i64, new_name: &str) -> Result<()> {
    let shelf = require_shelf(pool, shelf_id).await?;
    if shelf.is_system {
        return Err(BookFlowError::SystemShelfImmutable(shelf.name));
    }
    if new_name.trim().is_empty() {
        return Err(BookFlowError::invalid_input("Shelf name cannot be empty"));
    }

    sqlx::query("UPDATE Shelves SET name = ? WHERE shelf_id = ?")
        .bind(new_name)
        .bind(shelf_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a custom shelf
///
/// Membership rows disappear via CASCADE; the books themselves are untouched.
pub async fn delete_shelf(pool: &SqlitePool, shelf_id: i64) -> Result<()> {
    let shelf = require_shelf(pool, shelf_id).await?;
    if shelf.is_system {
        return Err(BookFlowError::SystemShelfImmutable(shelf.name));
    }

    sqlx::query("DELETE FROM Shelves WHERE shelf_id = ?")
        .bind(shelf_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Add a book to a custom shelf
///
/// System shelves reject explicit membership; they mirror `Book.status`.
pub async fn add_book_to_shelf(pool: &SqlitePool, book_id: i64, shelf_id: i64) -> Result<()> {
    let shelf = require_shelf(pool, shelf_id).await?;
    if shelf.is_system {
        return Err(BookFlowError::SystemShelfImmutable(shelf.name));
    }

    sqlx::query("INSERT OR IGNORE INTO BookShelves (book_id, shelf_id) VALUES (?, ?)")
        .bind(book_id)
        .bind(shelf_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove a book from a custom shelf
pub async fn remove_book_from_shelf(pool: &SqlitePool, book_id: i64, shelf_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM BookShelves WHERE book_id = ? AND shelf_id = ?")
        .bind(book_id)
        .bind(shelf_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// List books on a shelf
///
/// System shelves resolve through `Book.status`; custom shelves through the
/// junction table.
pub async fn list_books_for_shelf(pool: &SqlitePool, shelf: &Shelf) -> Result<Vec<Book>> {
    if let Some(status) = shelf.backed_status() {
        return list_books_by_status(pool, &shelf.username, status).await;
    }

    let books = sqlx::query_as::<_, Book>(
        r#"
        SELECT b.* FROM Books b
        INNER JOIN BookShelves bs ON b.book_id = bs.book_id
        WHERE bs.shelf_id = ?
        ORDER BY b.title
        "#,
    )
    .bind(shelf.shelf_id)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Count books on a shelf
pub async fn count_books_in_shelf(pool: &SqlitePool, shelf: &Shelf) -> Result<i64> {
    if let Some(status) = shelf.backed_status() {
        return count_books_by_status(pool, &shelf.username, status).await;
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM BookShelves WHERE shelf_id = ?")
        .bind(shelf.shelf_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// List custom-shelf uids a book belongs to
pub async fn list_shelf_uids_for_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<String>> {
    let uids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT s.shelf_uid FROM Shelves s
        INNER JOIN BookShelves bs ON s.shelf_id = bs.shelf_id
        WHERE bs.book_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(uids)
}

async fn require_shelf(pool: &SqlitePool, shelf_id: i64) -> Result<Shelf> {
    find_shelf_by_id(pool, shelf_id)
        .await?
        .ok_or_else(|| BookFlowError::not_found(format!("shelf {}", shelf_id)))
}

/// Find shelf by ID
pub async fn find_shelf_by_id(pool: &SqlitePool, shelf_id: i64) -> Result<Option<Shelf>> {
    let shelf = sqlx::query_as::<_, Shelf>("SELECT * FROM Shelves WHERE shelf_id = ?")
        .bind(shelf_id)
        .fetch_optional(pool)
        .await?;

    Ok(shelf)
}

// ============================================================================
// READING CHALLENGE QUERIES
// ============================================================================

/// Insert or update the challenge for (username, year)
///
/// Returns the challenge_id (either existing or newly created).
pub async fn upsert_challenge(pool: &SqlitePool, challenge: &NewReadingChallenge) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO ReadingChallenges (username, year, target_books, weekly_page_target, weekly_plan)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(username, year) DO UPDATE SET
            target_books = excluded.target_books,
            weekly_page_target = excluded.weekly_page_target,
            weekly_plan = excluded.weekly_plan,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&challenge.username)
    .bind(challenge.year)
    .bind(challenge.target_books)
    .bind(challenge.weekly_page_target)
    .bind(&challenge.weekly_plan)
    .execute(pool)
    .await?;

    let id: i64 =
        sqlx::query_scalar("SELECT challenge_id FROM ReadingChallenges WHERE username = ? AND year = ?")
            .bind(&challenge.username)
            .bind(challenge.year)
            .fetch_one(pool)
            .await?;

    Ok(id)
}

/// Find the challenge for (username, year)
pub async fn find_challenge(
    pool: &SqlitePool,
    username: &str,
    year: i32,
) -> Result<Option<ReadingChallenge>> {
    let challenge = sqlx::query_as::<_, ReadingChallenge>(
        "SELECT * FROM ReadingChallenges WHERE username = ? AND year = ?",
    )
    .bind(username)
    .bind(year)
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

/// Record (or correct) a cumulative pages-read entry for a day
///
/// One entry per (username, date, book); re-recording overwrites.
pub async fn record_reading_log(
    pool: &SqlitePool,
    username: &str,
    log_date: NaiveDate,
    cumulative_pages: i64,
    book_uid: Option<&str>,
) -> Result<()> {
    // NULL book_uid rows need the IS NULL match; UNIQUE won't catch them
    let existing: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT log_id FROM ReadingLogs
        WHERE username = ? AND log_date = ?
          AND (book_uid = ? OR (book_uid IS NULL AND ? IS NULL))
        "#,
    )
    .bind(username)
    .bind(log_date)
    .bind(book_uid)
    .bind(book_uid)
    .fetch_optional(pool)
    .await?;

    if let Some(log_id) = existing {
        sqlx::query("UPDATE ReadingLogs SET cumulative_pages = ? WHERE log_id = ?")
            .bind(cumulative_pages)
            .bind(log_id)
            .execute(pool)
            .await?;
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO ReadingLogs (username, log_date, cumulative_pages, book_uid) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(log_date)
    .bind(cumulative_pages)
    .bind(book_uid)
    .execute(pool)
    .await?;

    Ok(())
}

/// List reading logs for a user within a date range (inclusive)
pub async fn list_reading_logs(
    pool: &SqlitePool,
    username: &str,
    from: NaiveDate,
    to: NaiveDate,
    book_uid: Option<&str>,
) -> Result<Vec<ReadingLog>> {
    let logs = sqlx::query_as::<_, ReadingLog>(
        r#"
        SELECT * FROM ReadingLogs
        WHERE username = ? AND log_date >= ? AND log_date <= ?
          AND (book_uid = ? OR (book_uid IS NULL AND ? IS NULL))
        ORDER BY log_date
        "#,
    )
    .bind(username)
    .bind(from)
    .bind(to)
    .bind(book_uid)
    .bind(book_uid)
    .fetch_all(pool)
    .await?;

    Ok(logs)
}

/// Collapse reading logs into the cumulative map the goal calculator takes
pub fn reading_log_map(logs: &[ReadingLog]) -> BTreeMap<NaiveDate, i64> {
    logs.iter()
        .map(|log| (log.log_date, log.cumulative_pages))
        .collect()
}

// ============================================================================
// FRIEND / BUDDY QUERIES
// ============================================================================

/// Create a pending friend request
///
/// Rejects duplicates in either direction unless the earlier request was
/// rejected (a rejected request may be retried).
pub async fn create_friend_request(pool: &SqlitePool, from: &str, to: &str) -> Result<i64> {
    if from == to {
        return Err(BookFlowError::invalid_input(
            "Cannot send a friend request to yourself",
        ));
    }

    let existing = find_friend_request_between(pool, from, to).await?;
    if let Some(request) = existing {
        match request.get_state() {
            RequestState::Rejected => {
                // Reopen as pending from the new sender
                sqlx::query(
                    "UPDATE FriendRequests SET from_username = ?, to_username = ?, state = 'pending', updated_at = CURRENT_TIMESTAMP WHERE request_id = ?",
                )
                .bind(from)
                .bind(to)
                .bind(request.request_id)
                .execute(pool)
                .await?;
                return Ok(request.request_id);
            }
            state => {
                return Err(BookFlowError::DuplicateFriendRequest {
                    from: from.to_string(),
                    to: to.to_string(),
                    state: state.as_str().to_string(),
                });
            }
        }
    }

    let result = sqlx::query(
        "INSERT INTO FriendRequests (from_username, to_username, state) VALUES (?, ?, 'pending')",
    )
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find a friend request between two users, in either direction
pub async fn find_friend_request_between(
    pool: &SqlitePool,
    a: &str,
    b: &str,
) -> Result<Option<FriendRequest>> {
    let request = sqlx::query_as::<_, FriendRequest>(
        r#"
        SELECT * FROM FriendRequests
        WHERE (from_username = ? AND to_username = ?)
           OR (from_username = ? AND to_username = ?)
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Find friend request by ID
pub async fn find_friend_request(pool: &SqlitePool, request_id: i64) -> Result<Option<FriendRequest>> {
    let request = sqlx::query_as::<_, FriendRequest>(
        "SELECT * FROM FriendRequests WHERE request_id = ?",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Set the state of a friend request
pub async fn set_friend_request_state(
    pool: &SqlitePool,
    request_id: i64,
    state: RequestState,
) -> Result<()> {
    sqlx::query(
        "UPDATE FriendRequests SET state = ?, updated_at = CURRENT_TIMESTAMP WHERE request_id = ?",
    )
    .bind(state.as_str())
    .bind(request_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// List pending requests addressed to a user
pub async fn list_incoming_requests(pool: &SqlitePool, username: &str) -> Result<Vec<FriendRequest>> {
    let requests = sqlx::query_as::<_, FriendRequest>(
        "SELECT * FROM FriendRequests WHERE to_username = ? AND state = 'pending' ORDER BY created_at",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// List pending requests sent by a user
pub async fn list_outgoing_requests(pool: &SqlitePool, username: &str) -> Result<Vec<FriendRequest>> {
    let requests = sqlx::query_as::<_, FriendRequest>(
        "SELECT * FROM FriendRequests WHERE from_username = ? AND state = 'pending' ORDER BY created_at",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// Write the mutual friend rows for an accepted request
pub async fn add_friend_pair(pool: &SqlitePool, a: &str, b: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO Friends (username, buddy_username) VALUES (?, ?)")
        .bind(a)
        .bind(b)
        .execute(pool)
        .await?;
    sqlx::query("INSERT OR IGNORE INTO Friends (username, buddy_username) VALUES (?, ?)")
        .bind(b)
        .bind(a)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove both directions of a buddy relationship
pub async fn remove_friend_pair(pool: &SqlitePool, a: &str, b: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM Friends
        WHERE (username = ? AND buddy_username = ?)
           OR (username = ? AND buddy_username = ?)
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's buddies
pub async fn list_friends(pool: &SqlitePool, username: &str) -> Result<Vec<Friend>> {
    let friends = sqlx::query_as::<_, Friend>(
        "SELECT * FROM Friends WHERE username = ? ORDER BY buddy_username",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(friends)
}

/// Check whether two users are accepted buddies
pub async fn are_buddies(pool: &SqlitePool, a: &str, b: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM Friends WHERE username = ? AND buddy_username = ?",
    )
    .bind(a)
    .bind(b)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

// ============================================================================
// SHARED ITEM (INBOX) QUERIES
// ============================================================================

/// Deliver a shared book snapshot to a recipient's inbox
pub async fn insert_shared_item(
    pool: &SqlitePool,
    recipient: &str,
    sender: &str,
    book_snapshot: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO SharedItems (recipient, sender, book_snapshot, state) VALUES (?, ?, ?, 'pending')",
    )
    .bind(recipient)
    .bind(sender)
    .bind(book_snapshot)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find shared item by ID
pub async fn find_shared_item(pool: &SqlitePool, shared_item_id: i64) -> Result<Option<SharedItem>> {
    let item = sqlx::query_as::<_, SharedItem>(
        "SELECT * FROM SharedItems WHERE shared_item_id = ?",
    )
    .bind(shared_item_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

/// List a recipient's inbox, newest first
///
/// `pending_only` filters out items already accepted or dismissed.
pub async fn list_inbox(
    pool: &SqlitePool,
    recipient: &str,
    pending_only: bool,
) -> Result<Vec<SharedItem>> {
    let items = if pending_only {
        sqlx::query_as::<_, SharedItem>(
            "SELECT * FROM SharedItems WHERE recipient = ? AND state = 'pending' ORDER BY created_at DESC",
        )
        .bind(recipient)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, SharedItem>(
            "SELECT * FROM SharedItems WHERE recipient = ? ORDER BY created_at DESC",
        )
        .bind(recipient)
        .fetch_all(pool)
        .await?
    };

    Ok(items)
}

/// Set the state of a shared inbox item
pub async fn set_shared_item_state(
    pool: &SqlitePool,
    shared_item_id: i64,
    state: SharedItemState,
) -> Result<()> {
    sqlx::query("UPDATE SharedItems SET state = ? WHERE shared_item_id = ?")
        .bind(state.as_str())
        .bind(shared_item_id)
        .execute(pool)
        .await?;

    Ok(())
}

// ============================================================================
// ACCOUNT-WIDE HELPERS
// ============================================================================

/// Delete every row belonging to a username, across all tables
///
/// Used after a successful remote account deletion. Irreversible.
pub async fn wipe_user_data(pool: &SqlitePool, username: &str) -> Result<()> {
    // BookShelves rows go via CASCADE when Books/Shelves are deleted
    sqlx::query("DELETE FROM Books WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM Shelves WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM ReadingChallenges WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM ReadingLogs WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM FriendRequests WHERE from_username = ? OR to_username = ?")
        .bind(username)
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM Friends WHERE username = ? OR buddy_username = ?")
        .bind(username)
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM SharedItems WHERE recipient = ? OR sender = ?")
        .bind(username)
        .bind(username)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM Profiles WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(())
}
