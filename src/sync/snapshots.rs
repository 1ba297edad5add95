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


//! Snapshot payloads per collection
//!
//! Builds a whole collection into a JSON payload and applies a pulled payload
//! back by replacing the local collection. There is no row-level merging:
//! apply wipes the user's rows for that collection and reinserts, which is
//! exactly the last-write-wins granularity the backend promises.
//!
//! Unknown shelf uids in a restored book's membership list are skipped
//! silently; no referential integrity is enforced across devices.

use crate::error::{BookFlowError, Result};
use crate::storage::models::ReadingStatus;
use crate::storage::queries;
use crate::sync::client::Collection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

// ============================================================================
// PAYLOAD SHAPES
// ============================================================================

/// One book inside the `books` collection payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPayload {
    pub book_uid: String,
    pub title: String,
    pub authors: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub series_number: Option<f32>,
    #[serde(default)]
    pub sort_hint: Option<i32>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Custom-shelf membership by shelf uid
    #[serde(default)]
    pub shelf_uids: Vec<String>,
}

/// One custom shelf inside the `shelves` collection payload
///
/// System shelves are fixed and never travel; each device provisions its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfPayload {
    pub shelf_uid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The `challenge` collection payload: challenge rows plus reading logs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChallengePayload {
    #[serde(default)]
    pub challenges: Vec<ChallengeRow>,
    #[serde(default)]
    pub logs: Vec<LogRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRow {
    pub year: i32,
    pub target_books: i32,
    #[serde(default)]
    pub weekly_page_target: Option<i32>,
    #[serde(default)]
    pub weekly_plan: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRow {
    pub log_date: NaiveDate,
    pub cumulative_pages: i64,
    #[serde(default)]
    pub book_uid: Option<String>,
}

/// The `friends` collection payload: requests plus accepted buddy rows
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FriendsPayload {
    #[serde(default)]
    pub requests: Vec<RequestRow>,
    #[serde(default)]
    pub friends: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRow {
    pub from_username: String,
    pub to_username: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One inbox row inside the `shared-items` collection payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedItemRow {
    pub sender: String,
    pub book_snapshot: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// BUILD
// ============================================================================

/// Serialize a user's collection into its JSON payload
pub async fn build_payload(
    pool: &SqlitePool,
    username: &str,
    collection: Collection,
) -> Result<serde_json::Value> {
    let value = match collection {
        Collection::Books => {
            let books = queries::list_books(pool, username).await?;
            let mut payloads = Vec::with_capacity(books.len());
            for book in &books {
                let shelf_uids = queries::list_shelf_uids_for_book(pool, book.book_id).await?;
                payloads.push(BookPayload {
                    book_uid: book.book_uid.clone(),
                    title: book.title.clone(),
                    authors: book.get_authors(),
                    status: book.status.clone(),
                    cover_url: book.cover_url.clone(),
                    description: book.description.clone(),
                    page_count: book.page_count,
                    rating: book.rating,
                    notes: book.notes.clone(),
                    series_name: book.series_name.clone(),
                    series_number: book.series_number,
                    sort_hint: book.sort_hint,
                    provider: book.provider.clone(),
                    provider_id: book.provider_id.clone(),
                    created_at: book.created_at,
                    updated_at: book.updated_at,
                    finished_at: book.finished_at,
                    shelf_uids,
                });
            }
            serde_json::to_value(payloads)?
        }
        Collection::Shelves => {
            let shelves = queries::list_shelves(pool, username).await?;
            let payloads: Vec<ShelfPayload> = shelves
                .iter()
                .filter(|s| !s.is_system)
                .map(|s| ShelfPayload {
                    shelf_uid: s.shelf_uid.clone(),
                    name: s.name.clone(),
                    created_at: s.created_at,
                })
                .collect();
            serde_json::to_value(payloads)?
        }
        Collection::Challenge => {
            let rows = sqlx::query_as::<_, crate::storage::models::ReadingChallenge>(
                "SELECT * FROM ReadingChallenges WHERE username = ? ORDER BY year",
            )
            .bind(username)
            .fetch_all(pool)
            .await?;
            let logs = sqlx::query_as::<_, crate::storage::models::ReadingLog>(
                "SELECT * FROM ReadingLogs WHERE username = ? ORDER BY log_date",
            )
            .bind(username)
            .fetch_all(pool)
            .await?;

            let payload = ChallengePayload {
                challenges: rows
                    .iter()
                    .map(|c| ChallengeRow {
                        year: c.year,
                        target_books: c.target_books,
                        weekly_page_target: c.weekly_page_target,
                        weekly_plan: c.weekly_plan.clone(),
                        updated_at: c.updated_at,
                    })
                    .collect(),
                logs: logs
                    .iter()
                    .map(|l| LogRow {
                        log_date: l.log_date,
                        cumulative_pages: l.cumulative_pages,
                        book_uid: l.book_uid.clone(),
                    })
                    .collect(),
            };
            serde_json::to_value(payload)?
        }
        Collection::Friends => {
            let requests = sqlx::query_as::<_, crate::storage::models::FriendRequest>(
                "SELECT * FROM FriendRequests WHERE from_username = ? OR to_username = ? ORDER BY created_at",
            )
            .bind(username)
            .bind(username)
            .fetch_all(pool)
            .await?;
            let friends = queries::list_friends(pool, username).await?;

            let payload = FriendsPayload {
                requests: requests
                    .iter()
                    .map(|r| RequestRow {
                        from_username: r.from_username.clone(),
                        to_username: r.to_username.clone(),
                        state: r.state.clone(),
                        created_at: r.created_at,
                        updated_at: r.updated_at,
                    })
                    .collect(),
                friends: friends.iter().map(|f| f.buddy_username.clone()).collect(),
            };
            serde_json::to_value(payload)?
        }
        Collection::SharedItems => {
            let items = queries::list_inbox(pool, username, false).await?;
            let payloads: Vec<SharedItemRow> = items
                .iter()
                .map(|i| SharedItemRow {
                    sender: i.sender.clone(),
                    book_snapshot: i.book_snapshot.clone(),
                    state: i.state.clone(),
                    created_at: i.created_at,
                })
                .collect();
            serde_json::to_value(payloads)?
        }
    };

    Ok(value)
}

// ============================================================================
// APPLY
// ============================================================================

/// Replace a user's local collection with a pulled payload
///
/// Whole-collection semantics: existing rows for the collection are deleted
/// first. Callers are expected to have already won the last-write-wins check.
pub async fn apply_payload(
    pool: &SqlitePool,
    username: &str,
    collection: Collection,
    payload: &serde_json::Value,
) -> Result<()> {
    match collection {
        Collection::Books => {
            let books: Vec<BookPayload> = serde_json::from_value(payload.clone())
                .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

            sqlx::query("DELETE FROM Books WHERE username = ?")
                .bind(username)
                .execute(pool)
                .await?;

            for book in &books {
                let authors_json = serde_json::to_string(&book.authors)?;
                // Normalize unknown status strings on the way in
                let status = ReadingStatus::from_str(&book.status).as_str();

                let result = sqlx::query(
                    r#"
                    INSERT INTO Books (
                        book_uid, username, title, authors, status,
                        cover_url, description, page_count, rating, notes,
                        series_name, series_number, sort_hint, provider, provider_id,
                        created_at, updated_at, finished_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&book.book_uid)
                .bind(username)
                .bind(&book.title)
                .bind(&authors_json)
                .bind(status)
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
                .bind(book.created_at)
                .bind(book.updated_at)
                .bind(book.finished_at)
                .execute(pool)
                .await?;

                let book_id = result.last_insert_rowid();
                for shelf_uid in &book.shelf_uids {
                    // Unknown shelves are skipped; membership is best-effort
                    if let Some(shelf) =
                        queries::find_shelf_by_uid(pool, username, shelf_uid).await?
                    {
                        if !shelf.is_system {
                            sqlx::query(
                                "INSERT OR IGNORE INTO BookShelves (book_id, shelf_id) VALUES (?, ?)",
                            )
                            .bind(book_id)
                            .bind(shelf.shelf_id)
                            .execute(pool)
                            .await?;
                        }
                    }
                }
            }
        }
        Collection::Shelves => {
            let shelves: Vec<ShelfPayload> = serde_json::from_value(payload.clone())
                .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

            sqlx::query("DELETE FROM Shelves WHERE username = ? AND is_system = 0")
                .bind(username)
                .execute(pool)
                .await?;
            queries::ensure_system_shelves(pool, username).await?;

            for shelf in &shelves {
                sqlx::query(
                    "INSERT INTO Shelves (shelf_uid, username, name, is_system, created_at) VALUES (?, ?, ?, 0, ?)",
                )
                .bind(&shelf.shelf_uid)
                .bind(username)
                .bind(&shelf.name)
                .bind(shelf.created_at)
                .execute(pool)
                .await?;
            }
        }
        Collection::Challenge => {
            let payload: ChallengePayload = serde_json::from_value(payload.clone())
                .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

            sqlx::query("DELETE FROM ReadingChallenges WHERE username = ?")
                .bind(username)
                .execute(pool)
                .await?;
            sqlx::query("DELETE FROM ReadingLogs WHERE username = ?")
                .bind(username)
                .execute(pool)
                .await?;

            for challenge in &payload.challenges {
                sqlx::query(
                    r#"
                    INSERT INTO ReadingChallenges (username, year, target_books, weekly_page_target, weekly_plan, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(username)
                .bind(challenge.year)
                .bind(challenge.target_books)
                .bind(challenge.weekly_page_target)
                .bind(&challenge.weekly_plan)
                .bind(challenge.updated_at)
                .execute(pool)
                .await?;
            }

            for log in &payload.logs {
                sqlx::query(
                    "INSERT INTO ReadingLogs (username, log_date, cumulative_pages, book_uid) VALUES (?, ?, ?, ?)",
                )
                .bind(username)
                .bind(log.log_date)
                .bind(log.cumulative_pages)
                .bind(&log.book_uid)
                .execute(pool)
                .await?;
            }
        }
        Collection::Friends => {
            let payload: FriendsPayload = serde_json::from_value(payload.clone())
                .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

            sqlx::query("DELETE FROM FriendRequests WHERE from_username = ? OR to_username = ?")
                .bind(username)
                .bind(username)
                .execute(pool)
                .await?;
            sqlx::query("DELETE FROM Friends WHERE username = ?")
                .bind(username)
                .execute(pool)
                .await?;

            for request in &payload.requests {
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO FriendRequests (from_username, to_username, state, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&request.from_username)
                .bind(&request.to_username)
                .bind(&request.state)
                .bind(request.created_at)
                .bind(request.updated_at)
                .execute(pool)
                .await?;
            }

            for buddy in &payload.friends {
                sqlx::query(
                    "INSERT OR IGNORE INTO Friends (username, buddy_username) VALUES (?, ?)",
                )
                .bind(username)
                .bind(buddy)
                .execute(pool)
                .await?;
            }
        }
        Collection::SharedItems => {
            let items: Vec<SharedItemRow> = serde_json::from_value(payload.clone())
                .map_err(|e| BookFlowError::InvalidSnapshot(e.to_string()))?;

            sqlx::query("DELETE FROM SharedItems WHERE recipient = ?")
                .bind(username)
                .execute(pool)
                .await?;

            for item in &items {
                sqlx::query(
                    r#"
                    INSERT INTO SharedItems (recipient, sender, book_snapshot, state, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(username)
                .bind(&item.sender)
                .bind(&item.book_snapshot)
                .bind(&item.state)
                .bind(item.created_at)
                .execute(pool)
                .await?;
            }
        }
    }

    Ok(())
}

// ============================================================================
// LOCAL FRESHNESS
// ============================================================================

/// Newest row timestamp in a user's local collection
///
/// Feeds the last-write-wins check when pulling. None means the local
/// collection is empty and any remote snapshot wins.
pub async fn local_updated_at(
    pool: &SqlitePool,
    username: &str,
    collection: Collection,
) -> Result<Option<DateTime<Utc>>> {
    let timestamp: Option<DateTime<Utc>> = match collection {
        Collection::Books => {
            sqlx::query_scalar("SELECT MAX(updated_at) FROM Books WHERE username = ?")
                .bind(username)
                .fetch_one(pool)
                .await?
        }
        Collection::Shelves => {
            sqlx::query_scalar(
                "SELECT MAX(created_at) FROM Shelves WHERE username = ? AND is_system = 0",
            )
            .bind(username)
            .fetch_one(pool)
            .await?
        }
        Collection::Challenge => {
            let challenge: Option<DateTime<Utc>> = sqlx::query_scalar(
                "SELECT MAX(updated_at) FROM ReadingChallenges WHERE username = ?",
            )
            .bind(username)
            .fetch_one(pool)
            .await?;
            let logs: Option<DateTime<Utc>> =
                sqlx::query_scalar("SELECT MAX(created_at) FROM ReadingLogs WHERE username = ?")
                    .bind(username)
                    .fetch_one(pool)
                    .await?;
            challenge.max(logs)
        }
        Collection::Friends => {
            let requests: Option<DateTime<Utc>> = sqlx::query_scalar(
                "SELECT MAX(updated_at) FROM FriendRequests WHERE from_username = ? OR to_username = ?",
            )
            .bind(username)
            .bind(username)
            .fetch_one(pool)
            .await?;
            let friends: Option<DateTime<Utc>> =
                sqlx::query_scalar("SELECT MAX(created_at) FROM Friends WHERE username = ?")
                    .bind(username)
                    .fetch_one(pool)
                    .await?;
            requests.max(friends)
        }
        Collection::SharedItems => {
            sqlx::query_scalar("SELECT MAX(created_at) FROM SharedItems WHERE recipient = ?")
                .bind(username)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::{NewBook, NewShelf};

    #[tokio::test]
    async fn test_books_payload_round_trip() {
        let db = Database::new_in_memory().await.unwrap();
        queries::ensure_system_shelves(db.pool(), "alice").await.unwrap();

        let shelf_id = queries::create_shelf(
            db.pool(),
            &NewShelf::new("alice".to_string(), "Sci-Fi".to_string()),
        )
        .await
        .unwrap();

        let mut new_book = NewBook::new("alice".to_string(), "Dune".to_string());
        new_book.authors = vec!["Frank Herbert".to_string()];
        new_book.status = ReadingStatus::Reading;
        let book_id = queries::insert_book(db.pool(), &new_book).await.unwrap();
        queries::add_book_to_shelf(db.pool(), book_id, shelf_id).await.unwrap();

        // Build on device A
        let shelves_payload = build_payload(db.pool(), "alice", Collection::Shelves).await.unwrap();
        let books_payload = build_payload(db.pool(), "alice", Collection::Books).await.unwrap();

        // Apply on device B (fresh database)
        let db2 = Database::new_in_memory().await.unwrap();
        apply_payload(db2.pool(), "alice", Collection::Shelves, &shelves_payload)
            .await
            .unwrap();
        apply_payload(db2.pool(), "alice", Collection::Books, &books_payload)
            .await
            .unwrap();

        let restored = queries::list_books(db2.pool(), "alice").await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].title, "Dune");
        assert_eq!(restored[0].get_status(), ReadingStatus::Reading);

        // Membership survived via shelf uid
        let uids = queries::list_shelf_uids_for_book(db2.pool(), restored[0].book_id)
            .await
            .unwrap();
        assert_eq!(uids.len(), 1);

        // System shelves were provisioned, not copied
        let shelves = queries::list_shelves(db2.pool(), "alice").await.unwrap();
        assert_eq!(shelves.iter().filter(|s| s.is_system).count(), 3);
        assert_eq!(shelves.iter().filter(|s| !s.is_system).count(), 1);
    }

    #[tokio::test]
    async fn test_books_apply_skips_unknown_shelf_uids() {
        let db = Database::new_in_memory().await.unwrap();
        queries::ensure_system_shelves(db.pool(), "alice").await.unwrap();

        let payload = serde_json::json!([{
            "book_uid": "uid-1",
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "status": "reading",
            "created_at": "2025-06-01T00:00:00Z",
            "updated_at": "2025-06-01T00:00:00Z",
            "shelf_uids": ["never-seen-on-this-device"]
        }]);

        apply_payload(db.pool(), "alice", Collection::Books, &payload)
            .await
            .unwrap();

        let books = queries::list_books(db.pool(), "alice").await.unwrap();
        assert_eq!(books.len(), 1);
        let uids = queries::list_shelf_uids_for_book(db.pool(), books[0].book_id)
            .await
            .unwrap();
        assert!(uids.is_empty());
    }

    #[tokio::test]
    async fn test_challenge_payload_round_trip() {
        let db = Database::new_in_memory().await.unwrap();

        let mut challenge =
            crate::storage::models::NewReadingChallenge::new("alice".to_string(), 2025, 24);
        challenge.weekly_page_target = Some(200);
        queries::upsert_challenge(db.pool(), &challenge).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        queries::record_reading_log(db.pool(), "alice", day, 55, None).await.unwrap();

        let payload = build_payload(db.pool(), "alice", Collection::Challenge).await.unwrap();

        let db2 = Database::new_in_memory().await.unwrap();
        apply_payload(db2.pool(), "alice", Collection::Challenge, &payload)
            .await
            .unwrap();

        let restored = queries::find_challenge(db2.pool(), "alice", 2025)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored.target_books, 24);
        assert_eq!(restored.weekly_page_target, Some(200));

        let logs = queries::list_reading_logs(db2.pool(), "alice", day, day, None)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].cumulative_pages, 55);
    }

    #[tokio::test]
    async fn test_local_updated_at_empty_collection() {
        let db = Database::new_in_memory().await.unwrap();
        let updated = local_updated_at(db.pool(), "alice", Collection::Books)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        let bad = serde_json::json!({"not": "a list"});
        let err = apply_payload(db.pool(), "alice", Collection::Books, &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, BookFlowError::InvalidSnapshot(_)));
    }
}
