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


//! Buddy relationships and list sharing
//!
//! High-level operations combining local storage with best-effort remote
//! mirroring. The local database is always the source of truth; remote
//! failures log a warning and never roll back the local change.

use crate::error::{BookFlowError, Result};
use crate::storage::models::{
    BookSnapshot, FriendRequest, NewBook, RequestState, SharedItem, SharedItemState,
};
use crate::storage::queries;
use crate::sync::client::SyncClient;
use sqlx::SqlitePool;
use tracing::warn;

/// Send a friend request from one user to another
///
/// Returns the request id. Duplicate or self-addressed requests are rejected
/// locally before anything goes over the wire.
pub async fn send_friend_request(
    pool: &SqlitePool,
    sync: Option<&SyncClient>,
    from: &str,
    to: &str,
) -> Result<i64> {
    let request_id = queries::create_friend_request(pool, from, to).await?;

    if let Some(client) = sync {
        if let Err(e) = client.post_friend_request(from, to, "pending").await {
            warn!(from, to, error = %e, "friend request not mirrored to backend");
        }
    }

    Ok(request_id)
}

/// Accept a pending friend request
///
/// Writes the mutual friend rows for both directions; the relationship
/// becomes a buddy pair usable for sharing.
pub async fn accept_friend_request(
    pool: &SqlitePool,
    sync: Option<&SyncClient>,
    request_id: i64,
) -> Result<FriendRequest> {
    let request = require_pending_request(pool, request_id).await?;

    queries::set_friend_request_state(pool, request_id, RequestState::Accepted).await?;
    queries::add_friend_pair(pool, &request.from_username, &request.to_username).await?;

    if let Some(client) = sync {
        if let Err(e) = client
            .post_friend_request(&request.from_username, &request.to_username, "accepted")
            .await
        {
            warn!(request_id, error = %e, "acceptance not mirrored to backend");
        }
    }

    queries::find_friend_request(pool, request_id)
        .await?
        .ok_or_else(|| BookFlowError::not_found(format!("friend request {}", request_id)))
}

/// Reject a pending friend request
pub async fn reject_friend_request(
    pool: &SqlitePool,
    sync: Option<&SyncClient>,
    request_id: i64,
) -> Result<()> {
    let request = require_pending_request(pool, request_id).await?;

    queries::set_friend_request_state(pool, request_id, RequestState::Rejected).await?;

    if let Some(client) = sync {
        if let Err(e) = client
            .post_friend_request(&request.from_username, &request.to_username, "rejected")
            .await
        {
            warn!(request_id, error = %e, "rejection not mirrored to backend");
        }
    }

    Ok(())
}

/// Share a book with an accepted buddy
///
/// Takes a snapshot of the sender's book (personal fields like notes and
/// rating stay behind) and delivers it to the recipient's inbox. Sharing to
/// anyone who is not an accepted buddy is a validation error.
pub async fn share_book(
    pool: &SqlitePool,
    sync: Option<&SyncClient>,
    sender: &str,
    recipient: &str,
    book_id: i64,
) -> Result<i64> {
    if !queries::are_buddies(pool, sender, recipient).await? {
        return Err(BookFlowError::NotABuddy(recipient.to_string()));
    }

    let book = queries::find_book_by_id(pool, book_id)
        .await?
        .ok_or_else(|| BookFlowError::not_found(format!("book {}", book_id)))?;

    let snapshot = BookSnapshot::from(&book);
    let snapshot_json = serde_json::to_value(&snapshot)?;
    let snapshot_text = serde_json::to_string(&snapshot)?;

    let item_id = queries::insert_shared_item(pool, recipient, sender, &snapshot_text).await?;

    if let Some(client) = sync {
        if let Err(e) = client.post_shared_item(recipient, sender, &snapshot_json).await {
            warn!(sender, recipient, error = %e, "shared item not mirrored to backend");
        }
    }

    Ok(item_id)
}

/// Accept a shared inbox item, importing the snapshot as a local book
///
/// The imported book starts with `no-status` and a fresh uid; the recipient
/// files it however they like afterwards.
pub async fn accept_shared_item(
    pool: &SqlitePool,
    recipient: &str,
    shared_item_id: i64,
) -> Result<i64> {
    let item = require_pending_item(pool, recipient, shared_item_id).await?;
    let snapshot = item.get_snapshot()?;

    let new_book = NewBook::from_snapshot(recipient.to_string(), &snapshot);
    let book_id = queries::insert_book(pool, &new_book).await?;

    queries::set_shared_item_state(pool, shared_item_id, SharedItemState::Accepted).await?;

    Ok(book_id)
}

/// Dismiss a shared inbox item without importing it
pub async fn dismiss_shared_item(
    pool: &SqlitePool,
    recipient: &str,
    shared_item_id: i64,
) -> Result<()> {
    require_pending_item(pool, recipient, shared_item_id).await?;
    queries::set_shared_item_state(pool, shared_item_id, SharedItemState::Dismissed).await?;
    Ok(())
}

async fn require_pending_request(pool: &SqlitePool, request_id: i64) -> Result<FriendRequest> {
    let request = queries::find_friend_request(pool, request_id)
        .await?
        .ok_or_else(|| BookFlowError::not_found(format!("friend request {}", request_id)))?;

    if request.get_state() != RequestState::Pending {
        return Err(BookFlowError::DuplicateFriendRequest {
            from: request.from_username.clone(),
            to: request.to_username.clone(),
            state: request.state.clone(),
        });
    }

    Ok(request)
}

async fn require_pending_item(
    pool: &SqlitePool,
    recipient: &str,
    shared_item_id: i64,
) -> Result<SharedItem> {
    let item = queries::find_shared_item(pool, shared_item_id)
        .await?
        .ok_or_else(|| BookFlowError::not_found(format!("shared item {}", shared_item_id)))?;

    if item.recipient != recipient {
        return Err(BookFlowError::not_found(format!(
            "shared item {} for {}",
            shared_item_id, recipient
        )));
    }
    if item.get_state() != SharedItemState::Pending {
        return Err(BookFlowError::InvalidState(format!(
            "shared item {} is already {}",
            shared_item_id, item.state
        )));
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::models::ReadingStatus;

    async fn buddy_pair(pool: &SqlitePool) {
        let request_id = send_friend_request(pool, None, "alice", "bob").await.unwrap();
        accept_friend_request(pool, None, request_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_accept_creates_mutual_buddies() {
        let db = Database::new_in_memory().await.unwrap();

        let request_id = send_friend_request(db.pool(), None, "alice", "bob").await.unwrap();
        let accepted = accept_friend_request(db.pool(), None, request_id).await.unwrap();

        assert_eq!(accepted.get_state(), RequestState::Accepted);
        assert!(queries::are_buddies(db.pool(), "alice", "bob").await.unwrap());
        assert!(queries::are_buddies(db.pool(), "bob", "alice").await.unwrap());

        // A resolved request can't be accepted twice
        assert!(accept_friend_request(db.pool(), None, request_id).await.is_err());
    }

    #[tokio::test]
    async fn test_share_requires_buddy() {
        let db = Database::new_in_memory().await.unwrap();

        let book_id = queries::insert_book(
            db.pool(),
            &NewBook::new("alice".to_string(), "Dune".to_string()),
        )
        .await
        .unwrap();

        let err = share_book(db.pool(), None, "alice", "bob", book_id)
            .await
            .unwrap_err();
        assert!(matches!(err, BookFlowError::NotABuddy(_)));
    }

    #[tokio::test]
    async fn test_share_and_accept_imports_book() {
        let db = Database::new_in_memory().await.unwrap();
        buddy_pair(db.pool()).await;

        let mut new_book = NewBook::new("alice".to_string(), "Dune".to_string());
        new_book.authors = vec!["Frank Herbert".to_string()];
        new_book.status = ReadingStatus::Read;
        new_book.notes = "my private marginalia".to_string();
        let book_id = queries::insert_book(db.pool(), &new_book).await.unwrap();

        let item_id = share_book(db.pool(), None, "alice", "bob", book_id).await.unwrap();

        let inbox = queries::list_inbox(db.pool(), "bob", true).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender, "alice");

        let imported_id = accept_shared_item(db.pool(), "bob", item_id).await.unwrap();
        let imported = queries::find_book_by_id(db.pool(), imported_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(imported.username, "bob");
        assert_eq!(imported.title, "Dune");
        // Recipient copy starts unfiled and without the sender's private fields
        assert_eq!(imported.get_status(), ReadingStatus::NoStatus);
        assert!(imported.notes.is_empty());

        // Inbox item is consumed
        assert!(queries::list_inbox(db.pool(), "bob", true).await.unwrap().is_empty());
        assert!(accept_shared_item(db.pool(), "bob", item_id).await.is_err());
    }

    #[tokio::test]
    async fn test_dismiss_leaves_no_book() {
        let db = Database::new_in_memory().await.unwrap();
        buddy_pair(db.pool()).await;

        let book_id = queries::insert_book(
            db.pool(),
            &NewBook::new("alice".to_string(), "Dune".to_string()),
        )
        .await
        .unwrap();
        let item_id = share_book(db.pool(), None, "alice", "bob", book_id).await.unwrap();

        dismiss_shared_item(db.pool(), "bob", item_id).await.unwrap();

        assert!(queries::list_books(db.pool(), "bob").await.unwrap().is_empty());
        // Only the recipient can act on an inbox item
        assert!(dismiss_shared_item(db.pool(), "alice", item_id).await.is_err());
    }
}
