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


//! Optional best-effort cloud sync
//!
//! Persistence is local-first; the backend only holds whole-collection JSON
//! snapshots per user, overwritten on every push and reconciled on pull by
//! last-write-wins. Nothing in the app depends on sync succeeding: the `try_*`
//! methods log a warning and move on, matching the offline-tolerant behavior
//! users expect from a device-local tracker.

pub mod buddies;
pub mod client;
pub mod snapshots;

use crate::error::Result;
use crate::storage::queries;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

// Re-export commonly used types
pub use client::{Collection, SnapshotEnvelope, SyncClient, SyncConfig};

/// Outcome of pulling one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote snapshot was newer and replaced the local collection
    Applied,
    /// Local collection was at least as new; nothing changed
    KeptLocal,
    /// Backend has no snapshot for this collection yet
    NoRemote,
}

/// High-level sync operations binding the HTTP client to the local database
#[derive(Debug, Clone)]
pub struct SyncManager {
    client: SyncClient,
}

impl SyncManager {
    pub fn new(client: SyncClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SyncClient {
        &self.client
    }

    /// Push one collection, overwriting the backend's snapshot
    pub async fn push_collection(
        &self,
        pool: &SqlitePool,
        username: &str,
        collection: Collection,
    ) -> Result<()> {
        let payload = snapshots::build_payload(pool, username, collection).await?;
        let envelope = SnapshotEnvelope {
            username: username.to_string(),
            collection,
            updated_at: Utc::now(),
            payload,
        };
        self.client.push_snapshot(&envelope).await
    }

    /// Pull one collection and apply it if the remote copy is newer
    pub async fn pull_collection(
        &self,
        pool: &SqlitePool,
        username: &str,
        collection: Collection,
    ) -> Result<PullOutcome> {
        let Some(envelope) = self.client.pull_snapshot(username, collection).await? else {
            return Ok(PullOutcome::NoRemote);
        };

        let local = snapshots::local_updated_at(pool, username, collection).await?;
        if !client::remote_wins(local, &envelope) {
            return Ok(PullOutcome::KeptLocal);
        }

        snapshots::apply_payload(pool, username, collection, &envelope.payload).await?;
        info!(
            collection = collection.as_str(),
            username, "applied remote snapshot"
        );
        Ok(PullOutcome::Applied)
    }

    /// Push every collection for a user
    pub async fn push_all(&self, pool: &SqlitePool, username: &str) -> Result<()> {
        for collection in Collection::all() {
            self.push_collection(pool, username, collection).await?;
        }
        Ok(())
    }

    /// Pull every collection for a user, in dependency order
    pub async fn pull_all(&self, pool: &SqlitePool, username: &str) -> Result<Vec<(Collection, PullOutcome)>> {
        let mut outcomes = Vec::with_capacity(Collection::all().len());
        for collection in Collection::all() {
            let outcome = self.pull_collection(pool, username, collection).await?;
            outcomes.push((collection, outcome));
        }
        Ok(outcomes)
    }

    /// Best-effort push: failures are logged and swallowed
    pub async fn try_push_collection(
        &self,
        pool: &SqlitePool,
        username: &str,
        collection: Collection,
    ) {
        if let Err(e) = self.push_collection(pool, username, collection).await {
            warn!(
                collection = collection.as_str(),
                username,
                error = %e,
                "snapshot push failed, keeping local copy"
            );
        }
    }

    /// Best-effort full push
    pub async fn try_push_all(&self, pool: &SqlitePool, username: &str) {
        for collection in Collection::all() {
            self.try_push_collection(pool, username, collection).await;
        }
    }

    /// Best-effort full pull
    pub async fn try_pull_all(&self, pool: &SqlitePool, username: &str) {
        for collection in Collection::all() {
            if let Err(e) = self.pull_collection(pool, username, collection).await {
                warn!(
                    collection = collection.as_str(),
                    username,
                    error = %e,
                    "snapshot pull failed, keeping local copy"
                );
            }
        }
    }

    /// Delete the account on the backend, then wipe local rows
    ///
    /// Unlike the snapshot paths this is NOT best-effort: local data survives
    /// unless the backend confirms deletion.
    pub async fn delete_account(&self, pool: &SqlitePool, username: &str) -> Result<()> {
        self.client.delete_account(username).await?;
        queries::wipe_user_data(pool, username).await?;
        info!(username, "account deleted");
        Ok(())
    }
}
